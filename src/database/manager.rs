use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the persistent store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return DatabaseError::Conflict(constraint);
            }
            // The referenced row was deleted by a concurrent transaction
            if db_err.is_foreign_key_violation() {
                let constraint = db_err.constraint().unwrap_or("foreign key").to_string();
                return DatabaseError::NotFound(constraint);
            }
        }
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::Unavailable(err.to_string())
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Idempotent schema bootstrap, executed in order.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL,
        is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
        created_by UUID NOT NULL REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS contacts_created_by_idx ON contacts (created_by)",
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL CHECK (char_length(name) BETWEEN 1 AND 50),
        color TEXT NOT NULL DEFAULT '#3498db',
        created_by UUID NOT NULL REFERENCES users(id),
        usage_count BIGINT NOT NULL DEFAULT 0 CHECK (usage_count >= 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS tags_owner_name_ci_idx ON tags (created_by, lower(name))",
    r#"
    CREATE TABLE IF NOT EXISTS contact_tags (
        contact_id UUID NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
        tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        attached_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
        PRIMARY KEY (contact_id, tag_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS contact_tags_tag_idx ON contact_tags (tag_id)",
];

/// Connection pool bootstrap and schema management for PostgreSQL
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool against the configured `DATABASE_URL`
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let redacted = Self::redacted_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", redacted);
        Ok(pool)
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Database schema is up to date ({} statements)", SCHEMA.len());
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Connection string with credentials stripped, for logs
    fn redacted_url(url: &str) -> Result<String, DatabaseError> {
        let mut parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !parsed.username().is_empty() {
            parsed.set_username("***").map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        if parsed.password().is_some() {
            parsed.set_password(Some("***")).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(parsed.into())
    }
}
