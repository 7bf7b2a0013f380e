use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use contact_api::config::{self, AppConfig, StoreBackend};
use contact_api::database::{DatabaseManager, MemoryStore, PgStore, Store};
use contact_api::routes;
use contact_api::state::AppState;

#[derive(Parser)]
#[command(name = "contact-api")]
#[command(about = "Contact management API with user-scoped tags and favorites")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Override the configured listen port")]
        port: Option<u16>,
    },

    #[command(about = "Create or upgrade the PostgreSQL schema, then exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("contact_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::config();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting contact-api in {:?} mode", config.environment);

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::Migrate => migrate(config).await,
    }
}

async fn serve(config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let state = AppState::new(store, config).context("failed to build application state")?;
    let app = routes::app(state, config);

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.api.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("contact-api listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    if config.database.backend != StoreBackend::Postgres {
        anyhow::bail!("migrate requires the postgres store backend");
    }
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    tracing::info!("Schema is up to date");
    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
