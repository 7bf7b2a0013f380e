use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Development-only signing secret. Production refuses to start with it.
pub const DEV_JWT_SECRET: &str = "contact-api-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which persistent store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(StoreBackend::Postgres),
            "memory" | "mem" | "in-memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set outside development")]
    MissingJwtSecret,
    #[error("DATABASE_URL must be set for the postgres store backend")]
    MissingDatabaseUrl,
    #[error("SECURITY_BCRYPT_COST must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
                // A configured database wins over the development default
                self.database.backend = StoreBackend::Postgres;
            }
        }
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.database.backend = StoreBackend::parse(&v).unwrap_or(self.database.backend);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(v) = env::var("CONTACT_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    /// Checks the combinations that cannot be served safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment != Environment::Development
            && (self.security.jwt_secret.is_empty() || self.security.jwt_secret == DEV_JWT_SECRET)
        {
            return Err(ConfigError::MissingJwtSecret);
        }
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.security.bcrypt_cost));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 4000,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 4,
                enable_cors: true,
                cors_origins: vec![],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 4000,
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 4000,
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret_and_database() {
        let mut config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret)));

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingDatabaseUrl)));

        config.database.url = Some("postgres://localhost/contacts".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_development_secret() {
        let mut config = AppConfig::production();
        config.security.jwt_secret = DEV_JWT_SECRET.to_string();
        config.database.url = Some("postgres://localhost/contacts".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret)));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let mut config = AppConfig::development();
        for cost in [4, 31] {
            config.security.bcrypt_cost = cost;
            assert!(config.validate().is_ok());
        }
        for cost in [0, 3, 32] {
            config.security.bcrypt_cost = cost;
            assert!(matches!(config.validate(), Err(ConfigError::InvalidBcryptCost(c)) if c == cost));
        }
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(StoreBackend::parse("Postgres"), Some(StoreBackend::Postgres));
        assert_eq!(StoreBackend::parse(" memory "), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("mongo"), None);
    }
}
