//! # API Configuration
//!
//! Server settings read from environment variables. Partner settings live
//! in `catalog_sync::PartnerConfig`.
//!
//! | Variable             | Default        |
//! |----------------------|----------------|
//! | `DATABASE_URL`       | `catalog.db`   |
//! | `HTTP_PORT`          | `8000`         |
//! | `BIND_ADDR`          | `0.0.0.0`      |
//! | `DB_MAX_CONNECTIONS` | `5`            |
//! | `CATALOG_CONFIG`     | platform path  |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Catalog API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// Interface to bind
    pub bind_addr: IpAddr,

    /// SQLite path or `sqlite://` URL
    pub database_url: String,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Partner config file (TOML); the platform config dir when unset
    pub partner_config_path: Option<PathBuf>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ApiConfig {
            http_port: lookup("HTTP_PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string()))?,

            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "catalog.db".to_string()),

            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            partner_config_path: lookup("CATALOG_CONFIG").map(PathBuf::from),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        if config.database_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("DATABASE_URL".to_string()));
        }

        Ok(config)
    }

    /// Address the HTTP server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
