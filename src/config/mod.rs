//! Configuration module for careminate.
//!
//! Process settings come from environment variables; application settings
//! come from JSON files in the config directory (see [`Repository`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use careminate::config::{Config, Repository};
//!
//! let config = Config::from_env()?;
//! let repo = Repository::load(&config.server.config_dir)?;
//! println!("Listen address: {}", config.server.listen_addr);
//! println!("App name: {:?}", repo.get("app.name"));
//! ```

mod error;
mod logging;
pub mod parse;
mod repository;
mod server;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use parse::{coerce_env_value, env_value};
pub use repository::Repository;
pub use server::ServerConfig;

/// Complete process configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Listen: {}", self.server.listen_addr);
        info!("  Base path: {:?}", self.server.base_path);
        info!("  Config dir: {:?}", self.server.config_dir);
        info!("  Upload dir: {:?}", self.server.upload_dir);

        if let Some(ref name) = self.server.server_name {
            info!("  Server name: {}", name);
        }

        if let Some(ref dir) = self.server.error_pages_dir {
            info!("  Error pages: {:?}", dir);
        }

        if self.server.debug {
            info!("  Debug: enabled");
        }

        if self.server.access_log {
            info!("  Access log: enabled");
        }

        info!("  Drain timeout: {}s", self.server.drain_timeout.as_secs());
    }
}
