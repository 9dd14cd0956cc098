//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::parse::{env_bool, env_duration, env_opt, env_or, env_parse};
use super::ConfigError;

/// Server configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address (default: 0.0.0.0:8080).
    pub listen_addr: SocketAddr,
    /// Host used in absolute URLs when the request has no Host header.
    pub server_name: Option<String>,
    /// Application root; logs and config are resolved against it.
    pub base_path: PathBuf,
    /// Directory holding `*.json` config files (default: {base}/config).
    pub config_dir: PathBuf,
    /// Where multipart uploads are spooled (default: system temp dir).
    pub upload_dir: PathBuf,
    /// Directory with custom error pages (`404.html`, ...).
    pub error_pages_dir: Option<PathBuf>,
    /// Render exception details in responses.
    pub debug: bool,
    /// Graceful shutdown drain timeout.
    pub drain_timeout: Duration,
    /// Access logging enabled.
    pub access_log: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr: SocketAddr =
            env_parse("LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;

        // DRAIN_TIMEOUT takes "30s"/"2m"; bare numbers are seconds, "off" means no wait
        let drain_timeout = env_duration("DRAIN_TIMEOUT", &env_or("DRAIN_TIMEOUT_SECS", "30"))?
            .unwrap_or(Duration::ZERO);

        let base_path = match env_opt("BASE_PATH") {
            Some(path) => PathBuf::from(path),
            None => std::env::current_dir().map_err(|error| ConfigError::Io {
                path: ".".into(),
                error,
            })?,
        };

        let config_dir = env_opt("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| base_path.join("config"));

        Ok(Self {
            listen_addr,
            server_name: env_opt("SERVER_NAME"),
            base_path,
            config_dir,
            upload_dir: env_opt("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            error_pages_dir: env_opt("ERROR_PAGES_DIR").map(PathBuf::from),
            debug: env_bool("APP_DEBUG", false),
            drain_timeout,
            access_log: env_bool("ACCESS_LOG", false),
        })
    }

    /// Defaults for embedding and tests: ephemeral port, cwd-relative paths.
    pub fn local(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            server_name: None,
            config_dir: base_path.join("config"),
            upload_dir: std::env::temp_dir(),
            base_path,
            error_pages_dir: None,
            debug: false,
            drain_timeout: Duration::from_secs(5),
            access_log: false,
        }
    }

    /// Default log file for a channel: `{base}/storage/logs/{channel}.log`.
    pub fn default_log_path(&self, channel: &str) -> PathBuf {
        self.base_path
            .join("storage")
            .join("logs")
            .join(format!("{}.log", channel))
    }
}
