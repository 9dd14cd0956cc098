//! Logging.
//!
//! Two separate concerns live here:
//!
//! - [`Logger`] - the application log: channel files with rotation, stderr
//!   or syslog, with high-severity lines forwarded to [`AlertManager`]
//! - [`init_tracing`] - process diagnostics through `tracing`, printed as
//!   text or as one JSON object per line ([`JsonFormatter`])

mod alert;
mod email;
mod format;
mod level;
mod logger;
mod slack;

pub use alert::{
    Alert, AlertChannel, AlertError, AlertManager, AlertSender, AlertsConfig, EmailAlertConfig,
    SlackAlertConfig,
};
pub use email::EmailChannel;
pub use format::JsonFormatter;
pub use level::{LogLevel, ParseLevelError};
pub use logger::{format_line, LogDriver, Logger, LoggerConfig};
pub use slack::SlackChannel;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("careminate=info"));

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(JsonFormatter::new(config.service_name.clone())),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
