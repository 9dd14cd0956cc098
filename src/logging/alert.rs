//! Alert fan-out for high-severity log lines.
//!
//! The [`Logger`](super::Logger) never talks to the network itself. Lines at
//! or above the threshold are pushed onto a bounded queue and delivered by a
//! background task spawned with [`AlertManager::spawn`]. When the queue is
//! full new alerts are dropped with a warning.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::email::EmailChannel;
use super::slack::SlackChannel;
use super::LogLevel;

/// Alerts waiting for delivery before new ones are dropped.
pub const ALERT_QUEUE_CAPACITY: usize = 256;

/// One alert: a formatted log line plus where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub level: LogLevel,
    pub channel: String,
    pub message: String,
}

/// Delivery failure for a single channel.
#[derive(Debug)]
pub enum AlertError {
    /// Spawning or talking to a local process failed.
    Io(std::io::Error),
    /// HTTP transport failure.
    Http(reqwest::Error),
    /// Remote endpoint answered with a non-success status.
    Status(u16),
    /// Local mailer exited unsuccessfully.
    Mailer(String),
}

impl fmt::Display for AlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertError::Io(e) => write!(f, "I/O error: {}", e),
            AlertError::Http(e) => write!(f, "HTTP error: {}", e),
            AlertError::Status(code) => write!(f, "unexpected status {}", code),
            AlertError::Mailer(msg) => write!(f, "mailer failed: {}", msg),
        }
    }
}

impl std::error::Error for AlertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AlertError::Io(e) => Some(e),
            AlertError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AlertError {
    fn from(e: std::io::Error) -> Self {
        AlertError::Io(e)
    }
}

impl From<reqwest::Error> for AlertError {
    fn from(e: reqwest::Error) -> Self {
        AlertError::Http(e)
    }
}

/// A destination for alerts.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Deliver one alert.
    async fn send(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// `alerts` section of the logging config.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub enabled: bool,
    pub threshold_level: LogLevel,
    pub email: EmailAlertConfig,
    pub slack: SlackAlertConfig,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_level: LogLevel::Error,
            email: EmailAlertConfig::default(),
            slack: SlackAlertConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EmailAlertConfig {
    pub enabled: bool,
    pub subject_prefix: String,
    pub recipients: Vec<String>,
    /// Mailer binary, invoked as `{sendmail_path} -t`.
    pub sendmail_path: PathBuf,
}

impl Default for EmailAlertConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            subject_prefix: "[ALERT]".to_string(),
            recipients: Vec::new(),
            sendmail_path: PathBuf::from("/usr/sbin/sendmail"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlackAlertConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
}

/// Threshold filter plus the set of configured channels.
#[derive(Clone)]
pub struct AlertManager {
    enabled: bool,
    threshold: LogLevel,
    channels: Vec<Arc<dyn AlertChannel>>,
}

impl AlertManager {
    /// Manager that drops everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            threshold: LogLevel::Error,
            channels: Vec::new(),
        }
    }

    /// Enabled manager with no channels yet.
    pub fn new(threshold: LogLevel) -> Self {
        Self {
            enabled: true,
            threshold,
            channels: Vec::new(),
        }
    }

    /// Build the channels named in `config`.
    pub fn from_config(config: &AlertsConfig) -> Result<Self, AlertError> {
        let mut manager = Self {
            enabled: config.enabled,
            threshold: config.threshold_level,
            channels: Vec::new(),
        };

        if config.email.enabled && !config.email.recipients.is_empty() {
            manager = manager.with_channel(Arc::new(EmailChannel::new(
                config.email.sendmail_path.clone(),
                config.email.subject_prefix.clone(),
                config.email.recipients.clone(),
            )));
        }

        if config.slack.enabled {
            if let Some(url) = config.slack.webhook_url.as_deref().filter(|u| !u.is_empty()) {
                manager = manager.with_channel(Arc::new(SlackChannel::new(url)?));
            }
        }

        Ok(manager)
    }

    /// Add a channel.
    pub fn with_channel(mut self, channel: Arc<dyn AlertChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Whether a line at `level` would be delivered anywhere.
    #[inline]
    pub fn should_send(&self, level: LogLevel) -> bool {
        self.enabled && level >= self.threshold && !self.channels.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver to every channel. Failures are logged, never returned.
    pub async fn send(&self, alert: &Alert) {
        if !self.should_send(alert.level) {
            return;
        }

        for channel in &self.channels {
            match channel.send(alert).await {
                Ok(()) => debug!(
                    channel = channel.name(),
                    level = alert.level.as_str(),
                    "Alert delivered"
                ),
                Err(e) => warn!(
                    channel = channel.name(),
                    level = alert.level.as_str(),
                    log_channel = %alert.channel,
                    error = %e,
                    "Alert delivery failed"
                ),
            }
        }
    }

    /// Start the background dispatcher and return its sending half.
    ///
    /// Must be called inside a tokio runtime. The task exits once every
    /// [`AlertSender`] clone is dropped.
    pub fn spawn(self) -> AlertSender {
        self.spawn_with_capacity(ALERT_QUEUE_CAPACITY)
    }

    /// [`spawn`](AlertManager::spawn) with an explicit queue size.
    pub fn spawn_with_capacity(self, capacity: usize) -> AlertSender {
        if !self.enabled || self.channels.is_empty() {
            return AlertSender::disabled();
        }

        let (tx, mut rx) = mpsc::channel::<Alert>(capacity.max(1));
        let enabled = self.enabled;
        let threshold = self.threshold;

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                self.send(&alert).await;
            }
            debug!("Alert dispatcher stopped");
        });

        AlertSender {
            tx: Some(tx),
            enabled,
            threshold,
        }
    }
}

impl fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertManager")
            .field("enabled", &self.enabled)
            .field("threshold", &self.threshold)
            .field(
                "channels",
                &self.channels.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Cheap handle the logger uses to queue alerts.
#[derive(Clone, Debug)]
pub struct AlertSender {
    tx: Option<mpsc::Sender<Alert>>,
    enabled: bool,
    threshold: LogLevel,
}

impl AlertSender {
    /// Sender that drops everything.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            enabled: false,
            threshold: LogLevel::Error,
        }
    }

    /// Queue an alert if it clears the threshold. Never blocks; drops the
    /// alert when the queue is full.
    pub fn notify(&self, level: LogLevel, channel: &str, message: &str) {
        if !self.enabled || level < self.threshold {
            return;
        }
        if let Some(ref tx) = self.tx {
            let alert = Alert {
                level,
                channel: channel.to_string(),
                message: message.to_string(),
            };
            match tx.try_send(alert) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(alert)) => warn!(
                    level = alert.level.as_str(),
                    log_channel = %alert.channel,
                    "Alert queue full, dropping alert"
                ),
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("Alert dispatcher is gone, dropping alert")
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && self.tx.is_some()
    }
}
