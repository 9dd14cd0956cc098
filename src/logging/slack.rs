//! Slack incoming-webhook alerts.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::alert::{Alert, AlertChannel, AlertError};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Posts `{"text": "[level][channel] message"}` to a webhook URL.
#[derive(Debug, Clone)]
pub struct SlackChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }

    pub fn payload(alert: &Alert) -> serde_json::Value {
        json!({
            "text": format!("[{}][{}] {}", alert.level.as_str(), alert.channel, alert.message)
        })
    }
}

#[async_trait]
impl AlertChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::payload(alert))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AlertError::Status(status.as_u16()))
        }
    }
}
