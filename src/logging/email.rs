//! Email alerts through the local mailer (`sendmail -t`).

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::alert::{Alert, AlertChannel, AlertError};

/// Sends one message per recipient.
#[derive(Debug, Clone)]
pub struct EmailChannel {
    sendmail_path: PathBuf,
    subject_prefix: String,
    recipients: Vec<String>,
}

impl EmailChannel {
    pub fn new(
        sendmail_path: impl Into<PathBuf>,
        subject_prefix: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            sendmail_path: sendmail_path.into(),
            subject_prefix: subject_prefix.into(),
            recipients,
        }
    }

    /// `{prefix} [{level}][{channel}]`
    pub fn subject(&self, alert: &Alert) -> String {
        format!(
            "{} [{}][{}]",
            self.subject_prefix,
            alert.level.as_str(),
            alert.channel
        )
    }

    fn compose(&self, to: &str, alert: &Alert) -> String {
        // Header injection guard: recipients and subject stay on one line
        let clean = |s: &str| s.replace(['\r', '\n'], " ");
        format!(
            "To: {}\nSubject: {}\nContent-Type: text/plain; charset=utf-8\n\n{}\n",
            clean(to),
            clean(&self.subject(alert)),
            alert.message
        )
    }

    async fn send_one(&self, to: &str, alert: &Alert) -> Result<(), AlertError> {
        let mut child = Command::new(&self.sendmail_path)
            .arg("-t")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(self.compose(to, alert).as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AlertError::Mailer(format!(
                "{} for {}: {}",
                output.status,
                to,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

#[async_trait]
impl AlertChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let mut first_error = None;

        for to in &self.recipients {
            if let Err(e) = self.send_one(to, alert).await {
                tracing::warn!(recipient = %to, error = %e, "Failed to send alert email");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
