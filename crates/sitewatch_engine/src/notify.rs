//! Notification delivery.
//!
//! Best-effort, fire-and-forget: the orchestrator logs a failure and
//! moves on. Message bodies arrive already bounded by the classifier.

use std::time::Duration;

use serde_json::json;
use thiserror::Error;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("delivery rejected with http status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Sends messages through the Telegram Bot API (`sendMessage`).
pub struct TelegramNotifier {
    api_base: String,
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::with_api_base(TELEGRAM_API_BASE, bot_token, chat_id)
    }

    /// Point the notifier at a different API host. Used by tests.
    pub fn with_api_base(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            client: reqwest::Client::builder()
                .timeout(DELIVERY_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{base}/bot{token}/sendMessage",
            base = self.api_base,
            token = self.bot_token
        );
        let payload = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| NotifyError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Stand-in used when delivery credentials are not configured. The
/// missing-credentials condition is surfaced once at startup; messages
/// are echoed to the log instead of being sent.
pub struct DisabledNotifier;

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        watch_logging::watch_info!("notification (delivery disabled):\n{}", message);
        Ok(())
    }
}
