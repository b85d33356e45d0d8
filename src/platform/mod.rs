pub mod telegram;
pub mod update;

#[cfg(test)]
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Delivery problems the platform last recorded for a webhook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookStatus {
    pub last_error_date: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
}

impl WebhookStatus {
    /// When the most recent delivery error happened, if there was one.
    pub fn last_error_time(&self) -> Option<String> {
        self.last_error_date
            .filter(|date| date.timestamp() != 0)
            .map(|date| date.format("%Y-%m-%d %H:%M:%S %Z").to_string())
    }
}

/// The chat platform's bot API, bound to one bot identity.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn set_webhook(&self, url: &str) -> Result<()>;

    async fn webhook_status(&self) -> Result<WebhookStatus>;

    async fn delete_webhook(&self) -> Result<()>;

    /// The bot's own username, without the leading "@"
    async fn bot_username(&self) -> Result<String>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_error_time_is_formatted() {
        let status = WebhookStatus {
            last_error_date: DateTime::from_timestamp(1_700_000_000, 0),
            last_error_message: None,
        };
        assert_eq!(
            status.last_error_time().as_deref(),
            Some("2023-11-14 22:13:20 UTC")
        );
    }

    #[test]
    fn test_no_last_error_time() {
        assert_eq!(WebhookStatus::default().last_error_time(), None);

        let status = WebhookStatus {
            last_error_date: DateTime::from_timestamp(0, 0),
            last_error_message: None,
        };
        assert_eq!(status.last_error_time(), None);
    }
}
