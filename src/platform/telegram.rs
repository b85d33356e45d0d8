use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::CallbackQueryId;
use tracing::debug;

use super::{ChatPlatform, WebhookStatus};

/// HTTP client shared by every bot; all Telegram calls use its timeout.
pub fn http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .context("Failed to build Telegram HTTP client")
}

/// Bot API client for a single bot token.
pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    pub fn new(token: &str, client: reqwest::Client) -> Self {
        Self {
            bot: Bot::with_client(token, client),
        }
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn set_webhook(&self, url: &str) -> Result<()> {
        let url = reqwest::Url::parse(url)
            .with_context(|| format!("Invalid webhook URL: {}", url))?;
        self.bot
            .set_webhook(url)
            .await
            .context("setWebhook request failed")?;
        Ok(())
    }

    async fn webhook_status(&self) -> Result<WebhookStatus> {
        let info = self
            .bot
            .get_webhook_info()
            .await
            .context("getWebhookInfo request failed")?;
        Ok(WebhookStatus {
            last_error_date: info.last_error_date,
            last_error_message: info.last_error_message,
        })
    }

    async fn delete_webhook(&self) -> Result<()> {
        self.bot
            .delete_webhook()
            .await
            .context("deleteWebhook request failed")?;
        Ok(())
    }

    async fn bot_username(&self) -> Result<String> {
        let me = self.bot.get_me().await.context("getMe request failed")?;
        me.user
            .username
            .clone()
            .context("Bot account has no username")
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        debug!("sendMessage to chat {}", chat_id);
        self.bot
            .send_message(ChatId(chat_id), text.to_string())
            .await
            .context("sendMessage request failed")?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_query_id.to_string()))
            .await
            .context("answerCallbackQuery request failed")?;
        Ok(())
    }
}
