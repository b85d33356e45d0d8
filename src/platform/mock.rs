//! In-memory platform that records every call, for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{ChatPlatform, WebhookStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetWebhook(String),
    WebhookStatus,
    DeleteWebhook,
    BotUsername,
    SendMessage(i64, String),
    AnswerCallback(String),
}

#[derive(Default)]
pub struct RecordingPlatform {
    username: Option<String>,
    status: WebhookStatus,
    /// Chats whose sendMessage calls fail
    failing_chats: HashSet<i64>,
    fail_set_webhook: bool,
    fail_answer_callback: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingPlatform {
    pub fn new(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Default::default()
        }
    }

    pub fn without_username() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: WebhookStatus) -> Self {
        self.status = status;
        self
    }

    pub fn failing_send_to(mut self, chat_id: i64) -> Self {
        self.failing_chats.insert(chat_id);
        self
    }

    pub fn failing_set_webhook(mut self) -> Self {
        self.fail_set_webhook = true;
        self
    }

    pub fn failing_answer_callback(mut self) -> Self {
        self.fail_answer_callback = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendMessage(chat, text) => Some((chat, text)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn set_webhook(&self, url: &str) -> Result<()> {
        self.record(Call::SetWebhook(url.to_string()));
        if self.fail_set_webhook {
            bail!("Bad Request: bad webhook: Failed to resolve host");
        }
        Ok(())
    }

    async fn webhook_status(&self) -> Result<WebhookStatus> {
        self.record(Call::WebhookStatus);
        Ok(self.status.clone())
    }

    async fn delete_webhook(&self) -> Result<()> {
        self.record(Call::DeleteWebhook);
        Ok(())
    }

    async fn bot_username(&self) -> Result<String> {
        self.record(Call::BotUsername);
        match &self.username {
            Some(name) => Ok(name.clone()),
            None => bail!("Bot account has no username"),
        }
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.record(Call::SendMessage(chat_id, text.to_string()));
        if self.failing_chats.contains(&chat_id) {
            bail!("Forbidden: bot was blocked by the user");
        }
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        self.record(Call::AnswerCallback(callback_query_id.to_string()));
        if self.fail_answer_callback {
            bail!("Bad Request: query is too old");
        }
        Ok(())
    }
}
