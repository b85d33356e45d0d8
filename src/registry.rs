use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, EndpointConfig};
use crate::error::{PlatformOp, RouterError};
use crate::platform::ChatPlatform;

/// A configured endpoint bound to its platform client.
pub struct BoundEndpoint {
    pub config: EndpointConfig,
    client: Arc<dyn ChatPlatform>,
    /// "@username", filled in by `resolve_identities`
    mention: String,
}

/// All endpoints served by the process. Mutated only during startup,
/// then shared read-only with the dispatch loop.
pub struct Registry {
    endpoints: BTreeMap<String, BoundEndpoint>,
    own_ids: HashSet<i64>,
}

impl Registry {
    /// Binds every configured endpoint to the client of the same name.
    pub fn new(
        config: &Config,
        mut clients: BTreeMap<String, Arc<dyn ChatPlatform>>,
        own_ids: HashSet<i64>,
    ) -> Result<Self, RouterError> {
        let mut endpoints = BTreeMap::new();
        for (name, endpoint) in &config.endpoints {
            let client = clients
                .remove(name)
                .ok_or_else(|| RouterError::UnknownEndpoint(name.clone()))?;
            endpoints.insert(
                name.clone(),
                BoundEndpoint {
                    config: endpoint.clone(),
                    client,
                    mention: String::new(),
                },
            );
        }
        Ok(Self { endpoints, own_ids })
    }

    fn endpoint(&self, name: &str) -> Result<&BoundEndpoint, RouterError> {
        self.endpoints
            .get(name)
            .ok_or_else(|| RouterError::UnknownEndpoint(name.to_string()))
    }

    pub fn own_ids(&self) -> &HashSet<i64> {
        &self.own_ids
    }

    pub fn mention(&self, name: &str) -> Result<&str, RouterError> {
        Ok(&self.endpoint(name)?.mention)
    }

    pub fn maintenance_response(&self, name: &str) -> Result<&str, RouterError> {
        Ok(&self.endpoint(name)?.config.maintenance_response)
    }

    pub async fn register_webhook(&self, name: &str) -> Result<(), RouterError> {
        let endpoint = self.endpoint(name)?;
        info!(
            "setting webhook for endpoint {} for domain {}...",
            name, endpoint.config.webhook_domain
        );
        endpoint
            .client
            .set_webhook(&endpoint.config.webhook_url())
            .await
            .map_err(|e| RouterError::platform(name, PlatformOp::SetWebhook, e))?;

        let status = endpoint
            .client
            .webhook_status()
            .await
            .map_err(|e| RouterError::platform(name, PlatformOp::WebhookStatus, e))?;
        if let Some(time) = status.last_error_time() {
            info!("last webhook error time: {}", time);
        }
        if let Some(message) = status.last_error_message.filter(|m| !m.is_empty()) {
            info!("last webhook error message: {}", message);
        }
        info!("OK");
        Ok(())
    }

    pub async fn register_webhooks(&self) -> Result<(), RouterError> {
        for name in self.endpoints.keys() {
            self.register_webhook(name).await?;
        }
        Ok(())
    }

    pub async fn deregister_webhook(&self, name: &str) -> Result<(), RouterError> {
        let endpoint = self.endpoint(name)?;
        info!("removing webhook for endpoint {}...", name);
        endpoint
            .client
            .delete_webhook()
            .await
            .map_err(|e| RouterError::platform(name, PlatformOp::DeleteWebhook, e))?;
        info!("OK");
        Ok(())
    }

    pub async fn deregister_webhooks(&self) -> Result<(), RouterError> {
        for name in self.endpoints.keys() {
            self.deregister_webhook(name).await?;
        }
        Ok(())
    }

    pub async fn resolve_identity(&mut self, name: &str) -> Result<(), RouterError> {
        let endpoint = self
            .endpoints
            .get_mut(name)
            .ok_or_else(|| RouterError::UnknownEndpoint(name.to_string()))?;
        let username = endpoint
            .client
            .bot_username()
            .await
            .map_err(|e| RouterError::platform(name, PlatformOp::ResolveIdentity, e))?;
        info!("bot name for endpoint {}: {}", name, username);
        endpoint.mention = format!("@{}", username);
        Ok(())
    }

    pub async fn resolve_identities(&mut self) -> Result<(), RouterError> {
        let names: Vec<String> = self.endpoints.keys().cloned().collect();
        for name in &names {
            self.resolve_identity(name).await?;
        }
        Ok(())
    }

    pub async fn send(&self, name: &str, chat_id: i64, text: &str) -> Result<(), RouterError> {
        self.endpoint(name)?
            .client
            .send_message(chat_id, text)
            .await
            .map_err(|e| RouterError::platform(name, PlatformOp::SendMessage, e))
    }

    pub async fn acknowledge_callback(
        &self,
        name: &str,
        callback_query_id: &str,
    ) -> Result<(), RouterError> {
        self.endpoint(name)?
            .client
            .answer_callback_query(callback_query_id)
            .await
            .map_err(|e| RouterError::platform(name, PlatformOp::AnswerCallback, e))
    }

    /// Startup notice to the admin; failing here means the API path is broken.
    pub async fn notify_admin(
        &self,
        name: &str,
        admin_id: i64,
        text: &str,
    ) -> Result<(), RouterError> {
        self.endpoint(name)?
            .client
            .send_message(admin_id, text)
            .await
            .map_err(|e| RouterError::platform(name, PlatformOp::AdminNotice, e))
    }
}

/// Logs a transient error and carries on; fatal errors are handed back.
pub fn tolerate(result: Result<(), RouterError>) -> Result<(), RouterError> {
    match result {
        Err(e) if !e.is_fatal() => {
            warn!("{}", e);
            Ok(())
        }
        other => other,
    }
}
