use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::RouterError;

/// One bot identity served by the router.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EndpointConfig {
    /// Path the webhook deliveries arrive on, e.g. "/<bot token>"
    pub listen_path: String,
    /// Public base URL the platform delivers to, e.g. "https://bots.example.com"
    pub webhook_domain: String,
    pub bot_token: String,
    /// Text sent back for every command received on this endpoint
    pub maintenance_response: String,
}

impl EndpointConfig {
    /// Full webhook URL registered with the platform. A bare host such as
    /// "bots.example.com" is served over https.
    pub fn webhook_url(&self) -> String {
        let domain = self.webhook_domain.trim_end_matches('/');
        let scheme = if domain.contains("://") { "" } else { "https://" };
        format!(
            "{}{}/{}",
            scheme,
            domain,
            self.listen_path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Telegram ID receiving the startup notice
    pub admin_id: i64,
    /// Endpoint the startup notice is sent through
    pub admin_endpoint: String,
    pub listen_address: String,
    /// Endpoints by simple name, e.g. one bot per language
    pub endpoints: BTreeMap<String, EndpointConfig>,
    /// Timeout for every call to the Telegram API
    pub telegram_timeout_seconds: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    1024
}

/// Masks a secret for logging: first 7 chars + `***` + last 4 chars,
/// or just `***` when the secret is too short to show any of it.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

/// The webhook router matches paths literally; segments starting with
/// ':' or '*' and braces would be read as route parameters.
fn is_literal_path(path: &str) -> bool {
    !path.contains(['{', '}'])
        && path
            .split('/')
            .all(|segment| !segment.starts_with([':', '*']))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Config = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RouterError> {
        let missing = |field: &str| Err(RouterError::Config(format!("configure {}", field)));

        if self.endpoints.is_empty() {
            return missing("endpoints");
        }
        for endpoint in self.endpoints.values() {
            if endpoint.listen_path.is_empty() || !is_literal_path(&endpoint.listen_path) {
                return missing("listen_path");
            }
            if endpoint.webhook_domain.is_empty() {
                return missing("webhook_domain");
            }
            if endpoint.bot_token.is_empty() {
                return missing("bot_token");
            }
            if endpoint.maintenance_response.is_empty() {
                return missing("maintenance_response");
            }
        }
        if self.listen_address.is_empty() {
            return missing("listen_address");
        }
        if !self.endpoints.contains_key(&self.admin_endpoint) {
            return missing("admin_endpoint");
        }
        if self.telegram_timeout_seconds == 0 {
            return missing("telegram_timeout_seconds");
        }
        if self.queue_capacity == 0 {
            return missing("queue_capacity");
        }
        Ok(())
    }

    /// Copy of the config that is safe to log.
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        for endpoint in config.endpoints.values_mut() {
            endpoint.bot_token = mask_token(&endpoint.bot_token);
        }
        config
    }
}
