use std::collections::HashSet;

use crate::config::Config;
use crate::error::RouterError;

/// Telegram bot tokens look like "<bot id>:<secret>"; the bot id is the
/// user id the bot shows up with in membership updates.
pub fn bot_id_from_token(endpoint: &str, token: &str) -> Result<i64, RouterError> {
    let malformed = || RouterError::MalformedCredential {
        endpoint: endpoint.to_string(),
    };
    let (prefix, _) = token.split_once(':').ok_or_else(malformed)?;
    prefix.parse::<i64>().map_err(|_| malformed())
}

/// Ids of all bots served by this process, one per endpoint.
pub fn own_identities(config: &Config) -> Result<HashSet<i64>, RouterError> {
    config
        .endpoints
        .iter()
        .map(|(name, endpoint)| bot_id_from_token(name, &endpoint.bot_token))
        .collect()
}
