use color_eyre::Result;
use fott_core::tokens::{SecurityToken, SecurityTokenStore};
use fott_storage::key_provider::{KeyProvider, KeyringProvider};
use tracing::{debug, warn};

use crate::config::Config;

/// Keyring service under which token keys are kept.
pub const KEYRING_SERVICE: &str = "fott-cli";

pub fn keyring() -> KeyringProvider {
    KeyringProvider::new(KEYRING_SERVICE)
}

/// Build the read-only token store, pulling keys that are not in the config from `keys`.
/// Tokens without any key are left out, so projects sealed with them fail to resolve.
pub async fn token_store<P: KeyProvider>(config: &Config, keys: &P) -> Result<SecurityTokenStore> {
    let mut tokens = Vec::with_capacity(config.security_tokens.len());
    for entry in &config.security_tokens {
        let key = match &entry.key {
            Some(key) => Some(key.clone()),
            None => keys
                .load(&entry.name)
                .await
                .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?,
        };
        match key {
            Some(key) => tokens.push(SecurityToken::new(entry.name.clone(), key)),
            None => warn!(token = %entry.name, "no key available for security token"),
        }
    }
    debug!(count = tokens.len(), "security tokens loaded");
    Ok(SecurityTokenStore::new(tokens))
}
