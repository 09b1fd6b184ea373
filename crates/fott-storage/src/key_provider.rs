use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::debug;

/// Decoded key material of a security token.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Token name, for logging only (never log key bytes).
    pub id: String,
    /// 256-bit symmetric key.
    pub bytes: [u8; 32],
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial").field("id", &self.id).finish()
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("lock error: {0}")]
    Lock(String),
}

/// Storage for token keys that are kept out of the settings file.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Key stored for a token, if any.
    async fn load(&self, token_name: &str) -> Result<Option<String>, KeyError>;

    /// Persist a key for a token, replacing an existing one.
    async fn store(&self, token_name: &str, key: &str) -> Result<(), KeyError>;
}

/// OS keyring-backed provider. One entry per token, keyed by token name.
pub struct KeyringProvider {
    service: String,
}

impl KeyringProvider {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

#[async_trait]
impl KeyProvider for KeyringProvider {
    async fn load(&self, token_name: &str) -> Result<Option<String>, KeyError> {
        // Keyring operations are synchronous; wrap in async for trait compatibility.
        let entry = keyring::Entry::new(&self.service, token_name)
            .map_err(|e| KeyError::Keyring(e.to_string()))?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => {
                debug!(token = token_name, "no keyring entry for token");
                Ok(None)
            }
            Err(err) => Err(KeyError::Keyring(err.to_string())),
        }
    }

    async fn store(&self, token_name: &str, key: &str) -> Result<(), KeyError> {
        keyring::Entry::new(&self.service, token_name)
            .and_then(|entry| entry.set_password(key))
            .map_err(|e| KeyError::Keyring(e.to_string()))
    }
}

/// In-memory key provider for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyProvider {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

#[async_trait]
impl KeyProvider for InMemoryKeyProvider {
    async fn load(&self, token_name: &str) -> Result<Option<String>, KeyError> {
        let guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Lock(format!("lock poisoned: {err}")))?;
        Ok(guard.get(token_name).cloned())
    }

    async fn store(&self, token_name: &str, key: &str) -> Result<(), KeyError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Lock(format!("lock poisoned: {err}")))?;
        guard.insert(token_name.to_string(), key.to_string());
        Ok(())
    }
}

/// Fresh random key, base64 encoded the way tokens store it.
pub fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::STANDARD.encode(bytes)
}

pub fn decode_key(token_name: &str, secret: &str) -> Result<KeyMaterial, KeyError> {
    let bytes = general_purpose::STANDARD
        .decode(secret.trim())
        .map_err(|e| KeyError::Decode(e.to_string()))?;

    if bytes.len() != 32 {
        return Err(KeyError::Decode(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(KeyMaterial {
        id: token_name.to_string(),
        bytes: out,
    })
}
