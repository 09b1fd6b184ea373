use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named key material used to seal project connection settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityToken {
    pub name: String,
    /// Base64-encoded 256-bit key.
    pub key: String,
}

impl SecurityToken {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

// Never print key material.
impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityToken")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("security token not found: {name}")]
    NotFound { name: String },
}

/// Read-only lookup of security tokens by name.
#[derive(Debug, Default, Clone)]
pub struct SecurityTokenStore {
    tokens: HashMap<String, SecurityToken>,
}

impl SecurityTokenStore {
    /// Build a store; on duplicate names the first token wins.
    pub fn new(tokens: impl IntoIterator<Item = SecurityToken>) -> Self {
        let mut map = HashMap::new();
        for token in tokens {
            map.entry(token.name.clone()).or_insert(token);
        }
        Self { tokens: map }
    }

    pub fn resolve(&self, name: &str) -> Result<&SecurityToken, TokenError> {
        self.tokens.get(name).ok_or_else(|| TokenError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
