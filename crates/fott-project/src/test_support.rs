//! Fixtures shared by the resolver, opener and lifecycle tests.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use fott_core::{
    project::{Connection, ProjectReference, ProviderOptions, ProviderType},
    storage::{InMemoryStorage, StorageProvider},
    tokens::{SecurityToken, SecurityTokenStore},
};
use fott_storage::{
    crypto::encrypt_connection,
    factory::{ProviderError, StorageFactory},
};

const TEST_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

pub fn test_token(name: &str) -> SecurityToken {
    SecurityToken::new(name, TEST_KEY)
}

pub fn tokens_with(name: &str) -> Arc<SecurityTokenStore> {
    Arc::new(SecurityTokenStore::new([test_token(name)]))
}

/// The connection the current environment can actually reach.
pub fn live_connection() -> Connection {
    Connection {
        id: "c-live".into(),
        name: "live-storage".into(),
        description: None,
        provider_type: ProviderType::LocalFileSystemProxy,
        provider_options: ProviderOptions::Plain(BTreeMap::from([(
            "folderPath".to_string(),
            "/live".to_string(),
        )])),
    }
}

pub fn reference_sealed_with(name: &str, token: &SecurityToken) -> ProjectReference {
    ProjectReference {
        id: "p1".into(),
        name: name.into(),
        security_token: token.name.clone(),
        source_connection: encrypt_connection(token, &live_connection()).expect("seal"),
    }
}

pub fn reference_for(name: &str, token_name: &str) -> ProjectReference {
    reference_sealed_with(name, &test_token(token_name))
}

/// Project file as saved some time ago, pointing at a connection that has since changed.
pub fn stored_project_json() -> &'static str {
    r##"{
        "id": "p1",
        "name": "Invoice",
        "version": "2.1.0",
        "securityToken": "t1",
        "sourceConnection": {
            "id": "c-old",
            "name": "stale-storage",
            "providerType": "azureBlobStorage",
            "providerOptions": {"sasUrl": "https://old.blob.core.windows.net/c?sig=expired"}
        },
        "tags": [{"name": "total", "color": "#ff0000", "type": "number"}],
        "lastVisitedAssetId": "a42"
    }"##
}

/// Hands out the same in-memory storage for every connection and counts how often it was asked.
#[derive(Clone)]
pub struct MemoryFactory {
    storage: InMemoryStorage,
    created: Arc<AtomicUsize>,
}

impl MemoryFactory {
    pub fn new(storage: InMemoryStorage) -> Self {
        Self {
            storage,
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl StorageFactory for MemoryFactory {
    fn create(&self, connection: &Connection) -> Result<Arc<dyn StorageProvider>, ProviderError> {
        if connection.provider_options.is_encrypted() {
            return Err(ProviderError::Sealed {
                connection: connection.name.clone(),
            });
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.storage.clone()))
    }
}
