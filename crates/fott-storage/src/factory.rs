use std::sync::Arc;

use fott_core::{
    project::{Connection, ProviderType},
    storage::{StorageError, StorageProvider},
};
use thiserror::Error;
use tracing::debug;

use crate::{
    azure_blob::{AzureBlobStorage, SAS_URL_OPTION},
    local::{LocalFileStorage, FOLDER_PATH_OPTION},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Options must be decrypted before a backend can be built.
    #[error("connection {connection} still has encrypted provider options")]
    Sealed { connection: String },
    #[error("connection {connection} is missing provider option {option}")]
    MissingOption { connection: String, option: &'static str },
    #[error("connection {connection} has invalid provider options: {source}")]
    Invalid {
        connection: String,
        #[source]
        source: StorageError,
    },
}

/// Builds a storage backend for a connection.
pub trait StorageFactory: Send + Sync {
    fn create(&self, connection: &Connection) -> Result<Arc<dyn StorageProvider>, ProviderError>;
}

/// Factory for the backends shipped with fott.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStorageFactory;

impl StorageFactory for DefaultStorageFactory {
    fn create(&self, connection: &Connection) -> Result<Arc<dyn StorageProvider>, ProviderError> {
        create_from_connection(connection)
    }
}

/// Select and build the backend named by the connection's provider type.
pub fn create_from_connection(
    connection: &Connection,
) -> Result<Arc<dyn StorageProvider>, ProviderError> {
    if connection.provider_options.is_encrypted() {
        return Err(ProviderError::Sealed {
            connection: connection.name.clone(),
        });
    }
    debug!(
        connection = %connection.name,
        provider = connection.provider_type.as_str(),
        "creating storage provider"
    );

    match connection.provider_type {
        ProviderType::LocalFileSystemProxy => {
            let folder = require(connection, FOLDER_PATH_OPTION)?;
            Ok(Arc::new(LocalFileStorage::new(folder)))
        }
        ProviderType::AzureBlobStorage => {
            let sas_url = require(connection, SAS_URL_OPTION)?;
            let storage =
                AzureBlobStorage::new(sas_url).map_err(|source| ProviderError::Invalid {
                    connection: connection.name.clone(),
                    source,
                })?;
            Ok(Arc::new(storage))
        }
    }
}

fn require<'a>(connection: &'a Connection, option: &'static str) -> Result<&'a str, ProviderError> {
    connection
        .provider_options
        .get(option)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ProviderError::MissingOption {
            connection: connection.name.clone(),
            option,
        })
}
