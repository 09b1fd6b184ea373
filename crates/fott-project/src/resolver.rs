use std::{fmt, sync::Arc};

use fott_core::{
    project::{legacy_project_file_name, project_file_name, ProjectDefinition, ProjectReference},
    storage::StorageError,
    tokens::{SecurityTokenStore, TokenError},
};
use fott_storage::{
    crypto::CryptoError,
    factory::{DefaultStorageFactory, ProviderError, StorageFactory},
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::decryptor::decrypt_project;

/// Failures that end a resolution attempt and reach the caller unchanged.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("security token {name} not found")]
    SecurityTokenNotFound { name: String },
    #[error("failed to decrypt project {project}: {source}")]
    Decryption {
        project: String,
        #[source]
        source: CryptoError,
    },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{file} is not a valid project file: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<TokenError> for ResolveError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound { name } => ResolveError::SecurityTokenNotFound { name },
        }
    }
}

/// Project file missing under both naming conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNotFound {
    pub project: String,
    /// File name under the current convention.
    pub file: String,
    /// Name of the connection that was searched.
    pub container: String,
}

impl fmt::Display for ProjectNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Project file {} was not found in {}. Make sure the project still exists there.",
            self.file, self.container
        )
    }
}

/// Outcome of a resolution that did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ProjectDefinition),
    /// Handled: the caller tells the user and stays where it is.
    NotFound(ProjectNotFound),
}

/// Turns a recent-project reference into the up-to-date project stored at its connection.
pub struct ProjectResolver<F: StorageFactory = DefaultStorageFactory> {
    tokens: Arc<SecurityTokenStore>,
    factory: F,
}

impl ProjectResolver<DefaultStorageFactory> {
    pub fn new(tokens: Arc<SecurityTokenStore>) -> Self {
        Self::with_factory(tokens, DefaultStorageFactory)
    }
}

impl<F: StorageFactory> ProjectResolver<F> {
    pub fn with_factory(tokens: Arc<SecurityTokenStore>, factory: F) -> Self {
        Self { tokens, factory }
    }

    #[instrument(skip_all, fields(project = %reference.name, id = %reference.id))]
    pub async fn resolve(&self, reference: &ProjectReference) -> Result<Resolution, ResolveError> {
        let token = self.tokens.resolve(&reference.security_token)?;
        let decrypted =
            decrypt_project(reference, token).map_err(|source| ResolveError::Decryption {
                project: reference.name.clone(),
                source,
            })?;
        let storage = self.factory.create(&decrypted.source_connection)?;

        let primary = project_file_name(&decrypted.name);
        let (file, text) = match storage.read_text(&primary).await {
            Ok(text) => (primary, text),
            Err(StorageError::NotFound { .. }) => {
                let legacy = legacy_project_file_name(&decrypted.name);
                debug!(%primary, %legacy, "project file missing, trying legacy name");
                match storage.read_text(&legacy).await {
                    Ok(text) => (legacy, text),
                    Err(StorageError::NotFound { .. }) => {
                        return Ok(Resolution::NotFound(ProjectNotFound {
                            project: reference.name.clone(),
                            file: project_file_name(&reference.name),
                            container: reference.source_connection.name.clone(),
                        }));
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        };

        let mut project: ProjectDefinition = serde_json::from_str(&text)
            .map_err(|source| ResolveError::Parse { file: file.clone(), source })?;
        // The stored connection may be stale; the one the caller holds is reachable now.
        project.source_connection = decrypted.source_connection;
        debug!(%file, "project resolved");
        Ok(Resolution::Resolved(project))
    }
}

#[cfg(test)]
mod tests {
    use fott_core::{
        project::{Connection, ProviderOptions},
        storage::InMemoryStorage,
        tokens::SecurityToken,
    };
    use fott_storage::key_provider::generate_key;

    use super::*;
    use crate::test_support::{
        live_connection, reference_for, reference_sealed_with, stored_project_json, tokens_with,
        MemoryFactory,
    };

    fn resolver(storage: &InMemoryStorage) -> (ProjectResolver<MemoryFactory>, MemoryFactory) {
        let factory = MemoryFactory::new(storage.clone());
        (
            ProjectResolver::with_factory(tokens_with("t1"), factory.clone()),
            factory,
        )
    }

    #[tokio::test]
    async fn missing_token_fails_without_touching_storage() {
        let storage = InMemoryStorage::new().with_file("Invoice.json", stored_project_json());
        let factory = MemoryFactory::new(storage.clone());
        let resolver =
            ProjectResolver::with_factory(Arc::new(SecurityTokenStore::default()), factory.clone());

        let err = resolver
            .resolve(&reference_for("Invoice", "t1"))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ResolveError::SecurityTokenNotFound { ref name } if name == "t1"));
        assert!(storage.reads().is_empty());
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test]
    async fn reads_primary_file_first() {
        let storage = InMemoryStorage::new().with_file("Invoice.json", stored_project_json());
        let (resolver, _) = resolver(&storage);

        let resolution = resolver
            .resolve(&reference_for("Invoice", "t1"))
            .await
            .expect("resolve");
        let Resolution::Resolved(project) = resolution else {
            panic!("expected a resolved project");
        };
        assert_eq!(project.name, "Invoice");
        assert_eq!(project.tags.len(), 1);
        assert_eq!(storage.reads(), vec!["Invoice.json"]);
    }

    #[tokio::test]
    async fn falls_back_to_legacy_name_once() {
        let storage = InMemoryStorage::new().with_file("Invoice.fottproj", stored_project_json());
        let (resolver, _) = resolver(&storage);

        let resolution = resolver
            .resolve(&reference_for("Invoice", "t1"))
            .await
            .expect("resolve");
        let Resolution::Resolved(project) = resolution else {
            panic!("expected a resolved project");
        };
        assert_eq!(project.version, "2.1.0");
        assert_eq!(project.source_connection, live_connection());
        assert_eq!(storage.reads(), vec!["Invoice.json", "Invoice.fottproj"]);
    }

    #[tokio::test]
    async fn missing_under_both_names_is_handled() {
        let storage = InMemoryStorage::new();
        let (resolver, _) = resolver(&storage);

        let resolution = resolver
            .resolve(&reference_for("Invoice", "t1"))
            .await
            .expect("not-found is not an error");
        assert_eq!(
            resolution,
            Resolution::NotFound(ProjectNotFound {
                project: "Invoice".into(),
                file: "Invoice.json".into(),
                container: "live-storage".into(),
            })
        );
        assert_eq!(storage.reads().len(), 2);
    }

    #[tokio::test]
    async fn other_primary_failure_skips_fallback() {
        let failure = StorageError::Unauthorized {
            path: "Invoice.json".into(),
            reason: "403 Forbidden".into(),
        };
        let storage = InMemoryStorage::new()
            .with_file("Invoice.fottproj", stored_project_json())
            .with_failure("Invoice.json", failure.clone());
        let (resolver, _) = resolver(&storage);

        let err = resolver
            .resolve(&reference_for("Invoice", "t1"))
            .await
            .expect_err("should propagate");
        assert!(matches!(err, ResolveError::Storage(ref e) if *e == failure));
        assert_eq!(storage.reads(), vec!["Invoice.json"]);
    }

    #[tokio::test]
    async fn other_fallback_failure_propagates() {
        let failure = StorageError::Transient {
            reason: "connection reset".into(),
        };
        let storage = InMemoryStorage::new().with_failure("Invoice.fottproj", failure.clone());
        let (resolver, _) = resolver(&storage);

        let err = resolver
            .resolve(&reference_for("Invoice", "t1"))
            .await
            .expect_err("should propagate");
        assert!(matches!(err, ResolveError::Storage(ref e) if *e == failure));
        assert_eq!(storage.reads().len(), 2);
    }

    #[tokio::test]
    async fn decryption_failure_is_not_retried() {
        let storage = InMemoryStorage::new().with_file("Invoice.json", stored_project_json());
        let factory = MemoryFactory::new(storage.clone());
        // Same token name, different key.
        let resolver = ProjectResolver::with_factory(tokens_with("t1"), factory.clone());
        let reference =
            reference_sealed_with("Invoice", &SecurityToken::new("t1", generate_key()));

        let err = resolver.resolve(&reference).await.expect_err("should fail");
        assert!(matches!(err, ResolveError::Decryption { .. }));
        assert!(storage.reads().is_empty());
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test]
    async fn stored_connection_is_replaced_by_live_one() {
        let storage = InMemoryStorage::new().with_file("Invoice.json", stored_project_json());
        let (resolver, _) = resolver(&storage);

        let Resolution::Resolved(project) = resolver
            .resolve(&reference_for("Invoice", "t1"))
            .await
            .expect("resolve")
        else {
            panic!("expected a resolved project");
        };
        let stale: Connection = serde_json::from_str::<ProjectDefinition>(stored_project_json())
            .expect("fixture")
            .source_connection;
        assert_ne!(stale, live_connection());
        assert_eq!(project.source_connection, live_connection());
        assert!(matches!(
            project.source_connection.provider_options,
            ProviderOptions::Plain(_)
        ));
    }

    #[tokio::test]
    async fn invalid_project_text_is_a_parse_error() {
        let storage = InMemoryStorage::new().with_file("Invoice.json", "{ not json");
        let (resolver, _) = resolver(&storage);

        let err = resolver
            .resolve(&reference_for("Invoice", "t1"))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ResolveError::Parse { ref file, .. } if file == "Invoice.json"));
    }

    #[test]
    fn not_found_message_names_file_and_container() {
        let missing = ProjectNotFound {
            project: "Invoice".into(),
            file: "Invoice.json".into(),
            container: "live-storage".into(),
        };
        let message = missing.to_string();
        assert!(message.contains("Invoice.json"));
        assert!(message.contains("live-storage"));
    }
}
