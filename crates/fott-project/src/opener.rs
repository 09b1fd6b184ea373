use std::sync::{Arc, Mutex, PoisonError};

use fott_core::project::ProjectReference;
use fott_storage::factory::StorageFactory;
use tracing::{instrument, warn};

use crate::{
    loader::{Navigator, ProjectLoader},
    resolver::{ProjectNotFound, ProjectResolver, Resolution, ResolveError},
};

/// Non-blocking channel for messages the user should see but that do not abort anything.
pub trait Notifier: Send + Sync {
    fn project_not_found(&self, missing: &ProjectNotFound);
}

/// Notifier that keeps messages in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<ProjectNotFound>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<ProjectNotFound> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn project_not_found(&self, missing: &ProjectNotFound) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(missing.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened { project_id: String },
    /// Reported through the notifier; the caller stays on its current screen.
    NotFound(ProjectNotFound),
}

/// Resolve a recent project and activate it.
///
/// Nothing is written before activation, so dropping the future earlier leaves
/// the application as it was.
#[instrument(skip_all, fields(project = %reference.name))]
pub async fn open_project<F, N>(
    resolver: &ProjectResolver<F>,
    loader: &ProjectLoader<N>,
    notifier: &dyn Notifier,
    reference: &ProjectReference,
) -> Result<OpenOutcome, ResolveError>
where
    F: StorageFactory,
    N: Navigator,
{
    match resolver.resolve(reference).await? {
        Resolution::Resolved(project) => {
            let project_id = project.id.clone();
            loader.activate(project);
            Ok(OpenOutcome::Opened { project_id })
        }
        Resolution::NotFound(missing) => {
            warn!(file = %missing.file, container = %missing.container, "project file not found");
            notifier.project_not_found(&missing);
            Ok(OpenOutcome::NotFound(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use fott_core::{
        storage::{InMemoryStorage, StorageError},
        tokens::SecurityTokenStore,
    };

    use super::*;
    use crate::{
        loader::RecordingNavigator,
        test_support::{
            live_connection, reference_for, stored_project_json, tokens_with, MemoryFactory,
        },
    };

    struct Harness {
        resolver: ProjectResolver<MemoryFactory>,
        loader: ProjectLoader<RecordingNavigator>,
        navigator: RecordingNavigator,
        notifier: RecordingNotifier,
    }

    fn harness(storage: &InMemoryStorage, tokens: Arc<SecurityTokenStore>) -> Harness {
        let navigator = RecordingNavigator::default();
        Harness {
            resolver: ProjectResolver::with_factory(tokens, MemoryFactory::new(storage.clone())),
            loader: ProjectLoader::new(Arc::default(), navigator.clone()),
            navigator,
            notifier: RecordingNotifier::default(),
        }
    }

    async fn open_invoice(h: &Harness) -> Result<OpenOutcome, ResolveError> {
        let reference = reference_for("Invoice", "t1");
        open_project(&h.resolver, &h.loader, &h.notifier, &reference).await
    }

    #[tokio::test]
    async fn opens_legacy_project_with_live_connection() {
        let storage = InMemoryStorage::new().with_file("Invoice.fottproj", stored_project_json());
        let h = harness(&storage, tokens_with("t1"));

        let outcome = open_invoice(&h).await.expect("open");

        assert_eq!(outcome, OpenOutcome::Opened { project_id: "p1".into() });
        let current = h.loader.current().expect("current project");
        assert_eq!(current.source_connection, live_connection());
        assert_eq!(h.navigator.routes(), vec!["/projects/p1/edit"]);
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn missing_project_notifies_once_and_stays_put() {
        let storage = InMemoryStorage::new();
        let h = harness(&storage, tokens_with("t1"));

        let outcome = open_invoice(&h).await.expect("handled");

        let messages = h.notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].file, "Invoice.json");
        assert_eq!(messages[0].container, "live-storage");
        assert_eq!(outcome, OpenOutcome::NotFound(messages[0].clone()));
        assert_eq!(h.loader.current(), None);
        assert!(h.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn missing_token_propagates_and_activates_nothing() {
        let storage = InMemoryStorage::new().with_file("Invoice.json", stored_project_json());
        let h = harness(&storage, Arc::new(SecurityTokenStore::default()));

        let err = open_invoice(&h).await.expect_err("should fail");

        assert!(matches!(err, ResolveError::SecurityTokenNotFound { .. }));
        assert!(storage.reads().is_empty());
        assert_eq!(h.loader.current(), None);
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_propagates_without_notification() {
        let storage = InMemoryStorage::new().with_failure(
            "Invoice.json",
            StorageError::Io {
                reason: "disk on fire".into(),
            },
        );
        let h = harness(&storage, tokens_with("t1"));

        let err = open_invoice(&h).await.expect_err("should fail");

        assert!(matches!(err, ResolveError::Storage(StorageError::Io { .. })));
        assert!(h.notifier.messages().is_empty());
        assert!(h.navigator.routes().is_empty());
    }
}
