use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by storage backends.
///
/// `NotFound` is kept apart from every other failure: callers branch on it to
/// try alternate file names, while the rest are surfaced as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Requested resource does not exist.
    #[error("resource not found: {path}")]
    NotFound { path: String },
    /// Backend rejected the credentials.
    #[error("access denied for {path}: {reason}")]
    Unauthorized { path: String, reason: String },
    /// Network or service hiccup; a later attempt may succeed.
    #[error("transient storage failure: {reason}")]
    Transient { reason: String },
    /// Any other backend failure.
    #[error("storage failure: {reason}")]
    Io { reason: String },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Text resources addressed by a path relative to the connection root.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Short backend name used for logging.
    fn name(&self) -> &'static str;

    /// Read a whole resource as UTF-8 text.
    async fn read_text(&self, path: &str) -> Result<String, StorageError>;

    /// Create or replace a resource.
    async fn write_text(&self, path: &str, contents: &str) -> Result<(), StorageError>;

    /// Remove a resource (idempotent).
    async fn delete_file(&self, path: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<String, String>,
    failures: HashMap<String, StorageError>,
    reads: Vec<String>,
}

/// In-memory storage for tests and smoke runs. Records every read so callers
/// can assert which paths were touched and in what order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<MemoryState>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource.
    pub fn with_file(self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.files.insert(path.into(), contents.into());
        }
        self
    }

    /// Make every read of `path` fail with `error`.
    pub fn with_failure(self, path: impl Into<String>, error: StorageError) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.failures.insert(path.into(), error);
        }
        self
    }

    /// Paths read so far, oldest first.
    pub fn reads(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|state| state.reads.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner
            .lock()
            .map(|state| state.files.contains_key(path))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.inner.lock().map_err(|err| StorageError::Io {
            reason: format!("lock poisoned: {err}"),
        })
    }
}

#[async_trait]
impl StorageProvider for InMemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read_text(&self, path: &str) -> Result<String, StorageError> {
        let mut state = self.lock()?;
        state.reads.push(path.to_string());

        if let Some(err) = state.failures.get(path) {
            return Err(err.clone());
        }
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_string(),
            })
    }

    async fn write_text(&self, path: &str, contents: &str) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.files.insert(path.to_string(), contents.to_string());
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.files.remove(path);
        Ok(())
    }
}
