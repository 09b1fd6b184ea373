use std::{
    fs,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use fott_core::storage::{StorageError, StorageProvider};
use tempfile::NamedTempFile;
use tracing::instrument;

/// Connection option naming the root folder.
pub const FOLDER_PATH_OPTION: &str = "folderPath";

/// Storage rooted at a local folder.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative path under the root, refusing anything that escapes it.
    fn path_for(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(StorageError::Io {
                reason: format!("invalid relative path: {path}"),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalFileStorage {
    fn name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn read_text(&self, path: &str) -> Result<String, StorageError> {
        let full = self.path_for(path)?;
        fs::read_to_string(&full).map_err(|err| io_err(path, err))
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn write_text(&self, path: &str, contents: &str) -> Result<(), StorageError> {
        let full = self.path_for(path)?;
        let parent = full.parent().ok_or_else(|| StorageError::Io {
            reason: "invalid storage path".to_string(),
        })?;
        fs::create_dir_all(parent).map_err(|err| io_err(path, err))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|err| io_err(path, err))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|err| io_err(path, err))?;
        tmp.flush().map_err(|err| io_err(path, err))?;
        tmp.persist(&full).map_err(|e| io_err(path, e.error))?;
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let full = self.path_for(path)?;
        match fs::remove_file(full) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(path, err)),
        }
    }
}

fn io_err(path: &str, err: io::Error) -> StorageError {
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound {
            path: path.to_string(),
        },
        io::ErrorKind::PermissionDenied => StorageError::Unauthorized {
            path: path.to_string(),
            reason: err.to_string(),
        },
        _ => StorageError::Io {
            reason: err.to_string(),
        },
    }
}
