use async_trait::async_trait;
use fott_core::storage::{StorageError, StorageProvider};
use reqwest::{header::HeaderValue, Client, StatusCode, Url};
use tracing::{debug, instrument};

/// Connection option holding the container URL with its SAS query.
pub const SAS_URL_OPTION: &str = "sasUrl";

const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

/// Blob container accessed through a shared access signature URL.
pub struct AzureBlobStorage {
    container_url: Url,
    client: Client,
}

impl AzureBlobStorage {
    pub fn new(sas_url: &str) -> Result<Self, StorageError> {
        let container_url = Url::parse(sas_url).map_err(|e| StorageError::Io {
            reason: format!("invalid SAS url: {e}"),
        })?;
        if container_url.cannot_be_a_base() {
            return Err(StorageError::Io {
                reason: "SAS url cannot address blobs".to_string(),
            });
        }
        Ok(Self {
            container_url,
            client: Client::new(),
        })
    }

    /// Container name, used in user-facing messages.
    pub fn container_name(&self) -> &str {
        self.container_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
    }

    fn blob_url(&self, path: &str) -> Result<Url, StorageError> {
        let mut url = self.container_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Io {
                reason: "SAS url cannot address blobs".to_string(),
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

#[async_trait]
impl StorageProvider for AzureBlobStorage {
    fn name(&self) -> &'static str {
        "azure-blob"
    }

    #[instrument(skip_all, fields(container = %self.container_name(), path = %path))]
    async fn read_text(&self, path: &str) -> Result<String, StorageError> {
        let url = self.blob_url(path)?;
        let resp = self.client.get(url).send().await.map_err(request_err)?;
        let status = resp.status();
        debug!(%status, "blob read");
        if !status.is_success() {
            return Err(status_err(status, path));
        }
        resp.text().await.map_err(request_err)
    }

    #[instrument(skip_all, fields(container = %self.container_name(), path = %path))]
    async fn write_text(&self, path: &str, contents: &str) -> Result<(), StorageError> {
        let url = self.blob_url(path)?;
        let resp = self
            .client
            .put(url)
            .header(BLOB_TYPE_HEADER, HeaderValue::from_static("BlockBlob"))
            .body(contents.to_string())
            .send()
            .await
            .map_err(request_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(status_err(status, path));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(container = %self.container_name(), path = %path))]
    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let url = self.blob_url(path)?;
        let resp = self.client.delete(url).send().await.map_err(request_err)?;
        match resp.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(status_err(status, path)),
        }
    }
}

fn status_err(status: StatusCode, path: &str) -> StorageError {
    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound {
            path: path.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Unauthorized {
            path: path.to_string(),
            reason: status.to_string(),
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => StorageError::Transient {
            reason: status.to_string(),
        },
        s if s.is_server_error() => StorageError::Transient {
            reason: s.to_string(),
        },
        s => StorageError::Io {
            reason: format!("unexpected status {s} for {path}"),
        },
    }
}

fn request_err(err: reqwest::Error) -> StorageError {
    if err.is_timeout() || err.is_connect() {
        StorageError::Transient {
            reason: err.to_string(),
        }
    } else {
        StorageError::Io {
            reason: err.to_string(),
        }
    }
}
