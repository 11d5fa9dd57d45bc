/*!
 * Storage collaborator: bringing inputs into a job and handing renders out.
 *
 * The render pipeline only needs two operations, captured by [`Storage`].
 * [`HttpStorage`] fetches `http(s)://` URLs (streamed to disk), `file://` URLs
 * and plain paths, and stores renders either by `PUT` to a caller-supplied
 * URL (e.g. a presigned upload link), by copying to a local destination, or
 * into the configured output directory.
 */

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app_config::StorageConfig;
use crate::errors::StorageError;

/// Narrow fetch/store contract used by the job runner
#[async_trait]
pub trait Storage: Send + Sync + Debug {
    /// Make the bytes at `location` available at `dest`
    async fn fetch(&self, location: &str, dest: &Path) -> Result<(), StorageError>;

    /// Publish `artifact` and return a reference to retrieve it
    async fn store(&self, artifact: &Path, job_id: &str, destination: Option<&str>) -> Result<String, StorageError>;
}

/// Where a location string points
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// `http://` or `https://`
    Remote(Url),
    /// Local filesystem path
    Local(PathBuf),
}

impl Location {
    /// Classify a URL or path; unknown schemes are rejected
    pub fn parse(raw: &str) -> Result<Self, String> {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| format!("invalid file URL: {}", raw)),
            // Windows drive letters parse as one-letter schemes
            Ok(url) if url.scheme().len() > 1 => Err(format!("unsupported scheme '{}'", url.scheme())),
            _ => Ok(Self::Local(PathBuf::from(raw))),
        }
    }
}

/// reqwest-backed storage
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

impl HttpStorage {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::UploadFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn download(&self, url: &Url, dest: &Path) -> Result<u64, String> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| e.to_string())?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            file.write_all(&chunk).await.map_err(|e| e.to_string())?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| e.to_string())?;

        Ok(written)
    }

    async fn upload(&self, artifact: &Path, url: &Url) -> Result<String, StorageError> {
        let body = tokio::fs::read(artifact).await?;
        let size = body.len();

        self.client
            .put(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "video/mp4")
            .body(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        info!("Uploaded {} bytes to {}", size, redact(url));
        Ok(redact(url))
    }

    async fn copy_local(artifact: &Path, dest: &Path) -> Result<String, StorageError> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::copy(artifact, dest).await?;
        info!("Stored render at {:?}", dest);
        Ok(dest.display().to_string())
    }
}

// Strip query and fragment so presigned credentials never reach results or logs
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.set_fragment(None);
    clean.to_string()
}

#[async_trait]
impl Storage for HttpStorage {
    async fn fetch(&self, location: &str, dest: &Path) -> Result<(), StorageError> {
        let failed = |message: String| StorageError::FetchFailed {
            location: location.to_string(),
            message,
        };

        match Location::parse(location).map_err(failed)? {
            Location::Remote(url) => {
                let bytes = self.download(&url, dest).await.map_err(failed)?;
                debug!("Downloaded {} bytes from {}", bytes, redact(&url));
            }
            Location::Local(path) => {
                tokio::fs::copy(&path, dest)
                    .await
                    .map_err(|e| failed(e.to_string()))?;
            }
        }

        Ok(())
    }

    async fn store(&self, artifact: &Path, job_id: &str, destination: Option<&str>) -> Result<String, StorageError> {
        match destination {
            Some(raw) => match Location::parse(raw).map_err(StorageError::UploadFailed)? {
                Location::Remote(url) => self.upload(artifact, &url).await,
                Location::Local(path) => Self::copy_local(artifact, &path).await,
            },
            None => {
                let dest = self.config.output_dir.join(format!("out_{}.mp4", job_id));
                Self::copy_local(artifact, &dest).await
            }
        }
    }
}
