/*!
 * Mock storage implementation for testing
 *
 * Serves fetches from an in-memory map of location to bytes and records every
 * store call, so job tests never touch the network.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use subburn::errors::StorageError;
use subburn::storage::Storage;

/// One recorded store call
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    /// Job the artifact belongs to
    pub job_id: String,
    /// Destination passed by the caller
    pub destination: Option<String>,
    /// Artifact content at the time of the call
    pub bytes: Vec<u8>,
}

/// Storage double with canned inputs
#[derive(Debug, Clone, Default)]
pub struct RecordingStorage {
    sources: HashMap<String, Vec<u8>>,
    fail_store: bool,
    fetched: Arc<Mutex<Vec<String>>>,
    stored: Arc<Mutex<Vec<StoredArtifact>>>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `location` fetchable with `content`
    pub fn with_source(mut self, location: &str, content: &[u8]) -> Self {
        self.sources.insert(location.to_string(), content.to_vec());
        self
    }

    /// Every store call fails with `UploadFailed`
    pub fn failing_store(mut self) -> Self {
        self.fail_store = true;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn stored(&self) -> Vec<StoredArtifact> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn fetch(&self, location: &str, dest: &Path) -> Result<(), StorageError> {
        self.fetched.lock().unwrap().push(location.to_string());

        let content = self.sources.get(location).ok_or_else(|| StorageError::FetchFailed {
            location: location.to_string(),
            message: "404 Not Found".to_string(),
        })?;
        std::fs::write(dest, content)?;
        Ok(())
    }

    async fn store(&self, artifact: &Path, job_id: &str, destination: Option<&str>) -> Result<String, StorageError> {
        if self.fail_store {
            return Err(StorageError::UploadFailed("503 Service Unavailable".to_string()));
        }

        let bytes = std::fs::read(artifact)?;
        self.stored.lock().unwrap().push(StoredArtifact {
            job_id: job_id.to_string(),
            destination: destination.map(str::to_string),
            bytes,
        });

        let reference = destination
            .map(str::to_string)
            .unwrap_or_else(|| PathBuf::from("memory").join(format!("out_{}.mp4", job_id)).display().to_string());
        Ok(reference)
    }
}
