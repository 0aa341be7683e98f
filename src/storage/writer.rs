//! Artifact uploads

use super::store::BlobStore;
use bytes::Bytes;
use serde::Serialize;
use std::path::Path;

/// Result of writing one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// Stored at `location`
    Written { location: String, bytes: usize },
    /// Not stored
    Failed { reason: String },
}

impl ArtifactOutcome {
    /// Create a failed outcome
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Check if the artifact was stored
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Written { .. } => None,
            Self::Failed { reason } => Some(reason),
        }
    }
}

/// Writes named payloads under the destination root
#[derive(Debug, Clone)]
pub struct BlobWriter {
    store: BlobStore,
}

impl BlobWriter {
    /// Create a writer over a store
    pub fn new(store: BlobStore) -> Self {
        Self { store }
    }

    /// The destination store
    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Write raw bytes to `name`
    pub async fn put(&self, name: &str, data: Bytes) -> ArtifactOutcome {
        let path = self.store.path_for(name);
        let size = data.len();

        match self.store.store().put(&path, data.into()).await {
            Ok(_) => ArtifactOutcome::Written {
                location: self.store.display_path(&path),
                bytes: size,
            },
            Err(e) => ArtifactOutcome::failed(format!(
                "Failed to write {}: {e}",
                self.store.display_path(&path)
            )),
        }
    }

    /// Upload a local file to `name`
    pub async fn put_file(&self, name: &str, local: &Path) -> ArtifactOutcome {
        match tokio::fs::read(local).await {
            Ok(data) => self.put(name, Bytes::from(data)).await,
            Err(e) => ArtifactOutcome::failed(format!(
                "Failed to read staged file {}: {e}",
                local.display()
            )),
        }
    }
}
