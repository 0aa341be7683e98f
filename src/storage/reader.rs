//! Single-object reads

use super::store::BlobStore;
use crate::error::{Error, Result};
use object_store::path::Path as ObjectPath;
use std::fmt;
use tracing::warn;

/// Why an object could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    /// The key does not exist (deleted after listing)
    NotFound,
    /// Credentials do not grant read access
    PermissionDenied,
    /// Network, throttling or any other store-side failure
    Unavailable(String),
}

impl ReadFailure {
    fn from_store_error(err: &object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Self::NotFound,
            object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. } => Self::PermissionDenied,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "object not found"),
            Self::PermissionDenied => write!(f, "access denied"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

/// Text of an object, or the reason it could not be fetched
pub type ReadResult = std::result::Result<String, ReadFailure>;

/// Fetches object bodies as text
#[derive(Debug, Clone)]
pub struct BlobReader {
    store: BlobStore,
}

impl BlobReader {
    /// Create a reader over a store
    pub fn new(store: BlobStore) -> Self {
        Self { store }
    }

    /// Read the full body of `key` as UTF-8 text
    ///
    /// Store failures come back as `Ok(Err(ReadFailure))` so the caller picks
    /// the policy. Content that is not UTF-8 is an [`Error::Decode`].
    pub async fn read(&self, key: &str) -> Result<ReadResult> {
        let path = ObjectPath::parse(key).unwrap_or_else(|_| ObjectPath::from(key));

        let fetched = match self.store.store().get(&path).await {
            Ok(result) => result.bytes().await,
            Err(e) => Err(e),
        };

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                let failure = ReadFailure::from_store_error(&e);
                warn!(key, error = %e, "Failed to read object");
                return Ok(Err(failure));
            }
        };

        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Ok(Ok(text)),
            Err(e) => Err(Error::decode(key, e.to_string())),
        }
    }
}
