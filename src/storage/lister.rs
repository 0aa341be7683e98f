//! Paginated key listing
//!
//! Object stores cap a single list request (S3 returns at most 1000 keys per
//! page). The store client follows the continuation tokens; this module turns
//! the result into a de-duplicated stream of key names.

use super::store::BlobStore;
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use std::collections::HashSet;
use tracing::{debug, info};

/// Lists the keys of a source bucket
#[derive(Debug, Clone)]
pub struct BlobLister {
    store: BlobStore,
    /// String prefix filter, relative to the store root
    prefix: Option<String>,
    /// Exclusive start key, relative to the store root
    start_after: Option<String>,
}

impl BlobLister {
    /// List every key under the store root
    pub fn new(store: BlobStore) -> Self {
        Self {
            store,
            prefix: None,
            start_after: None,
        }
    }

    /// Build a lister from the source section of the config
    pub fn from_config(store: BlobStore, config: &SourceConfig) -> Self {
        let mut lister = Self::new(store);
        lister.prefix = config.prefix.clone().filter(|p| !p.is_empty());
        lister.start_after = config.start_after.clone().filter(|s| !s.is_empty());
        lister
    }

    /// Only list keys starting with `prefix`
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Only list keys lexically greater than `key`
    #[must_use]
    pub fn with_start_after(mut self, key: impl Into<String>) -> Self {
        self.start_after = Some(key.into());
        self
    }

    /// The store being listed
    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Lazily enumerate matching keys in store order
    ///
    /// Keys are full store paths and can be handed to the reader verbatim.
    /// A failed page ends the stream with [`Error::Listing`].
    pub fn keys(&self) -> BoxStream<'_, Result<String>> {
        let list_root = self.list_root();
        let key_filter = self.key_filter();
        let location = self.store.to_string();

        let pages = match &self.start_after {
            Some(start_after) => {
                let offset = self.store.path_for(start_after);
                debug!(%location, %offset, "Listing keys after offset");
                self.store
                    .store()
                    .list_with_offset(list_root.as_ref(), &offset)
            }
            None => {
                debug!(%location, "Listing keys");
                self.store.store().list(list_root.as_ref())
            }
        };

        let mut seen = HashSet::new();
        pages
            .map_err(move |e| Error::listing(location.clone(), e.to_string()))
            .map_ok(|meta| meta.location.as_ref().to_string())
            .try_filter(move |key| {
                let keep = key.starts_with(key_filter.as_str()) && seen.insert(key.clone());
                futures::future::ready(keep)
            })
            .boxed()
    }

    /// Drain every page and return the complete key list
    pub async fn collect_keys(&self) -> Result<Vec<String>> {
        let keys: Vec<String> = self.keys().try_collect().await?;
        info!(store = %self.store, count = keys.len(), "Listed source keys");
        Ok(keys)
    }

    /// Deepest directory that contains every matching key
    ///
    /// Store listings match whole path segments, so a prefix like `2024-` is
    /// listed from its parent directory and filtered by [`Self::key_filter`].
    fn list_root(&self) -> Option<ObjectPath> {
        let dir = self
            .prefix
            .as_deref()
            .and_then(|p| p.rfind('/').map(|idx| &p[..idx]))
            .map(|d| d.trim_matches('/'))
            .filter(|d| !d.is_empty());

        match dir {
            Some(dir) => Some(self.store.path_for(dir)),
            None => self.store.root(),
        }
    }

    /// Full string prefix every returned key must start with
    fn key_filter(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) => {
                let mut filter = self.store.path_for(prefix).as_ref().to_string();
                // Paths drop trailing delimiters; keep "dir/" from matching "dir2/"
                if prefix.ends_with('/') && !filter.is_empty() {
                    filter.push('/');
                }
                filter
            }
            None => String::new(),
        }
    }
}
