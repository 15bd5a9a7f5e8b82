//! In-memory storage backend.
//!
//! Backs the ephemeral (session) scope and doubles as the fake for tests.
//! All data is lost when the process exits.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError};

/// An in-memory storage backend backed by a `BTreeMap`.
///
/// Clones share the same map, so a clone handed to a component observes
/// writes made through the original.
///
/// # Examples
///
/// ```
/// # use portal_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.put("impersonationToken", "tok-1").await.unwrap();
/// let val = backend.get("impersonationToken").await.unwrap();
/// assert_eq!(val.as_deref(), Some("tok-1"));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with the given entries.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }
}
