//! JSON file storage backend for the durable scope.
//!
//! The whole store is one JSON object of string values. It is loaded once on
//! open and rewritten on every mutation through a temp file plus rename, so
//! a crash mid-write leaves the previous contents intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::{StorageBackend, StorageError};

/// A storage backend persisted as a JSON file.
///
/// Writes are serialized through a `tokio::sync::Mutex` that also guards the
/// in-memory copy, so concurrent writers never interleave file contents.
///
/// # Examples
///
/// ```no_run
/// # use portal_storage::FileBackend;
/// # async fn example() -> Result<(), portal_storage::StorageError> {
/// let backend = FileBackend::open(".portal/storage.json").await?;
/// # Ok(())
/// # }
/// ```
pub struct FileBackend {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FileBackend {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is treated as an empty store; the file itself is only
    /// created on the first write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file or its directory cannot be
    /// accessed, and [`StorageError::Corrupt`] if the file is not a JSON
    /// object of strings.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let open_err = |e: std::io::Error| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(open_err)?;
        }

        let data = match tokio::fs::read_to_string(path).await {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| StorageError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(open_err(e)),
        };

        debug!(path = %path.display(), entries = data.len(), "opened file storage");

        Ok(Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        })
    }

    /// Return the filesystem path of this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, data: &BTreeMap<String, String>) -> std::io::Result<()> {
        let body = serde_json::to_vec_pretty(data).map_err(std::io::Error::other)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[async_trait::async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.data.lock().await;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut data = self.data.lock().await;
        let previous = data.insert(key.to_owned(), value.to_owned());
        if let Err(e) = self.flush(&data).await {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => data.insert(key.to_owned(), old),
                None => data.remove(key),
            };
            return Err(StorageError::Write {
                key: key.to_owned(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.lock().await;
        let Some(previous) = data.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush(&data).await {
            data.insert(key.to_owned(), previous);
            return Err(StorageError::Delete {
                key: key.to_owned(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}
