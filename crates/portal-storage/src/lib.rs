//! Storage capability for the client portal.
//!
//! This crate defines the [`StorageBackend`] trait, a string key-value
//! interface standing in for the browser's `localStorage` and
//! `sessionStorage`. The login flow and the admin screens depend on this
//! trait instead of ambient globals, so callers decide which scope a given
//! backend represents.
//!
//! Two implementations are provided:
//!
//! - [`FileBackend`]: durable scope, a JSON object on disk
//! - [`MemoryBackend`]: ephemeral scope, also the fake used in tests

mod error;
mod file;
mod memory;

pub use error::StorageError;
pub use file::FileBackend;
pub use memory::MemoryBackend;

/// A pluggable key-value storage backend.
///
/// Keys are flat strings (e.g. `wme-user-data`, `impersonationToken`).
/// Values are strings; callers serialize structured data to JSON first.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store a key-value pair, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting a non-existent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
