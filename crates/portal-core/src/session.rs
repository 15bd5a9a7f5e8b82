//! The locally cached client record written after login.

use portal_storage::{StorageBackend, StorageError};
use serde_json::Value;
use tracing::{debug, warn};

/// Durable storage key holding the serialized client record.
pub const USER_DATA_KEY: &str = "wme-user-data";

/// Write the client record, swallowing any failure.
///
/// The cache is best effort: a full or read-only store must never block the
/// redirect to the dashboard. Returns whether the write landed.
pub async fn persist_client(storage: &dyn StorageBackend, client: Option<&Value>) -> bool {
    let body = client.map_or_else(|| "null".to_owned(), Value::to_string);
    match storage.put(USER_DATA_KEY, &body).await {
        Ok(()) => {
            debug!(bytes = body.len(), "cached client record");
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to cache client record; continuing");
            false
        }
    }
}

/// Read back the cached client record.
///
/// A value that is not valid JSON is reported as absent.
///
/// # Errors
///
/// Returns the backend's [`StorageError`] if the read itself fails.
pub async fn load_client(storage: &dyn StorageBackend) -> Result<Option<Value>, StorageError> {
    let Some(raw) = storage.get(USER_DATA_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(error = %e, "cached client record is not JSON; ignoring");
            Ok(None)
        }
    }
}

/// Forget the cached client record.
///
/// # Errors
///
/// Returns the backend's [`StorageError`] if the delete fails.
pub async fn clear_client(storage: &dyn StorageBackend) -> Result<(), StorageError> {
    storage.delete(USER_DATA_KEY).await
}
