// [libs/infra/storage/src/errors.rs]
/*!
 * APARATO: STORAGE ERROR CATALOG (ESTRATO L3)
 * Every backend implementation maps its own failure modes onto this
 * enum so the media sync coordinator can make one retry decision
 * regardless of which backend (local disk, NAS, cloud) failed.
 */

use coldstore_domain_models::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend '{backend}' i/o failure: {message}")]
    Io { backend: String, message: String },

    #[error("storage backend '{backend}' is not configured")]
    NotConfigured { backend: &'static str },
}

/// Storage failures are always transient from the façade's point of
/// view — the media worker decides permanence by retry count, not by
/// error shape (the design §7: `TransientBackendError` vs
/// `PermanentBackendError` is a retry-budget distinction, not a type one).
impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => CoreError::not_found("object", key),
            StorageError::NotConfigured { backend } => CoreError::TransientBackendError {
                backend: backend.to_string(),
                message: "backend not configured".to_string(),
            },
            StorageError::Io { backend, message } => CoreError::TransientBackendError { backend, message },
        }
    }
}
