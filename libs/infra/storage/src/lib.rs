// [libs/infra/storage/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STORAGE BACKEND LIBRARY ROOT (ESTRATO L3)
 * CLASIFICACIÓN: CRATE ROOT
 * RESPONSABILIDAD: TRANSPORTE DE OBJETOS UNIFICADO
 *
 * Three handles are wired at startup: a `LocalFsBackend` rooted at the
 * local pool, and two `S3CompatibleBackend`s (NAS, cloud). The NAS
 * backend is optional — absent configuration disables it without
 * failing the process (spec §6), modelled here as `Option<Arc<dyn
 * StorageBackend>>` so callers handle its absence explicitly rather
 * than through a null-object stand-in.
 * =================================================================
 */

pub mod backend;
pub mod errors;
pub mod local;
pub mod s3_compatible;

pub use backend::{ObjectMeta, StorageBackend};
pub use errors::StorageError;
pub use local::LocalFsBackend;
pub use s3_compatible::{S3CompatibleBackend, S3CompatibleConfig};

use std::sync::Arc;

/// The three wired handles the façade and media sync coordinator
/// consume. `nas` absent means the NAS backend was not configured.
#[derive(Clone)]
pub struct StorageBackends {
    pub local: Arc<dyn StorageBackend>,
    pub nas: Option<Arc<dyn StorageBackend>>,
    pub cloud: Arc<dyn StorageBackend>,
}

impl StorageBackends {
    /// Tries local, then NAS, then cloud, returning the first hit. A
    /// `NotFound` is returned only if all three miss (spec §4.3 download
    /// fallback).
    pub async fn download_with_fallback(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if let Ok(body) = self.local.download(key).await {
            return Ok(body);
        }
        if let Some(nas) = &self.nas {
            if let Ok(body) = nas.download(key).await {
                return Ok(body);
            }
        }
        self.cloud.download(key).await
    }
}
