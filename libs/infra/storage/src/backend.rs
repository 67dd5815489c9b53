// [libs/infra/storage/src/backend.rs]
/*!
 * APARATO: STORAGE BACKEND CONTRACT (ESTRATO L3)
 * The capability the core consumes (spec §6): list, stat, exists,
 * download, upload, delete, move, name. Three concrete backends
 * (local disk, on-prem NAS, cloud bucket) implement this one trait;
 * the media sync coordinator and the download-fallback path never
 * know which one they're talking to.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StorageError;

#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
    pub is_dir: bool,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stable backend identifier used in error/log context: "local", "nas", "r2".
    fn name(&self) -> &'static str;

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError>;

    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.stat(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Returns the full object body. Callers needing to stream large
    /// media (photos/videos) should prefer backends sized for their
    /// deployment; this trait keeps the contract simple since the core
    /// never inspects bytes, only relays them.
    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn r#move(&self, src: &str, dst: &str) -> Result<(), StorageError>;
}
