// [libs/infra/storage/src/local.rs]
/*!
 * APARATO: LOCAL FILESYSTEM BACKEND (ESTRATO L3)
 * Rooted at the configured local pool directory. Uploads are written
 * to a sibling temp file and renamed into place (spec §5: "file-system
 * writes are performed to a temporary name and renamed") so a
 * cancelled write never leaves a half-written object at its real key.
 */

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::backend::{ObjectMeta, StorageBackend};
use crate::errors::StorageError;

pub struct LocalFsBackend {
    root: PathBuf,
}

impl LocalFsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn io_err(message: impl ToString) -> StorageError {
        StorageError::Io { backend: "local".to_string(), message: message.to_string() }
    }
}

#[async_trait]
impl StorageBackend for LocalFsBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self))]
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError> {
        let dir = self.resolve(prefix);
        let mut out = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(Self::io_err(e)),
        };

        while let Some(entry) = entries.next_entry().await.map_err(Self::io_err)? {
            let meta = entry.metadata().await.map_err(Self::io_err)?;
            let key = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(&entry.path())
                .to_string_lossy()
                .to_string();
            let modified_at: DateTime<Utc> = meta.modified().map_err(Self::io_err)?.into();
            out.push(ObjectMeta { key, size: meta.len(), modified_at, is_dir: meta.is_dir() });
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError> {
        let path = self.resolve(key);
        let meta = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                Self::io_err(e)
            }
        })?;
        let modified_at: DateTime<Utc> = meta.modified().map_err(Self::io_err)?.into();
        Ok(ObjectMeta { key: key.to_string(), size: meta.len(), modified_at, is_dir: meta.is_dir() })
    }

    #[instrument(skip(self))]
    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(self.resolve(key)).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                Self::io_err(e)
            }
        })
    }

    #[instrument(skip(self, body))]
    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        let dest = self.resolve(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Self::io_err)?;
        }

        let tmp = sibling_temp_path(&dest);
        tokio::fs::write(&tmp, &body).await.map_err(Self::io_err)?;
        tokio::fs::rename(&tmp, &dest).await.map_err(Self::io_err)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.resolve(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(e)),
        }
    }

    #[instrument(skip(self))]
    async fn r#move(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let dest = self.resolve(dst);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Self::io_err)?;
        }
        tokio::fs::rename(self.resolve(src), dest).await.map_err(Self::io_err)
    }
}

fn sibling_temp_path(dest: &Path) -> PathBuf {
    let file_name = dest.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_download_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(dir.path());

        backend.upload("room-entry/1501/02/photo/bag.jpg", b"hello".to_vec()).await.unwrap();
        assert!(backend.exists("room-entry/1501/02/photo/bag.jpg").await.unwrap());
        let body = backend.download("room-entry/1501/02/photo/bag.jpg").await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn missing_key_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(dir.path());
        let err = backend.download("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(!backend.exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn upload_never_leaves_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFsBackend::new(dir.path());
        backend.upload("x/y.jpg", b"data".to_vec()).await.unwrap();

        let mut leftovers = tokio::fs::read_dir(dir.path().join("x")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = leftovers.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["y.jpg".to_string()]);
    }
}
