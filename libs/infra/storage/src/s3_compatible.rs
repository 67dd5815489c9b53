// [libs/infra/storage/src/s3_compatible.rs]
/*!
 * APARATO: S3-COMPATIBLE OBJECT STORE BACKEND (ESTRATO L3)
 * Serves both the on-prem NAS and the cloud bucket (spec §6: "two
 * S3-compatible backends"), distinguished only by endpoint/credentials/
 * bucket at construction and by the `backend_name` tag carried into
 * every error for diagnosis.
 */

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::backend::{ObjectMeta, StorageBackend};
use crate::errors::StorageError;

pub struct S3CompatibleConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// "nas" or "r2" — used as both `name()` and the error-context tag.
    pub backend_name: &'static str,
}

pub struct S3CompatibleBackend {
    client: Client,
    bucket: String,
    backend_name: &'static str,
}

impl S3CompatibleBackend {
    pub async fn connect(config: S3CompatibleConfig) -> Self {
        let credentials = Credentials::new(config.access_key_id, config.secret_access_key, None, None, "coldstore-static");

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region))
            .endpoint_url(config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        let client = Client::from_conf(aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(true).build());

        Self { client, bucket: config.bucket, backend_name: config.backend_name }
    }

    fn io_err(&self, message: impl ToString) -> StorageError {
        StorageError::Io { backend: self.backend_name.to_string(), message: message.to_string() }
    }
}

#[async_trait]
impl StorageBackend for S3CompatibleBackend {
    fn name(&self) -> &'static str {
        self.backend_name
    }

    #[instrument(skip(self))]
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError> {
        let mut out = Vec::new();
        let mut continuation_token = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket).prefix(prefix);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| self.io_err(e))?;
            for object in response.contents() {
                let key = object.key().unwrap_or_default().to_string();
                let size = object.size().unwrap_or(0).max(0) as u64;
                let modified_at: DateTime<Utc> =
                    object.last_modified().and_then(|t| t.to_chrono_utc().ok()).unwrap_or_else(Utc::now);
                out.push(ObjectMeta { key, size, modified_at, is_dir: false });
            }

            if response.is_truncated().unwrap_or(false) {
                continuation_token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(out)
    }

    #[instrument(skip(self))]
    async fn stat(&self, key: &str) -> Result<ObjectMeta, StorageError> {
        let response = self.client.head_object().bucket(&self.bucket).key(key).send().await.map_err(|e| {
            let service_error = e.into_service_error();
            if service_error.is_not_found() {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io { backend: self.backend_name.to_string(), message: service_error.to_string() }
            }
        })?;

        let modified_at: DateTime<Utc> =
            response.last_modified().and_then(|t| t.to_chrono_utc().ok()).unwrap_or_else(Utc::now);

        Ok(ObjectMeta {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0).max(0) as u64,
            modified_at,
            is_dir: false,
        })
    }

    #[instrument(skip(self))]
    async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.client.get_object().bucket(&self.bucket).key(key).send().await.map_err(|e| {
            let service_error = e.into_service_error();
            if service_error.is_no_such_key() {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io { backend: self.backend_name.to_string(), message: service_error.to_string() }
            }
        })?;

        let bytes = response.body.collect().await.map_err(|e| self.io_err(e))?;
        Ok(bytes.into_bytes().to_vec())
    }

    #[instrument(skip(self, body))]
    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        // Keys are stable and retries reuse them; S3-compatible PUT
        // overwrites in place, so a retried upload after a partial
        // failure is always safe (spec §4.3: "object stores overwrite
        // safely").
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| self.io_err(e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client.delete_object().bucket(&self.bucket).key(key).send().await.map_err(|e| self.io_err(e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn r#move(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        let copy_source = format!("{}/{}", self.bucket, src);
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source)
            .key(dst)
            .send()
            .await
            .map_err(|e| self.io_err(e))?;
        self.delete(src).await
    }
}
