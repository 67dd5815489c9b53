// [libs/infra/db/src/repositories/media.rs]
/*!
 * APARATO: MEDIA SYNC QUEUE REPOSITORY (ESTRATO L3)
 * Backs the 3-2-1 replication worker pool (spec §5). `claim_next` uses
 * `FOR UPDATE SKIP LOCKED` so N concurrent workers can drain the same
 * queue without blocking each other on rows already in flight — the
 * same pattern the teacher's queue claiming uses, generalised from one
 * backend to the local/NAS/cloud triple.
 */

use chrono::{DateTime, Utc};
use coldstore_domain_models::media::retry_backoff;
use coldstore_domain_models::{MediaSourceKind, MediaSyncRecord, SyncStatus};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

#[derive(sqlx::FromRow)]
struct MediaSyncRow {
    id: Uuid,
    source_kind: String,
    source_id: Uuid,
    local_path: String,
    object_key: String,
    file_size: i64,
    sync_status: String,
    local_synced: bool,
    nas_synced: bool,
    r2_synced: bool,
    retry_count: i32,
    max_retries: i32,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    next_retry_at: Option<DateTime<Utc>>,
}

fn parse_source_kind(raw: &str) -> MediaSourceKind {
    match raw {
        "room-entry" => MediaSourceKind::RoomEntry,
        "gate-pass" => MediaSourceKind::GatePass,
        other => panic!("unknown media_source_kind in database: {other}"),
    }
}

fn parse_status(raw: &str) -> SyncStatus {
    match raw {
        "pending" => SyncStatus::Pending,
        "uploading" => SyncStatus::Uploading,
        "synced" => SyncStatus::Synced,
        "failed" => SyncStatus::Failed,
        "skipped" => SyncStatus::Skipped,
        other => panic!("unknown media_sync_status in database: {other}"),
    }
}

fn status_label(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Pending => "pending",
        SyncStatus::Uploading => "uploading",
        SyncStatus::Synced => "synced",
        SyncStatus::Failed => "failed",
        SyncStatus::Skipped => "skipped",
    }
}

impl From<MediaSyncRow> for MediaSyncRecord {
    fn from(row: MediaSyncRow) -> Self {
        MediaSyncRecord {
            id: row.id,
            source_kind: parse_source_kind(&row.source_kind),
            source_id: row.source_id,
            local_path: row.local_path,
            object_key: row.object_key,
            file_size: row.file_size,
            sync_status: parse_status(&row.sync_status),
            local_synced: row.local_synced,
            nas_synced: row.nas_synced,
            r2_synced: row.r2_synced,
            retry_count: row.retry_count,
            max_retries: row.max_retries,
            last_error: row.last_error,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            next_retry_at: row.next_retry_at,
        }
    }
}

const MEDIA_COLUMNS: &str = "id, source_kind::text, source_id, local_path, object_key, file_size, sync_status::text, \
     local_synced, nas_synced, r2_synced, retry_count, max_retries, last_error, created_at, started_at, completed_at, next_retry_at";

#[derive(sqlx::FromRow)]
struct CloudSyncedAssetRow {
    id: Uuid,
    source_kind: String,
    thock_number: String,
    media_type: String,
    file_name: String,
    uploaded_at: DateTime<Utc>,
}

/// Enough of a `media_assets` row to reconstruct its object key and
/// local path without a second round-trip.
#[derive(Debug, Clone)]
pub struct CloudSyncedAsset {
    pub id: Uuid,
    pub source_kind: MediaSourceKind,
    pub thock_number: String,
    pub media_type: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<CloudSyncedAssetRow> for CloudSyncedAsset {
    fn from(row: CloudSyncedAssetRow) -> Self {
        CloudSyncedAsset {
            id: row.id,
            source_kind: parse_source_kind(&row.source_kind),
            thock_number: row.thock_number,
            media_type: row.media_type,
            file_name: row.file_name,
            uploaded_at: row.uploaded_at,
        }
    }
}

pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueues a freshly-written local file for NAS/cloud replication.
    #[instrument(skip(self))]
    pub async fn enqueue(
        &self,
        source_kind: MediaSourceKind,
        source_id: Uuid,
        local_path: &str,
        object_key: &str,
        file_size: i64,
    ) -> Result<MediaSyncRecord, DbError> {
        let row: MediaSyncRow = sqlx::query_as(&format!(
            "INSERT INTO media_sync_records (source_kind, source_id, local_path, object_key, file_size)
             VALUES ($1::media_source_kind, $2, $3, $4, $5)
             RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(source_kind.as_path_segment())
        .bind(source_id)
        .bind(local_path)
        .bind(object_key)
        .bind(file_size)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Claims up to `limit` pending-or-retry-ready rows for this
    /// worker, skipping any row another worker already has locked.
    #[instrument(skip(self))]
    pub async fn claim_next(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<MediaSyncRecord>, DbError> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<MediaSyncRow> = sqlx::query_as(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media_sync_records
             WHERE (sync_status = 'pending' OR (sync_status = 'failed' AND next_retry_at <= $1))
             ORDER BY created_at
             LIMIT $2
             FOR UPDATE SKIP LOCKED"
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            tx.commit().await?;
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        sqlx::query("UPDATE media_sync_records SET sync_status = 'uploading', started_at = $1 WHERE id = ANY($2)")
            .bind(now)
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn mark_nas_synced(&self, id: Uuid) -> Result<(), DbError> {
        sqlx::query("UPDATE media_sync_records SET nas_synced = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn mark_r2_synced(&self, id: Uuid) -> Result<(), DbError> {
        sqlx::query("UPDATE media_sync_records SET r2_synced = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Finalises a row once every configured remote target is synced,
    /// and flips the owning `media_assets.cloud_synced` flag.
    #[instrument(skip(self))]
    pub async fn mark_synced(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let row: (Uuid,) = sqlx::query_as("UPDATE media_sync_records SET sync_status = 'synced', completed_at = $1 WHERE id = $2 RETURNING source_id")
            .bind(now)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE media_assets SET cloud_synced = TRUE WHERE id = $1")
            .bind(row.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Records a failed attempt, scheduling the next retry per
    /// `retry_backoff`. Once `retry_count` exceeds `max_retries`, the
    /// row is left in `failed` with no `next_retry_at`, so the claim
    /// query's `next_retry_at <= now` predicate naturally stops
    /// re-selecting it; an operator resets it explicitly to try again.
    #[instrument(skip(self))]
    pub async fn mark_failed(&self, id: Uuid, error: &str, now: DateTime<Utc>) -> Result<(), DbError> {
        let row: (i32, i32) = sqlx::query_as("SELECT retry_count, max_retries FROM media_sync_records WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        let (retry_count, max_retries) = row;
        let next_retry_count = retry_count + 1;

        let next_retry_at = if next_retry_count > max_retries {
            None
        } else {
            Some(now + retry_backoff(retry_count))
        };

        sqlx::query("UPDATE media_sync_records SET sync_status = 'failed', retry_count = $1, last_error = $2, next_retry_at = $3 WHERE id = $4")
            .bind(next_retry_count)
            .bind(error)
            .bind(next_retry_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The "file not yet on disk" branch of a worker pass: the
    /// transcoder or upload client may still be writing the file. Holds
    /// the row at a fixed 30s retry rather than the error backoff
    /// schedule, and leaves it to the caller to fall back to
    /// `mark_failed` once `retry_count` reaches 3 (design §4.3 step 2).
    #[instrument(skip(self))]
    pub async fn reschedule_missing_file(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE media_sync_records SET sync_status = 'failed', retry_count = retry_count + 1,
             last_error = 'local file not yet present', next_retry_at = $1 WHERE id = $2",
        )
        .bind(now + chrono::Duration::seconds(30))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<MediaSyncRecord, DbError> {
        let row: MediaSyncRow = sqlx::query_as(&format!("SELECT {MEDIA_COLUMNS} FROM media_sync_records WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    /// Every `media_assets` row not yet marked `cloud_synced`, for the
    /// bulk-restore / cloud-backfill admin scan.
    #[instrument(skip(self))]
    pub async fn list_cloud_pending(&self) -> Result<Vec<Uuid>, DbError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM media_assets WHERE cloud_synced = FALSE")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Every `media_assets` row already marked `cloud_synced`, for the
    /// bulk-restore scan (design "Initial sync / bulk restore", scan b):
    /// the caller checks each one's local path against disk and
    /// downloads NAS-then-cloud for whichever are missing.
    #[instrument(skip(self))]
    pub async fn list_cloud_synced_assets(&self) -> Result<Vec<CloudSyncedAsset>, DbError> {
        let rows: Vec<CloudSyncedAssetRow> = sqlx::query_as(
            "SELECT id, source_kind::text, thock_number, media_type, file_name, uploaded_at
             FROM media_assets WHERE cloud_synced = TRUE",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Looks up the path components needed to rebuild an asset's object
    /// key and local path, for the admin fan-out delete.
    #[instrument(skip(self))]
    pub async fn get_asset(&self, id: Uuid) -> Result<CloudSyncedAsset, DbError> {
        let row: CloudSyncedAssetRow = sqlx::query_as(
            "SELECT id, source_kind::text, thock_number, media_type, file_name, uploaded_at
             FROM media_assets WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    pub async fn register_asset(
        &self,
        source_kind: MediaSourceKind,
        source_id: Uuid,
        thock_number: &str,
        media_type: &str,
        file_name: &str,
        uploaded_by: Uuid,
    ) -> Result<Uuid, DbError> {
        let row: (Uuid,) = sqlx::query_as(
            "INSERT INTO media_assets (source_kind, source_id, thock_number, media_type, file_name, uploaded_by)
             VALUES ($1::media_source_kind, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(source_kind.as_path_segment())
        .bind(source_id)
        .bind(thock_number)
        .bind(media_type)
        .bind(file_name)
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }
}
