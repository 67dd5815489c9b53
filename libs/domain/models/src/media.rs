// [libs/domain/models/src/media.rs]
/*!
 * APARATO: MEDIA SYNC DOMAIN MODEL (ESTRATO L2)
 * Queue row driving the 3-2-1 replication across local disk, NAS, and
 * cloud bucket. Object keys are stable; retries reuse them.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaSourceKind {
    RoomEntry,
    GatePass,
}

impl MediaSourceKind {
    pub fn as_path_segment(self) -> &'static str {
        match self {
            MediaSourceKind::RoomEntry => "room-entry",
            MediaSourceKind::GatePass => "gate-pass",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncStatus {
    Pending,
    Uploading,
    Synced,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSyncRecord {
    pub id: Uuid,
    pub source_kind: MediaSourceKind,
    pub source_id: Uuid,
    pub local_path: String,
    pub object_key: String,
    pub file_size: i64,
    pub sync_status: SyncStatus,
    pub local_synced: bool,
    pub nas_synced: bool,
    pub r2_synced: bool,
    pub retry_count: i32,
    pub max_retries: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub next_retry_at: Option<DateTime<Utc>>,
}

impl MediaSyncRecord {
    pub fn new(
        source_kind: MediaSourceKind,
        source_id: Uuid,
        local_path: String,
        object_key: String,
        file_size: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_kind,
            source_id,
            local_path,
            object_key,
            file_size,
            sync_status: SyncStatus::Pending,
            local_synced: true,
            nas_synced: false,
            r2_synced: false,
            retry_count: 0,
            max_retries: 5,
            last_error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            next_retry_at: None,
        }
    }

    /// Both configured remote targets are synced (or the unconfigured one
    /// is treated as vacuously satisfied — the caller passes `nas_required`).
    pub fn remote_targets_satisfied(&self, nas_required: bool) -> bool {
        let nas_ok = !nas_required || self.nas_synced;
        nas_ok && self.r2_synced
    }
}

/// `{sourceKind}/{thockNumber}/{mediaType}/{fileName}`.
pub fn format_object_key(source_kind: MediaSourceKind, thock_number: &str, media_type: &str, file_name: &str) -> String {
    format!("{}/{}/{}/{}", source_kind.as_path_segment(), thock_number, media_type, file_name)
}

/// `Room Config/{year}/{thockNumber}/{fileName}` — local disk layout.
pub fn format_local_media_path(year: i32, thock_number: &str, file_name: &str) -> String {
    format!("Room Config/{}/{}/{}", year, thock_number, file_name)
}

/// Exponential backoff schedule indexed by `retry_count`.
pub fn retry_backoff(retry_count: i32) -> chrono::Duration {
    let seconds = match retry_count {
        0 => 30,
        1 => 60,
        2 => 5 * 60,
        3 => 15 * 60,
        _ => 60 * 60,
    };
    chrono::Duration::seconds(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_object_key() {
        assert_eq!(
            format_object_key(MediaSourceKind::RoomEntry, "1501/02", "photo", "bag-1.jpg"),
            "room-entry/1501/02/photo/bag-1.jpg"
        );
    }

    #[test]
    fn backoff_follows_schedule() {
        assert_eq!(retry_backoff(0), chrono::Duration::seconds(30));
        assert_eq!(retry_backoff(1), chrono::Duration::seconds(60));
        assert_eq!(retry_backoff(2), chrono::Duration::seconds(300));
        assert_eq!(retry_backoff(3), chrono::Duration::seconds(900));
        assert_eq!(retry_backoff(4), chrono::Duration::seconds(3600));
        assert_eq!(retry_backoff(99), chrono::Duration::seconds(3600));
    }

    #[test]
    fn remote_targets_satisfied_respects_nas_requirement() {
        let mut record = MediaSyncRecord::new(MediaSourceKind::GatePass, Uuid::new_v4(), "x".into(), "y".into(), 10);
        record.r2_synced = true;
        assert!(record.remote_targets_satisfied(false));
        assert!(!record.remote_targets_satisfied(true));
        record.nas_synced = true;
        assert!(record.remote_targets_satisfied(true));
    }
}
