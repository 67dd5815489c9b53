// [apps/gateway/src/services/media_sync.rs]
/*!
 * APARATO: MEDIA SYNC COORDINATOR (ESTRATO L3)
 * Drains `media_sync_records` via `FOR UPDATE SKIP LOCKED` claiming,
 * replicating each claimed file from local disk onto the NAS and cloud
 * legs still outstanding for it. A leg already marked synced is never
 * re-uploaded; a failed leg reschedules the whole row through
 * `mark_failed`'s exponential backoff rather than retrying in place,
 * so a transient NAS outage doesn't spin the worker loop.
 */

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use coldstore_domain_models::MediaSyncRecord;
use coldstore_infra_storage::StorageBackend;
use tokio::time::interval;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::state::AppState;

const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default worker pool size (spec §4.3: "N workers (default 2)").
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Spawns `worker_count` independent claim loops. Each claims and
/// drives one row at a time through `FOR UPDATE SKIP LOCKED`, so the
/// pool never double-claims and a slow NAS upload on one worker never
/// blocks the others' progress.
pub fn spawn_media_sync_workers(state: AppState, worker_count: usize) {
    for worker_id in 0..worker_count.max(1) {
        let state = state.clone();
        tokio::spawn(async move {
            let mut ticker = interval(POLL_INTERVAL);
            loop {
                ticker.tick().await;

                let now = Utc::now();
                let claimed = match state.media.claim_next(1, now).await {
                    Ok(records) => records,
                    Err(e) => {
                        error!(error = %e, worker_id, "failed to claim media sync records");
                        continue;
                    }
                };

                for record in claimed {
                    info!(worker_id, record_id = %record.id, "claimed media sync record");
                    sync_one(state.clone(), record).await;
                }
            }
        });
    }
}

/// Video containers an external transcoder may still be converting to
/// `.mp4` when the sync worker first claims the row (design §4.3 step 2).
const VIDEO_CONTAINER_EXTENSIONS: &[&str] = &["mov"];

#[instrument(skip(state, record), fields(record_id = %record.id))]
async fn sync_one(state: AppState, record: MediaSyncRecord) {
    let now = Utc::now();

    let body = match state.storage.local.download(&record.local_path).await {
        Ok(body) => body,
        Err(_) => match probe_mp4_sibling(&state, &record.local_path).await {
            Some(body) => body,
            None => {
                if record.retry_count < 3 {
                    info!(retry_count = record.retry_count, "local file missing, rescheduling shortly in case the transcoder is still writing it");
                    if let Err(e) = state.media.reschedule_missing_file(record.id, now).await {
                        error!(error = %e, "failed to reschedule media sync record for missing local file");
                    }
                } else {
                    mark_failed(&state, record.id, "local file missing after repeated probes", now).await;
                }
                return;
            }
        },
    };

    if let Some(nas) = state.storage.nas.clone() {
        if !record.nas_synced {
            if let Err(e) = upload_leg(nas, &record.object_key, body.clone()).await {
                mark_failed(&state, record.id, &format!("nas upload failed: {e}"), now).await;
                return;
            }
            if let Err(e) = state.media.mark_nas_synced(record.id).await {
                error!(error = %e, "failed to record nas_synced");
            }
        }
    }

    if !record.r2_synced {
        if let Err(e) = upload_leg(state.storage.cloud.clone(), &record.object_key, body).await {
            mark_failed(&state, record.id, &format!("cloud upload failed: {e}"), now).await;
            return;
        }
        if let Err(e) = state.media.mark_r2_synced(record.id).await {
            error!(error = %e, "failed to record r2_synced");
        }
    }

    let satisfied = record.remote_targets_satisfied(state.nas_required);
    if satisfied {
        if let Err(e) = state.media.mark_synced(record.id, now).await {
            error!(error = %e, "failed to finalize synced media record");
        }
    } else {
        warn!("remote targets not yet satisfied after sync pass, leaving for next claim");
    }
}

async fn upload_leg(backend: Arc<dyn StorageBackend>, key: &str, body: Vec<u8>) -> Result<(), coldstore_infra_storage::StorageError> {
    backend.upload(key, body).await
}

/// If `local_path` names a video container we expect an external
/// transcoder to replace with `.mp4`, probes for that sibling and
/// returns its body when present.
async fn probe_mp4_sibling(state: &AppState, local_path: &str) -> Option<Vec<u8>> {
    let path = std::path::Path::new(local_path);
    let extension = path.extension()?.to_str()?.to_lowercase();
    if !VIDEO_CONTAINER_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    let sibling = path.with_extension("mp4");
    state.storage.local.download(&sibling.to_string_lossy()).await.ok()
}

async fn mark_failed(state: &AppState, id: Uuid, message: &str, now: chrono::DateTime<Utc>) {
    warn!(record_id = %id, %message, "media sync attempt failed, scheduling retry");
    if let Err(e) = state.media.mark_failed(id, message, now).await {
        error!(error = %e, "failed to record media sync failure");
    }
}
