// [apps/gateway/src/services/backup_scheduler.rs]
/*!
 * APARATO: BACKUP SCHEDULER (ESTRATO L3)
 * Dumps the live database with `pg_dump` and uploads it to the cloud
 * leg whenever any watched table has advanced past the watermark of
 * the last recorded snapshot, skipping the cycle entirely otherwise so
 * a quiet warehouse doesn't churn the bucket with identical dumps.
 * Retention runs on its own, slower cadence against the same
 * `snapshots_to_prune`/`delete_snapshots` pair the manual admin
 * endpoint uses.
 */

use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::state::AppState;

/// Default dump-check cadence (spec §4.5: "every configured interval,
/// default 60 s"). Overridable via `BACKUP_DUMP_INTERVAL_SECONDS`.
pub const DEFAULT_DUMP_INTERVAL_SECONDS: u64 = 60;
const PRUNE_CHECK_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

pub fn spawn_backup_scheduler(state: AppState, dump_interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(dump_interval_secs.max(1)));
        let prune_every_n_cycles = (PRUNE_CHECK_PERIOD.as_secs() / dump_interval_secs.max(1)).max(1) as u32;
        let mut cycle: u32 = 0;
        loop {
            ticker.tick().await;
            cycle = cycle.wrapping_add(1);

            if let Err(e) = run_dump_cycle(&state).await {
                error!(error = %e, "backup dump cycle failed");
            }

            if cycle % prune_every_n_cycles == 0 {
                if let Err(e) = run_prune_cycle(&state).await {
                    error!(error = %e, "backup prune cycle failed");
                }
            }
        }
    });
}

async fn run_dump_cycle(state: &AppState) -> anyhow::Result<()> {
    let watermark = state.backups.current_watermark().await?;

    if let Some(latest) = state.backups.latest_snapshot().await? {
        if !state.backups.has_changed_since(latest.watermark_at_dump).await? {
            return Ok(());
        }
    }

    let now = Utc::now();
    let tmp_dir = std::env::temp_dir();
    let dump_path = tmp_dir.join(format!("coldstore-dump-{}.sql", now.format("%Y%m%d_%H%M%S")));
    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();

    let status = tokio::process::Command::new("pg_dump").arg(&database_url).arg("-f").arg(&dump_path).status().await?;
    if !status.success() {
        anyhow::bail!("pg_dump exited with {status}");
    }

    let dump_bytes = tokio::fs::read(&dump_path).await?;
    let _ = tokio::fs::remove_file(&dump_path).await;

    let object_key = format!("{}/base/{}/cold_db_{}.sql", state.backup_prefix_tag, now.format("%Y/%m/%d/%H"), now.format("%Y%m%d_%H%M%S"));
    state.storage.cloud.upload(&object_key, dump_bytes).await?;
    state.backups.record_snapshot(&object_key, watermark).await?;

    info!(object_key = %object_key, "recorded new backup snapshot");
    Ok(())
}

async fn run_prune_cycle(state: &AppState) -> anyhow::Result<()> {
    let now = Utc::now();
    let all_snapshots = state.backups.list_snapshots().await?;
    let stale = state.backups.snapshots_to_prune(now).await?;
    if stale.is_empty() {
        return Ok(());
    }

    for id in &stale {
        if let Some(snapshot) = all_snapshots.iter().find(|s| s.id == *id) {
            if let Err(e) = state.storage.cloud.delete(&snapshot.object_key).await {
                warn!(error = %e, object_key = %snapshot.object_key, "failed to delete pruned snapshot from cloud storage");
            }
        }
    }

    let pruned = state.backups.delete_snapshots(&stale).await?;
    if pruned != stale.len() as u64 {
        warn!(expected = stale.len(), actual = pruned, "prune deleted fewer rows than requested");
    }
    info!(pruned, "pruned stale backup snapshots");
    Ok(())
}
