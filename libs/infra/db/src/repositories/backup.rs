// [libs/infra/db/src/repositories/backup.rs]
/*!
 * APARATO: BACKUP BOOKKEEPING REPOSITORY (ESTRATO L3)
 * Backs the change-gated periodic dump of spec §4.5: the scheduler
 * skips a dump cycle entirely when no watched table has advanced past
 * the last recorded snapshot's watermark, and this repository is where
 * that comparison and the subsequent record live. The actual `pg_dump`
 * invocation and cloud upload are the gateway's `backup_scheduler`
 * service's job, not this repository's — this owns only the SQL
 * bookkeeping either side of it.
 */

use chrono::{DateTime, Utc};
use coldstore_domain_models::TableChangeWatermark;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

const WATCHED_TABLES: &[&str] = &["entries", "room_entries", "customers", "gate_passes", "rent_payments", "ledger_entries"];

#[derive(Debug, Clone)]
pub struct BackupSnapshot {
    pub id: Uuid,
    pub object_key: String,
    pub created_at: DateTime<Utc>,
    pub watermark_at_dump: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BackupSnapshotRow {
    id: Uuid,
    object_key: String,
    created_at: DateTime<Utc>,
    watermark_at_dump: DateTime<Utc>,
}

impl From<BackupSnapshotRow> for BackupSnapshot {
    fn from(row: BackupSnapshotRow) -> Self {
        BackupSnapshot {
            id: row.id,
            object_key: row.object_key,
            created_at: row.created_at,
            watermark_at_dump: row.watermark_at_dump,
        }
    }
}

pub struct BackupRepository {
    pool: PgPool,
}

impl BackupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The most recent `last_modified` across every watched table — the
    /// single watermark the scheduler compares against the last dump.
    #[instrument(skip(self))]
    pub async fn current_watermark(&self) -> Result<DateTime<Utc>, DbError> {
        let (watermark,): (DateTime<Utc>,) = sqlx::query_as(
            "SELECT MAX(last_modified) FROM table_change_tracking WHERE table_name = ANY($1)",
        )
        .bind(WATCHED_TABLES)
        .fetch_one(&self.pool)
        .await?;
        Ok(watermark)
    }

    #[instrument(skip(self))]
    pub async fn watermarks(&self) -> Result<Vec<TableChangeWatermark>, DbError> {
        let rows: Vec<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT table_name, last_modified FROM table_change_tracking WHERE table_name = ANY($1)")
                .bind(WATCHED_TABLES)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(table_name, last_modified)| TableChangeWatermark {
                table_name: WATCHED_TABLES.iter().find(|t| **t == table_name).copied().unwrap_or("unknown"),
                last_modified,
            })
            .collect())
    }

    /// `true` when the data has changed since `last_snapshot_watermark`
    /// — the scheduler's gate for whether this cycle's dump is worth
    /// taking at all.
    #[instrument(skip(self))]
    pub async fn has_changed_since(&self, last_snapshot_watermark: DateTime<Utc>) -> Result<bool, DbError> {
        Ok(self.current_watermark().await? > last_snapshot_watermark)
    }

    #[instrument(skip(self))]
    pub async fn record_snapshot(&self, object_key: &str, watermark_at_dump: DateTime<Utc>) -> Result<BackupSnapshot, DbError> {
        let row: BackupSnapshotRow = sqlx::query_as(
            "INSERT INTO backup_snapshots (object_key, watermark_at_dump) VALUES ($1, $2)
             RETURNING id, object_key, created_at, watermark_at_dump",
        )
        .bind(object_key)
        .bind(watermark_at_dump)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    pub async fn latest_snapshot(&self) -> Result<Option<BackupSnapshot>, DbError> {
        let row: Option<BackupSnapshotRow> = sqlx::query_as(
            "SELECT id, object_key, created_at, watermark_at_dump FROM backup_snapshots ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    pub async fn list_snapshots(&self) -> Result<Vec<BackupSnapshot>, DbError> {
        let rows: Vec<BackupSnapshotRow> =
            sqlx::query_as("SELECT id, object_key, created_at, watermark_at_dump FROM backup_snapshots ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Computes the retention-policy survivor set (spec §4.5): every
    /// snapshot under a day old survives; 1-30 days old, one per hour
    /// survives; beyond 30 days, one per day survives. Returns the ids
    /// NOT in the survivor set — the ones the scheduler should delete
    /// both from this table and from the cloud bucket.
    #[instrument(skip(self))]
    pub async fn snapshots_to_prune(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, DbError> {
        let snapshots = self.list_snapshots().await?;
        Ok(compute_prune_set(&snapshots, now))
    }

    #[instrument(skip(self))]
    pub async fn delete_snapshots(&self, ids: &[Uuid]) -> Result<u64, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM backup_snapshots WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn compute_prune_set(snapshots: &[BackupSnapshot], now: DateTime<Utc>) -> Vec<Uuid> {
    let one_day = chrono::Duration::days(1);
    let thirty_days = chrono::Duration::days(30);

    let mut kept_buckets: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut prune = Vec::new();

    // Newest-first so the bucket representative is the newest snapshot
    // in that bucket, matching an operator's expectation of "keep the
    // latest of each retained slot".
    let mut ordered: Vec<&BackupSnapshot> = snapshots.iter().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    for snapshot in ordered {
        let age = now - snapshot.created_at;
        if age < one_day {
            continue;
        }

        let bucket = if age < thirty_days {
            snapshot.created_at.format("%Y-%m-%d-%H").to_string()
        } else {
            snapshot.created_at.format("%Y-%m-%d").to_string()
        };

        if !kept_buckets.insert(bucket) {
            prune.push(snapshot.id);
        }
    }

    prune
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(id: Uuid, created_at: DateTime<Utc>) -> BackupSnapshot {
        BackupSnapshot { id, object_key: format!("{id}"), created_at, watermark_at_dump: created_at }
    }

    #[test]
    fn keeps_everything_under_a_day_old() {
        let now = Utc::now();
        let snapshots: Vec<BackupSnapshot> = (0..5).map(|h| snapshot(Uuid::new_v4(), now - Duration::hours(h))).collect();
        assert!(compute_prune_set(&snapshots, now).is_empty());
    }

    #[test]
    fn keeps_one_per_hour_in_the_thirty_day_window() {
        let now = Utc::now();
        let base = now - Duration::days(5);
        // Two snapshots in the same hour: the older one should be pruned.
        let a = snapshot(Uuid::new_v4(), base);
        let b = snapshot(Uuid::new_v4(), base + Duration::minutes(10));
        let pruned = compute_prune_set(&[a.clone(), b.clone()], now);
        assert_eq!(pruned, vec![a.id]);
    }

    #[test]
    fn keeps_one_per_day_beyond_thirty_days() {
        let now = Utc::now();
        let base = now - Duration::days(40);
        let a = snapshot(Uuid::new_v4(), base);
        let b = snapshot(Uuid::new_v4(), base + Duration::hours(5));
        let pruned = compute_prune_set(&[a.clone(), b.clone()], now);
        assert_eq!(pruned, vec![a.id]);
    }
}
