// [libs/infra/db/src/repositories/trash.rs]
/*!
 * APARATO: TRASH / SOFT-DELETE REPOSITORY (ESTRATO L3)
 * `move_to_trash` materialises the current row and its owned children
 * as a JSON blob in `trash_bin` with a 30-day `expires_at`;
 * `restore_from_trash` re-instates it. A purger (hosted by the
 * gateway) permanently removes expired un-restored rows (spec §4.6).
 *
 * Entry is the concrete source implemented here: it is the aggregate
 * named in the design as having a soft-delete marker and owned
 * RoomEntry/Gatar children to materialise alongside it.
 */

use chrono::{DateTime, Utc};
use coldstore_domain_models::audit::TRASH_RETENTION;
use coldstore_domain_models::{Entry, Gatar, RoomEntry, TrashRecord};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::repositories::entry::EntryRow;
use crate::repositories::room_entry::{GatarRow, RoomEntryRow};

pub struct TrashRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct TrashRow {
    id: Uuid,
    source_id: Uuid,
    payload: Value,
    deleted_by: Uuid,
    deleted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    restored_at: Option<DateTime<Utc>>,
}

fn into_record(row: TrashRow, source_table: &'static str) -> TrashRecord {
    TrashRecord {
        id: row.id,
        source_table,
        source_id: row.source_id,
        payload: row.payload,
        deleted_by: row.deleted_by,
        deleted_at: row.deleted_at,
        expires_at: row.expires_at,
        restored_at: row.restored_at,
    }
}

impl TrashRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Soft-deletes an Entry: materialises it plus its RoomEntries and
    /// their Gatars as one JSON payload, sets `entries.deleted_at`, and
    /// inserts the `trash_bin` row, all inside one transaction.
    #[instrument(skip(self))]
    pub async fn move_entry_to_trash(&self, entry_id: Uuid, actor_id: Uuid) -> Result<TrashRecord, DbError> {
        let mut tx = self.pool.begin().await?;

        let entry_row: EntryRow = sqlx::query_as(
            "SELECT id, customer_id, family_member_id, thock_number, category::text, expected_quantity, created_at, deleted_at
             FROM entries WHERE id = $1 FOR UPDATE",
        )
        .bind(entry_id)
        .fetch_one(&mut *tx)
        .await?;

        let room_entry_rows: Vec<RoomEntryRow> = sqlx::query_as(
            "SELECT id, entry_id, room, floor, gatar_number, quantity, created_at FROM room_entries WHERE entry_id = $1",
        )
        .bind(entry_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut gatars_by_room_entry: Vec<(Uuid, Vec<GatarRow>)> = Vec::new();
        for room_entry in &room_entry_rows {
            let gatars: Vec<GatarRow> = sqlx::query_as(
                "SELECT id, room_entry_id, gatar_number, quantity, quality_grade FROM gatars WHERE room_entry_id = $1",
            )
            .bind(room_entry.id)
            .fetch_all(&mut *tx)
            .await?;
            gatars_by_room_entry.push((room_entry.id, gatars));
        }

        let entry: Entry = entry_row.into();
        let room_entries: Vec<RoomEntry> = room_entry_rows.into_iter().map(Into::into).collect();
        let gatars: Vec<Gatar> = gatars_by_room_entry.into_iter().flat_map(|(_, g)| g).map(Into::into).collect();

        let payload = json!({ "entry": entry, "room_entries": room_entries, "gatars": gatars });

        let now = Utc::now();
        sqlx::query("UPDATE entries SET deleted_at = $1 WHERE id = $2")
            .bind(now)
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;

        let row: TrashRow = sqlx::query_as(
            "INSERT INTO trash_bin (source_table, source_id, payload, deleted_by, expires_at)
             VALUES ('entries', $1, $2, $3, $4)
             RETURNING id, source_id, payload, deleted_by, deleted_at, expires_at, restored_at",
        )
        .bind(entry_id)
        .bind(&payload)
        .bind(actor_id)
        .bind(now + TRASH_RETENTION)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(into_record(row, "entries"))
    }

    /// Re-instates a trashed Entry: clears `deleted_at` and marks the
    /// trash row restored. The RoomEntry/Gatar children were never
    /// removed from their tables (only the Entry's `deleted_at` gates
    /// visibility), so restoring is a single-column flip plus the
    /// bookkeeping update.
    #[instrument(skip(self))]
    pub async fn restore_entry_from_trash(&self, trash_id: Uuid, actor_id: Uuid) -> Result<Entry, DbError> {
        let mut tx = self.pool.begin().await?;

        let trash: TrashRow = sqlx::query_as(
            "SELECT id, source_id, payload, deleted_by, deleted_at, expires_at, restored_at
             FROM trash_bin WHERE id = $1 AND restored_at IS NULL FOR UPDATE",
        )
        .bind(trash_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|_| DbError::MappingError("trash row not found or already restored".to_string()))?;

        let entry_row: EntryRow = sqlx::query_as(
            "UPDATE entries SET deleted_at = NULL WHERE id = $1
             RETURNING id, customer_id, family_member_id, thock_number, category::text, expected_quantity, created_at, deleted_at",
        )
        .bind(trash.source_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE trash_bin SET restored_at = now() WHERE id = $1")
            .bind(trash_id)
            .execute(&mut *tx)
            .await?;

        crate::repositories::audit::log_entry_change(
            &mut tx,
            trash.source_id,
            actor_id,
            None,
            Some(serde_json::json!({ "restored_from_trash": trash_id })),
        )
        .await?;

        tx.commit().await?;
        Ok(entry_row.into())
    }

    /// Permanently removes trash rows past `expires_at` that were never
    /// restored. Run by the periodic purger; safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn purge_expired(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM trash_bin WHERE expires_at < now() AND restored_at IS NULL")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, trash_id: Uuid) -> Result<TrashRecord, DbError> {
        let row: TrashRow = sqlx::query_as(
            "SELECT id, source_id, payload, deleted_by, deleted_at, expires_at, restored_at FROM trash_bin WHERE id = $1",
        )
        .bind(trash_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(into_record(row, "entries"))
    }
}
