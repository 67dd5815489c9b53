// [libs/infra/db/src/repositories/entry.rs]
/*!
 * APARATO: ENTRY (LOT / THOCK) REPOSITORY (ESTRATO L3)
 * Mints the wire-stable `NNNN/QQ` thock number from the per-category
 * monotonic sequence (seed starts at 1, sell at 1501 — spec §6) under
 * row lock, so two concurrent creates in the same category can never
 * collide on the same number.
 */

use chrono::{DateTime, Utc};
use coldstore_domain_models::{entry::format_thock_number, Entry, EntryCategory, EntryEventKind};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::repositories::audit;

#[derive(sqlx::FromRow)]
pub(crate) struct EntryRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub family_member_id: Option<Uuid>,
    pub thock_number: String,
    pub category: String,
    pub expected_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Entry {
            id: row.id,
            customer_id: row.customer_id,
            family_member_id: row.family_member_id,
            thock_number: row.thock_number,
            category: parse_category(&row.category),
            expected_quantity: row.expected_quantity,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

fn parse_category(raw: &str) -> EntryCategory {
    match raw {
        "seed" => EntryCategory::Seed,
        "sell" => EntryCategory::Sell,
        other => panic!("unknown entry_category in database: {other}"),
    }
}

fn category_label(category: EntryCategory) -> &'static str {
    match category {
        EntryCategory::Seed => "seed",
        EntryCategory::Sell => "sell",
    }
}

pub struct EntryRepository {
    pool: PgPool,
}

impl EntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mints the next thock number for `category`, inserts the Entry,
    /// and appends a `CREATED` EntryEvent — all inside one transaction
    /// under the sequence row's lock.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        customer_id: Uuid,
        family_member_id: Option<Uuid>,
        category: EntryCategory,
        expected_quantity: i64,
        quarter: u8,
        actor_id: Uuid,
    ) -> Result<Entry, DbError> {
        let mut tx = self.pool.begin().await?;
        let category_label = category_label(category);

        let (last_sequence,): (i32,) = sqlx::query_as("SELECT last_sequence FROM thock_sequences WHERE category = $1::entry_category FOR UPDATE")
            .bind(category_label)
            .fetch_one(&mut *tx)
            .await?;
        let next_sequence = last_sequence + 1;

        sqlx::query("UPDATE thock_sequences SET last_sequence = $1 WHERE category = $2::entry_category")
            .bind(next_sequence)
            .bind(category_label)
            .execute(&mut *tx)
            .await?;

        let thock_number = format_thock_number(next_sequence as i64, quarter);

        let row: EntryRow = sqlx::query_as(
            "INSERT INTO entries (customer_id, family_member_id, thock_number, category, expected_quantity)
             VALUES ($1, $2, $3, $4::entry_category, $5)
             RETURNING id, customer_id, family_member_id, thock_number, category::text, expected_quantity, created_at, deleted_at",
        )
        .bind(customer_id)
        .bind(family_member_id)
        .bind(&thock_number)
        .bind(category_label)
        .bind(expected_quantity)
        .fetch_one(&mut *tx)
        .await?;

        let entry: Entry = row.into();

        audit::log_entry_change(&mut tx, entry.id, actor_id, None, Some(json!(&entry))).await?;
        insert_event(&mut tx, entry.id, EntryEventKind::Created, json!({ "thock_number": entry.thock_number }), actor_id).await?;

        tx.commit().await?;
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Entry, DbError> {
        let row: EntryRow = sqlx::query_as(
            "SELECT id, customer_id, family_member_id, thock_number, category::text, expected_quantity, created_at, deleted_at
             FROM entries WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    pub async fn find_by_thock_number(&self, thock_number: &str) -> Result<Option<Entry>, DbError> {
        let row: Option<EntryRow> = sqlx::query_as(
            "SELECT id, customer_id, family_member_id, thock_number, category::text, expected_quantity, created_at, deleted_at
             FROM entries WHERE thock_number = $1",
        )
        .bind(thock_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Entries remain queryable indefinitely even after full withdrawal
    /// or soft-delete (spec §3): this lists every non-trashed entry for
    /// a customer regardless of withdrawal state.
    #[instrument(skip(self))]
    pub async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Entry>, DbError> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT id, customer_id, family_member_id, thock_number, category::text, expected_quantity, created_at, deleted_at
             FROM entries WHERE customer_id = $1 AND deleted_at IS NULL ORDER BY created_at",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Shared with `room_entry` and `gate_pass` repositories, which append
/// `ROOM_ASSIGNED`, `GATE_PASS_ISSUED`, `ITEMS_OUT`, and `COMPLETED`
/// events in the same transaction as their own mutation.
pub(crate) async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: Uuid,
    kind: EntryEventKind,
    payload: serde_json::Value,
    created_by: Uuid,
) -> Result<(), DbError> {
    let kind_label = match kind {
        EntryEventKind::Created => "created",
        EntryEventKind::RoomAssigned => "room_assigned",
        EntryEventKind::GatePassIssued => "gate_pass_issued",
        EntryEventKind::ItemsOut => "items_out",
        EntryEventKind::Completed => "completed",
    };

    sqlx::query("INSERT INTO entry_events (entry_id, kind, payload, created_by) VALUES ($1, $2::entry_event_kind, $3, $4)")
        .bind(entry_id)
        .bind(kind_label)
        .bind(payload)
        .bind(created_by)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
