// [libs/infra/db/src/repositories/room_entry.rs]
/*!
 * APARATO: ROOM PLACEMENT REPOSITORY (ESTRATO L3)
 * Places lots into (room, floor, gatar) slots and records the per-grade
 * Gatar breakdown. `placed(E)` used by the gate-pass engine is the sum
 * of RoomEntry quantities for an entry, loaded under `FOR UPDATE` so a
 * concurrent placement can't change `placed(E)` out from under a
 * gate-pass create/approve happening in the same moment.
 *
 * The first placement against a never-before-placed entry triggers an
 * automatic CHARGE ledger entry for the storage fee (spec §4.2); the
 * rate itself is supplied by the caller — this repository has no
 * pricing policy of its own.
 */

use chrono::{DateTime, Utc};
use coldstore_domain_models::{CoreError, EntryEventKind, Gatar, RoomEntry};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::repositories::{audit, entry, ledger};

#[derive(sqlx::FromRow)]
pub(crate) struct RoomEntryRow {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub room: String,
    pub floor: i16,
    pub gatar_number: i32,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl From<RoomEntryRow> for RoomEntry {
    fn from(row: RoomEntryRow) -> Self {
        RoomEntry {
            id: row.id,
            entry_id: row.entry_id,
            room: row.room,
            floor: row.floor,
            gatar_number: row.gatar_number,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct GatarRow {
    pub id: Uuid,
    pub room_entry_id: Uuid,
    pub gatar_number: i32,
    pub quantity: i64,
    pub quality_grade: Option<String>,
}

impl From<GatarRow> for Gatar {
    fn from(row: GatarRow) -> Self {
        Gatar {
            id: row.id,
            room_entry_id: row.room_entry_id,
            gatar_number: row.gatar_number,
            quantity: row.quantity,
            quality_grade: row.quality_grade,
        }
    }
}

/// One grade breakdown line supplied by the caller when placing a lot.
pub struct GatarBreakdown {
    pub quantity: i64,
    pub quality_grade: Option<String>,
}

pub struct RoomEntryRepository {
    pool: PgPool,
}

impl RoomEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Places `quantity` of `entry_id` at (room, floor, gatar_number),
    /// recording `gatars` as the quality-grade breakdown. `storage_fee`
    /// is charged once, on the first placement for this entry, as an
    /// automatic ledger CHARGE against `customer_id`.
    #[instrument(skip(self, gatars))]
    #[allow(clippy::too_many_arguments)]
    pub async fn assign_room(
        &self,
        entry_id: Uuid,
        customer_id: Uuid,
        room: &str,
        floor: i16,
        gatar_number: i32,
        quantity: i64,
        gatars: Vec<GatarBreakdown>,
        storage_fee: Option<Decimal>,
        actor_id: Uuid,
    ) -> Result<RoomEntry, DbError> {
        let gatar_sum: i64 = gatars.iter().map(|g| g.quantity).sum();
        if gatar_sum != quantity {
            return Err(DbError::MappingError(format!(
                "gatar breakdown sums to {gatar_sum}, expected {quantity}"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let (is_first_placement,): (bool,) =
            sqlx::query_as("SELECT NOT EXISTS (SELECT 1 FROM room_entries WHERE entry_id = $1)")
                .bind(entry_id)
                .fetch_one(&mut *tx)
                .await?;

        let row: RoomEntryRow = sqlx::query_as(
            "INSERT INTO room_entries (entry_id, room, floor, gatar_number, quantity)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, entry_id, room, floor, gatar_number, quantity, created_at",
        )
        .bind(entry_id)
        .bind(room)
        .bind(floor)
        .bind(gatar_number)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        for gatar in &gatars {
            sqlx::query("INSERT INTO gatars (room_entry_id, gatar_number, quantity, quality_grade) VALUES ($1, $2, $3, $4)")
                .bind(row.id)
                .bind(gatar_number)
                .bind(gatar.quantity)
                .bind(&gatar.quality_grade)
                .execute(&mut *tx)
                .await?;
        }

        let room_entry: RoomEntry = row.into();

        audit::log_room_entry_change(&mut tx, room_entry.id, actor_id, None, Some(json!(&room_entry))).await?;
        entry::insert_event(
            &mut tx,
            entry_id,
            EntryEventKind::RoomAssigned,
            json!({ "room": room, "floor": floor, "gatar_number": gatar_number, "quantity": quantity }),
            actor_id,
        )
        .await?;

        if is_first_placement {
            if let Some(fee) = storage_fee {
                ledger::insert_within_tx(
                    &mut tx,
                    customer_id,
                    coldstore_domain_models::LedgerEntryKind::Charge,
                    fee,
                    Decimal::ZERO,
                    format!("storage fee for entry {entry_id}"),
                    "entry",
                    entry_id,
                    actor_id,
                )
                .await?;
            }
        }

        tx.commit().await?;
        Ok(room_entry)
    }

    /// `placed(E)` — the sum of RoomEntry quantities for an entry, as
    /// plain reads (outside any lock). Used for display purposes; the
    /// gate-pass repository re-derives this under `FOR UPDATE` itself.
    #[instrument(skip(self))]
    pub async fn placed_for_entry(&self, entry_id: Uuid) -> Result<i64, DbError> {
        let mut conn = self.pool.acquire().await?;
        placed_for_entry_tx(&mut conn, entry_id).await
    }

    /// Same as [`Self::placed_for_entry`], but reads inside an existing
    /// transaction so the gate-pass repository can derive `placed(E)`
    /// under its own `FOR UPDATE` lock rather than a second round trip.
    #[instrument(skip(tx))]
    pub async fn placed_for_entry_locked(tx: &mut Transaction<'_, Postgres>, entry_id: Uuid) -> Result<i64, DbError> {
        let (total,): (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(re.quantity) FROM room_entries re WHERE re.entry_id = $1",
        )
        .bind(entry_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(total.unwrap_or(0))
    }

    #[instrument(skip(self))]
    pub async fn list_for_entry(&self, entry_id: Uuid) -> Result<Vec<RoomEntry>, DbError> {
        let rows: Vec<RoomEntryRow> = sqlx::query_as(
            "SELECT id, entry_id, room, floor, gatar_number, quantity, created_at FROM room_entries WHERE entry_id = $1",
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Locates the gatar slot a pickup draws from and validates the
    /// requested amount against what remains in it. Called by the
    /// gate-pass repository inside its own pickup transaction.
    #[instrument(skip(tx))]
    pub async fn find_gatar_for_pickup(
        tx: &mut Transaction<'_, Postgres>,
        entry_id: Uuid,
        room: &str,
        floor: i16,
        gatar_number: i32,
        requested: i64,
    ) -> Result<Gatar, CoreError> {
        let row: Option<GatarRow> = sqlx::query_as(
            "SELECT g.id, g.room_entry_id, g.gatar_number, g.quantity, g.quality_grade
             FROM gatars g
             JOIN room_entries re ON re.id = g.room_entry_id
             WHERE re.entry_id = $1 AND re.room = $2 AND re.floor = $3 AND g.gatar_number = $4
             FOR UPDATE OF g",
        )
        .bind(entry_id)
        .bind(room)
        .bind(floor)
        .bind(gatar_number)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| CoreError::TransientBackendError { backend: "postgres".to_string(), message: e.to_string() })?;

        let gatar: Gatar = row
            .ok_or_else(|| CoreError::not_found("Gatar", gatar_number.to_string()))?
            .into();

        coldstore_domain_gatepass::validate_gatar_breakdown(room, floor, gatar_number, requested, gatar.quantity)?;
        Ok(gatar)
    }

    /// Deducts `amount` from the gatar's remaining quantity after a
    /// pickup is recorded against it.
    #[instrument(skip(tx))]
    pub async fn deduct_gatar(tx: &mut Transaction<'_, Postgres>, gatar_id: Uuid, amount: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE gatars SET quantity = quantity - $1 WHERE id = $2")
            .bind(amount)
            .bind(gatar_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

pub(crate) async fn placed_for_entry_tx(
    executor: &mut sqlx::PgConnection,
    entry_id: Uuid,
) -> Result<i64, DbError> {
    let (total,): (Option<i64>,) = sqlx::query_as("SELECT SUM(quantity) FROM room_entries WHERE entry_id = $1")
        .bind(entry_id)
        .fetch_one(executor)
        .await?;
    Ok(total.unwrap_or(0))
}
