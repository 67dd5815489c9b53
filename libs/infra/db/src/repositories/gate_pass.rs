// [libs/infra/db/src/repositories/gate_pass.rs]
/*!
 * APARATO: GATE-PASS REPOSITORY (ESTRATO L3)
 * The only caller of `coldstore-domain-gatepass`'s pure functions.
 * Every write here takes `SELECT id FROM entries WHERE id = $1 FOR UPDATE`
 * as its first statement — with zero live gate passes against an entry,
 * locking sibling rows alone locks nothing, so the entry row itself is
 * what actually serialises the reservation arithmetic. `placed(E)` and
 * every sibling gate pass are then loaded under lock in the same
 * transaction before calling into the engine.
 *
 * `sweep_expired` is the one exception: it does not round-trip through
 * the pure engine at all. The design calls for the sweep to "issue one
 * statement atomically" (spec §4.1), so it is a single raw `UPDATE`
 * covering both the pending and the approval expiry windows — the same
 * fix `coldstore-domain-gatepass::should_expire` encodes, expressed
 * directly in SQL rather than loaded into Rust structs first.
 */

use chrono::{DateTime, Utc};
use coldstore_domain_gatepass::{approve_gate_pass, create_gate_pass, physical, GatePassPolicy};
use coldstore_domain_models::{CoreError, EntryEventKind, GatePass, GatePassStatus, Gatar};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::repositories::{audit, entry, room_entry::RoomEntryRepository};

#[derive(sqlx::FromRow)]
struct GatePassRow {
    id: Uuid,
    customer_id: Uuid,
    entry_id: Uuid,
    family_member_id: Option<Uuid>,
    requested_quantity: i64,
    approved_quantity: Option<i64>,
    final_approved_quantity: Option<i64>,
    total_picked_up: i64,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    approval_expires_at: Option<DateTime<Utc>>,
    issued_by: Uuid,
    approved_by: Option<Uuid>,
}

fn parse_status(raw: &str) -> GatePassStatus {
    match raw {
        "pending" => GatePassStatus::Pending,
        "approved" => GatePassStatus::Approved,
        "partially_completed" => GatePassStatus::PartiallyCompleted,
        "completed" => GatePassStatus::Completed,
        "expired" => GatePassStatus::Expired,
        "rejected" => GatePassStatus::Rejected,
        other => panic!("unknown gate_pass_status in database: {other}"),
    }
}

fn status_label(status: GatePassStatus) -> &'static str {
    match status {
        GatePassStatus::Pending => "pending",
        GatePassStatus::Approved => "approved",
        GatePassStatus::PartiallyCompleted => "partially_completed",
        GatePassStatus::Completed => "completed",
        GatePassStatus::Expired => "expired",
        GatePassStatus::Rejected => "rejected",
    }
}

impl From<GatePassRow> for GatePass {
    fn from(row: GatePassRow) -> Self {
        GatePass {
            id: row.id,
            customer_id: row.customer_id,
            entry_id: row.entry_id,
            family_member_id: row.family_member_id,
            requested_quantity: row.requested_quantity,
            approved_quantity: row.approved_quantity,
            final_approved_quantity: row.final_approved_quantity,
            total_picked_up: row.total_picked_up,
            status: parse_status(&row.status),
            created_at: row.created_at,
            expires_at: row.expires_at,
            approval_expires_at: row.approval_expires_at,
            issued_by: row.issued_by,
            approved_by: row.approved_by,
        }
    }
}

const GATE_PASS_COLUMNS: &str = "id, customer_id, entry_id, family_member_id, requested_quantity, approved_quantity, \
     final_approved_quantity, total_picked_up, status::text, created_at, expires_at, approval_expires_at, issued_by, approved_by";

pub struct GatePassRepository {
    pool: PgPool,
    policy: GatePassPolicy,
}

impl GatePassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, policy: GatePassPolicy::default() }
    }

    pub fn with_policy(pool: PgPool, policy: GatePassPolicy) -> Self {
        Self { pool, policy }
    }

    /// Serialises all reservation arithmetic for `entry_id`. Must be the
    /// first statement of every gate-pass transaction (create, approve,
    /// record_pickup): with zero live gate passes, locking siblings alone
    /// locks nothing, and two concurrent creates would both read
    /// `committed=0` and both reserve the full `placed` amount.
    async fn lock_entry(tx: &mut Transaction<'_, Postgres>, entry_id: Uuid) -> Result<(), DbError> {
        sqlx::query("SELECT id FROM entries WHERE id = $1 FOR UPDATE").bind(entry_id).fetch_one(&mut **tx).await?;
        Ok(())
    }

    async fn live_siblings(tx: &mut Transaction<'_, Postgres>, entry_id: Uuid, exclude: Option<Uuid>) -> Result<Vec<GatePass>, DbError> {
        let rows: Vec<GatePassRow> = sqlx::query_as(&format!(
            "SELECT {GATE_PASS_COLUMNS} FROM gate_passes WHERE entry_id = $1 AND id IS DISTINCT FROM $2 FOR UPDATE"
        ))
        .bind(entry_id)
        .bind(exclude)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Issues a new `Pending` gate pass, validated against `placed(E)`
    /// and every live sibling pass for the entry — both loaded under
    /// lock in this transaction.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        entry_id: Uuid,
        customer_id: Uuid,
        family_member_id: Option<Uuid>,
        requested_quantity: i64,
        issued_by: Uuid,
    ) -> Result<GatePass, CoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        Self::lock_entry(&mut tx, entry_id).await.map_err(DbError::from)?;
        let placed = RoomEntryRepository::placed_for_entry_locked(&mut tx, entry_id).await.map_err(DbError::from)?;
        let siblings = Self::live_siblings(&mut tx, entry_id, None).await.map_err(DbError::from)?;
        let now = Utc::now();

        let pass = create_gate_pass(&self.policy, now, entry_id, customer_id, family_member_id, placed, &siblings, requested_quantity, issued_by)?;

        let row: GatePassRow = sqlx::query_as(&format!(
            "INSERT INTO gate_passes (id, customer_id, entry_id, family_member_id, requested_quantity, status, created_at, expires_at, issued_by)
             VALUES ($1, $2, $3, $4, $5, $6::gate_pass_status, $7, $8, $9)
             RETURNING {GATE_PASS_COLUMNS}"
        ))
        .bind(pass.id)
        .bind(pass.customer_id)
        .bind(pass.entry_id)
        .bind(pass.family_member_id)
        .bind(pass.requested_quantity)
        .bind(status_label(pass.status))
        .bind(pass.created_at)
        .bind(pass.expires_at)
        .bind(pass.issued_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let saved: GatePass = row.into();
        audit::log_gate_pass_change(&mut tx, saved.id, issued_by, None, Some(json!(&saved))).await.map_err(DbError::from)?;
        entry::insert_event(&mut tx, entry_id, EntryEventKind::GatePassIssued, json!({ "gate_pass_id": saved.id, "requested_quantity": requested_quantity }), issued_by)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(saved)
    }

    /// Approves a pending pass for `approved_quantity`, re-validating
    /// against the current locked snapshot (another pass may have been
    /// approved or picked up against the same entry since creation).
    #[instrument(skip(self))]
    pub async fn approve(&self, gate_pass_id: Uuid, approved_quantity: i64, approved_by: Uuid) -> Result<GatePass, CoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let entry_id: Uuid =
            sqlx::query_scalar("SELECT entry_id FROM gate_passes WHERE id = $1").bind(gate_pass_id).fetch_one(&mut *tx).await.map_err(DbError::from)?;
        Self::lock_entry(&mut tx, entry_id).await.map_err(DbError::from)?;

        let row: GatePassRow = sqlx::query_as(&format!("SELECT {GATE_PASS_COLUMNS} FROM gate_passes WHERE id = $1 FOR UPDATE"))
            .bind(gate_pass_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
        let pass: GatePass = row.into();

        let placed = RoomEntryRepository::placed_for_entry_locked(&mut tx, pass.entry_id).await.map_err(DbError::from)?;
        let siblings = Self::live_siblings(&mut tx, pass.entry_id, Some(pass.id)).await.map_err(DbError::from)?;
        let now = Utc::now();

        let approved = approve_gate_pass(&self.policy, now, &pass, placed, &siblings, approved_quantity, approved_by)?;

        let updated: GatePassRow = sqlx::query_as(&format!(
            "UPDATE gate_passes SET approved_quantity = $1, status = $2::gate_pass_status, approval_expires_at = $3, approved_by = $4
             WHERE id = $5 RETURNING {GATE_PASS_COLUMNS}"
        ))
        .bind(approved.approved_quantity)
        .bind(status_label(approved.status))
        .bind(approved.approval_expires_at)
        .bind(approved.approved_by)
        .bind(gate_pass_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let saved: GatePass = updated.into();
        audit::log_gate_pass_change(&mut tx, saved.id, approved_by, Some(json!(&pass)), Some(json!(&saved))).await.map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(saved)
    }

    /// Rejects a pending pass outright.
    #[instrument(skip(self))]
    pub async fn reject(&self, gate_pass_id: Uuid, actor_id: Uuid) -> Result<GatePass, CoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let row: GatePassRow = sqlx::query_as(&format!("SELECT {GATE_PASS_COLUMNS} FROM gate_passes WHERE id = $1 FOR UPDATE"))
            .bind(gate_pass_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
        let pass: GatePass = row.into();
        let rejected = coldstore_domain_gatepass::reject_gate_pass(&pass)?;

        let updated: GatePassRow = sqlx::query_as(&format!(
            "UPDATE gate_passes SET status = $1::gate_pass_status, final_approved_quantity = $2 WHERE id = $3 RETURNING {GATE_PASS_COLUMNS}"
        ))
        .bind(status_label(rejected.status))
        .bind(rejected.final_approved_quantity)
        .bind(gate_pass_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let saved: GatePass = updated.into();
        audit::log_gate_pass_change(&mut tx, saved.id, actor_id, Some(json!(&pass)), Some(json!(&saved))).await.map_err(DbError::from)?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(saved)
    }

    /// Records a pickup against an approved pass, drawing from the
    /// named (room, floor, gatar) breakdown. `gatar_breakdown` must sum
    /// to `quantity`.
    #[instrument(skip(self, gatar_breakdown))]
    #[allow(clippy::too_many_arguments)]
    pub async fn record_pickup(
        &self,
        gate_pass_id: Uuid,
        quantity: i64,
        source_room: &str,
        source_floor: i16,
        gatar_breakdown: Vec<(i32, i64)>,
        handled_by: Uuid,
    ) -> Result<GatePass, CoreError> {
        let breakdown_sum: i64 = gatar_breakdown.iter().map(|(_, q)| q).sum();
        if breakdown_sum != quantity {
            return Err(CoreError::Conflict {
                field: "gatar_breakdown",
                value: format!("sums to {breakdown_sum}, expected {quantity}"),
            });
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let entry_id: Uuid =
            sqlx::query_scalar("SELECT entry_id FROM gate_passes WHERE id = $1").bind(gate_pass_id).fetch_one(&mut *tx).await.map_err(DbError::from)?;
        Self::lock_entry(&mut tx, entry_id).await.map_err(DbError::from)?;

        let row: GatePassRow = sqlx::query_as(&format!("SELECT {GATE_PASS_COLUMNS} FROM gate_passes WHERE id = $1 FOR UPDATE"))
            .bind(gate_pass_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
        let pass: GatePass = row.into();
        let now = Utc::now();

        let mut locked_gatars: Vec<Gatar> = Vec::with_capacity(gatar_breakdown.len());
        for (gatar_number, requested) in &gatar_breakdown {
            let gatar = RoomEntryRepository::find_gatar_for_pickup(&mut tx, pass.entry_id, source_room, source_floor, *gatar_number, *requested).await?;
            locked_gatars.push(gatar);
        }

        let updated_pass = coldstore_domain_gatepass::apply_pickup(&pass, quantity, now)?;

        let pickup_row: (Uuid,) = sqlx::query_as(
            "INSERT INTO pickups (gate_pass_id, quantity, picked_up_at, handled_by, source_room, source_floor)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(gate_pass_id)
        .bind(quantity)
        .bind(now)
        .bind(handled_by)
        .bind(source_room)
        .bind(source_floor)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for ((gatar_number, picked), gatar) in gatar_breakdown.iter().zip(locked_gatars.iter()) {
            sqlx::query("INSERT INTO pickup_gatars (pickup_id, gatar_number, quantity) VALUES ($1, $2, $3)")
                .bind(pickup_row.0)
                .bind(gatar_number)
                .bind(picked)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;
            RoomEntryRepository::deduct_gatar(&mut tx, gatar.id, *picked).await.map_err(DbError::from)?;
        }

        let updated: GatePassRow = sqlx::query_as(&format!(
            "UPDATE gate_passes SET total_picked_up = $1, status = $2::gate_pass_status, final_approved_quantity = $3
             WHERE id = $4 RETURNING {GATE_PASS_COLUMNS}"
        ))
        .bind(updated_pass.total_picked_up)
        .bind(status_label(updated_pass.status))
        .bind(updated_pass.final_approved_quantity)
        .bind(gate_pass_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let saved: GatePass = updated.into();

        entry::insert_event(&mut tx, pass.entry_id, EntryEventKind::ItemsOut, json!({ "gate_pass_id": saved.id, "quantity": quantity }), handled_by)
            .await
            .map_err(DbError::from)?;

        // COMPLETED fires on physical(E) == 0, independent of this one
        // pass's own status — a pass can individually complete while
        // other stock from the same entry is still on the floor.
        let placed = RoomEntryRepository::placed_for_entry_locked(&mut tx, pass.entry_id).await.map_err(DbError::from)?;
        let all_passes = Self::live_siblings(&mut tx, pass.entry_id, None).await.map_err(DbError::from)?;
        if physical(placed, &all_passes) == 0 {
            entry::insert_event(&mut tx, pass.entry_id, EntryEventKind::Completed, json!({ "gate_pass_id": saved.id }), handled_by)
                .await
                .map_err(DbError::from)?;
        }

        audit::log_gate_pass_change(&mut tx, saved.id, handled_by, Some(json!(&pass)), Some(json!(&saved))).await.map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, gate_pass_id: Uuid) -> Result<GatePass, DbError> {
        let row: GatePassRow = sqlx::query_as(&format!("SELECT {GATE_PASS_COLUMNS} FROM gate_passes WHERE id = $1"))
            .bind(gate_pass_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    pub async fn list_for_entry(&self, entry_id: Uuid) -> Result<Vec<GatePass>, DbError> {
        let rows: Vec<GatePassRow> = sqlx::query_as(&format!("SELECT {GATE_PASS_COLUMNS} FROM gate_passes WHERE entry_id = $1 ORDER BY created_at"))
            .bind(entry_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Expires every pending pass past `expires_at` and every
    /// approved/partially-completed pass past `approval_expires_at`, in
    /// one atomic statement. `final_approved_quantity := total_picked_up`
    /// on the way out, matching `coldstore_domain_gatepass::expire`.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE gate_passes
             SET status = 'expired', final_approved_quantity = total_picked_up
             WHERE (status = 'pending' AND expires_at < $1)
                OR (status IN ('approved', 'partially_completed') AND approval_expires_at < $1)",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
