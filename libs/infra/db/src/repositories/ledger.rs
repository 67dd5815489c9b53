// [libs/infra/db/src/repositories/ledger.rs]
/*!
 * APARATO: LEDGER & BILLING REPOSITORY (ESTRATO L3)
 * Append-only by contract: no method here ever issues an `UPDATE`
 * against `ledger_entries`. Every insert locks the customer row first
 * (customers carries no balance column of its own — the row lock is
 * purely a mutex over "who gets to compute the next running_balance"),
 * reads the last `running_balance` in `serial_id` order, and projects
 * the new one via `coldstore-domain-ledger`.
 *
 * `insert_within_tx` is a free function so `room_entry` (automatic
 * storage-fee CHARGE) and other repositories can append a ledger row
 * inside a transaction they already own, without nesting a second
 * connection checkout.
 */

use chrono::{DateTime, NaiveDate, Utc};
use coldstore_domain_ledger::{project_all, reconcile, ReconciliationMismatch};
use coldstore_domain_models::ledger::format_receipt_number;
use coldstore_domain_models::{DebtRequest, DebtRequestStatus, LedgerEntry, LedgerEntryKind, RentPayment};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::repositories::audit;

#[derive(sqlx::FromRow)]
struct LedgerEntryRow {
    id: Uuid,
    customer_id: Uuid,
    kind: String,
    debit: Decimal,
    credit: Decimal,
    description: String,
    running_balance: Decimal,
    source_kind: String,
    source_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

fn parse_kind(raw: &str) -> LedgerEntryKind {
    match raw {
        "charge" => LedgerEntryKind::Charge,
        "payment" => LedgerEntryKind::Payment,
        "credit" => LedgerEntryKind::Credit,
        "refund" => LedgerEntryKind::Refund,
        "debt_approval" => LedgerEntryKind::DebtApproval,
        "adjustment" => LedgerEntryKind::Adjustment,
        other => panic!("unknown ledger_entry_kind in database: {other}"),
    }
}

fn kind_label(kind: LedgerEntryKind) -> &'static str {
    match kind {
        LedgerEntryKind::Charge => "charge",
        LedgerEntryKind::Payment => "payment",
        LedgerEntryKind::Credit => "credit",
        LedgerEntryKind::Refund => "refund",
        LedgerEntryKind::DebtApproval => "debt_approval",
        LedgerEntryKind::Adjustment => "adjustment",
    }
}

impl From<LedgerEntryRow> for LedgerEntry {
    fn from(row: LedgerEntryRow) -> Self {
        LedgerEntry {
            id: row.id,
            customer_id: row.customer_id,
            kind: parse_kind(&row.kind),
            debit: row.debit,
            credit: row.credit,
            description: row.description,
            running_balance: row.running_balance,
            source_kind: row.source_kind,
            source_id: row.source_id,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Appends one ledger row for `customer_id` inside a transaction the
/// caller already owns, locking the customer row first so two
/// concurrent appends can't both read the same "last" balance.
#[instrument(skip(tx, description))]
#[allow(clippy::too_many_arguments)]
pub async fn insert_within_tx(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: Uuid,
    kind: LedgerEntryKind,
    debit: Decimal,
    credit: Decimal,
    description: impl Into<String>,
    source_kind: &str,
    source_id: Uuid,
    created_by: Uuid,
) -> Result<LedgerEntry, DbError> {
    sqlx::query("SELECT id FROM customers WHERE id = $1 FOR UPDATE")
        .bind(customer_id)
        .fetch_one(&mut **tx)
        .await?;

    let previous: Option<(Decimal,)> = sqlx::query_as(
        "SELECT running_balance FROM ledger_entries WHERE customer_id = $1 ORDER BY serial_id DESC LIMIT 1",
    )
    .bind(customer_id)
    .fetch_optional(&mut **tx)
    .await?;

    let previous_balance = previous.map(|(balance,)| balance).unwrap_or(Decimal::ZERO);
    let running_balance = coldstore_domain_ledger::project_balance(previous_balance, debit, credit);

    let row: LedgerEntryRow = sqlx::query_as(
        "INSERT INTO ledger_entries (customer_id, kind, debit, credit, description, running_balance, source_kind, source_id, created_by)
         VALUES ($1, $2::ledger_entry_kind, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id, customer_id, kind::text, debit, credit, description, running_balance, source_kind, source_id, created_by, created_at",
    )
    .bind(customer_id)
    .bind(kind_label(kind))
    .bind(debit)
    .bind(credit)
    .bind(description.into())
    .bind(running_balance)
    .bind(source_kind)
    .bind(source_id)
    .bind(created_by)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row.into())
}

pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, description))]
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        customer_id: Uuid,
        kind: LedgerEntryKind,
        debit: Decimal,
        credit: Decimal,
        description: impl Into<String>,
        source_kind: &str,
        source_id: Uuid,
        created_by: Uuid,
    ) -> Result<LedgerEntry, DbError> {
        let mut tx = self.pool.begin().await?;
        let entry = insert_within_tx(&mut tx, customer_id, kind, debit, credit, description, source_kind, source_id, created_by).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Records a rent payment as a PAYMENT credit and mints its
    /// `RCP-YYYYMMDD-NNNN` receipt number from the per-day sequence.
    #[instrument(skip(self))]
    pub async fn record_rent_payment(&self, customer_id: Uuid, amount: Decimal, received_by: Uuid) -> Result<RentPayment, DbError> {
        let mut tx = self.pool.begin().await?;
        let today = Utc::now().date_naive();

        sqlx::query("INSERT INTO receipt_sequences (receipt_date, last_sequence) VALUES ($1, 0) ON CONFLICT DO NOTHING")
            .bind(today)
            .execute(&mut *tx)
            .await?;

        let (last_sequence,): (i32,) = sqlx::query_as("SELECT last_sequence FROM receipt_sequences WHERE receipt_date = $1 FOR UPDATE")
            .bind(today)
            .fetch_one(&mut *tx)
            .await?;
        let next_sequence = last_sequence + 1;

        sqlx::query("UPDATE receipt_sequences SET last_sequence = $1 WHERE receipt_date = $2")
            .bind(next_sequence)
            .bind(today)
            .execute(&mut *tx)
            .await?;

        let receipt_number = format_receipt_number(today, next_sequence as u32);
        let received_at = Utc::now();

        let row: (Uuid,) = sqlx::query_as(
            "INSERT INTO rent_payments (customer_id, receipt_number, amount, received_by, received_at)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(customer_id)
        .bind(&receipt_number)
        .bind(amount)
        .bind(received_by)
        .bind(received_at)
        .fetch_one(&mut *tx)
        .await?;

        insert_within_tx(
            &mut tx,
            customer_id,
            LedgerEntryKind::Payment,
            Decimal::ZERO,
            amount,
            format!("rent payment {receipt_number}"),
            "rent_payment",
            row.0,
            received_by,
        )
        .await?;

        tx.commit().await?;

        Ok(RentPayment {
            id: row.0,
            customer_id,
            receipt_number,
            amount,
            received_by,
            received_at,
        })
    }

    #[instrument(skip(self))]
    pub async fn create_debt_request(&self, customer_id: Uuid, requested_by: Uuid, reason: impl Into<String>) -> Result<DebtRequest, DbError> {
        let reason = reason.into();
        let row: (Uuid, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO debt_requests (customer_id, requested_by, reason) VALUES ($1, $2, $3) RETURNING id, created_at",
        )
        .bind(customer_id)
        .bind(requested_by)
        .bind(&reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(DebtRequest {
            id: row.0,
            customer_id,
            requested_by,
            reason,
            status: DebtRequestStatus::Pending,
            created_at: row.1,
            decided_at: None,
            decided_by: None,
        })
    }

    /// Approves a debt request: records the decision and writes a
    /// zero-amount `DEBT_APPROVAL` ledger row as the auditable marker
    /// that the customer may now run a negative balance for this reason.
    #[instrument(skip(self))]
    pub async fn approve_debt_request(&self, debt_request_id: Uuid, decided_by: Uuid) -> Result<DebtRequest, DbError> {
        let mut tx = self.pool.begin().await?;

        let row: (Uuid, Uuid, Uuid, String, DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
            "UPDATE debt_requests SET status = 'approved', decided_at = now(), decided_by = $1
             WHERE id = $2 RETURNING id, customer_id, requested_by, reason, created_at, decided_at",
        )
        .bind(decided_by)
        .bind(debt_request_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_within_tx(
            &mut tx,
            row.1,
            LedgerEntryKind::DebtApproval,
            Decimal::ZERO,
            Decimal::ZERO,
            format!("debt request {debt_request_id} approved"),
            "debt_request",
            debt_request_id,
            decided_by,
        )
        .await?;

        audit::log_admin_action_within_tx(&mut tx, "approve_debt_request", decided_by, Some(json!({ "debt_request_id": debt_request_id }))).await?;

        tx.commit().await?;

        Ok(DebtRequest {
            id: row.0,
            customer_id: row.1,
            requested_by: row.2,
            reason: row.3,
            status: DebtRequestStatus::Approved,
            created_at: row.4,
            decided_at: Some(row.5),
            decided_by: Some(decided_by),
        })
    }

    /// Admin-only manual correction. Writes the ledger row and an
    /// `admin_action_log` entry in the same transaction so every
    /// off-contract adjustment is independently auditable.
    #[instrument(skip(self, description))]
    pub async fn insert_adjustment(
        &self,
        customer_id: Uuid,
        debit: Decimal,
        credit: Decimal,
        description: impl Into<String>,
        actor_id: Uuid,
    ) -> Result<LedgerEntry, DbError> {
        let mut tx = self.pool.begin().await?;
        let description = description.into();

        let entry = insert_within_tx(
            &mut tx,
            customer_id,
            LedgerEntryKind::Adjustment,
            debit,
            credit,
            description.clone(),
            "manual_adjustment",
            customer_id,
            actor_id,
        )
        .await?;

        audit::log_admin_action_within_tx(&mut tx, "ledger_adjustment", actor_id, Some(json!({ "customer_id": customer_id, "description": description }))).await?;

        tx.commit().await?;
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<LedgerEntry>, DbError> {
        let rows: Vec<LedgerEntryRow> = sqlx::query_as(
            "SELECT id, customer_id, kind::text, debit, credit, description, running_balance, source_kind, source_id, created_by, created_at
             FROM ledger_entries WHERE customer_id = $1 ORDER BY serial_id",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Re-derives every stored `running_balance` from an opening
    /// balance of zero and reports any row that disagrees.
    #[instrument(skip(self))]
    pub async fn reconcile_customer(&self, customer_id: Uuid) -> Result<Vec<ReconciliationMismatch>, DbError> {
        let entries = self.list_for_customer(customer_id).await?;
        Ok(reconcile(Decimal::ZERO, &entries))
    }

    #[instrument(skip(self))]
    pub async fn current_balance(&self, customer_id: Uuid) -> Result<Decimal, DbError> {
        let entries = self.list_for_customer(customer_id).await?;
        Ok(project_all(Decimal::ZERO, &entries))
    }
}
