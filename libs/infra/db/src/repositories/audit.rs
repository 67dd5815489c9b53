// [libs/infra/db/src/repositories/audit.rs]
/*!
 * APARATO: AUDIT / EDIT-LOG REPOSITORY (ESTRATO L3)
 * Every mutation of customer, entry, room-entry, gate-pass, and user
 * writes an immutable row into its own `*_edit_logs` table (spec
 * §4.6). Table names can't be bound as query parameters, so each
 * table gets its own explicit method rather than one generic query —
 * the shape (row_id, actor_id, old_value, new_value) is identical.
 */

use chrono::{DateTime, Utc};
use coldstore_domain_models::EditLogEntry;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;

pub struct AuditRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct EditLogRow {
    id: Uuid,
    row_id: Uuid,
    actor_id: Uuid,
    old_value: Option<Value>,
    new_value: Option<Value>,
    created_at: DateTime<Utc>,
}

fn into_entry(row: EditLogRow, table_name: &'static str) -> EditLogEntry {
    EditLogEntry {
        id: row.id,
        table_name,
        row_id: row.row_id,
        actor_id: row.actor_id,
        old_value: row.old_value,
        new_value: row.new_value,
        created_at: row.created_at,
    }
}

macro_rules! edit_log_table {
    ($insert_fn:ident, $list_fn:ident, $table:literal) => {
        #[instrument(skip(tx, old_value, new_value))]
        pub async fn $insert_fn(
            tx: &mut Transaction<'_, Postgres>,
            row_id: Uuid,
            actor_id: Uuid,
            old_value: Option<Value>,
            new_value: Option<Value>,
        ) -> Result<(), DbError> {
            sqlx::query(concat!("INSERT INTO ", $table, " (row_id, actor_id, old_value, new_value) VALUES ($1, $2, $3, $4)"))
                .bind(row_id)
                .bind(actor_id)
                .bind(old_value)
                .bind(new_value)
                .execute(&mut **tx)
                .await?;
            Ok(())
        }

        impl AuditRepository {
            #[instrument(skip(self))]
            pub async fn $list_fn(&self, row_id: Uuid) -> Result<Vec<EditLogEntry>, DbError> {
                let rows: Vec<EditLogRow> = sqlx::query_as(concat!(
                    "SELECT id, row_id, actor_id, old_value, new_value, created_at FROM ",
                    $table,
                    " WHERE row_id = $1 ORDER BY created_at"
                ))
                .bind(row_id)
                .fetch_all(&self.pool)
                .await?;
                Ok(rows.into_iter().map(|r| into_entry(r, $table)).collect())
            }
        }
    };
}

edit_log_table!(log_customer_change, list_customer_changes, "customer_edit_logs");
edit_log_table!(log_entry_change, list_entry_changes, "entry_edit_logs");
edit_log_table!(log_room_entry_change, list_room_entry_changes, "room_entry_edit_logs");
edit_log_table!(log_gate_pass_change, list_gate_pass_changes, "gate_pass_edit_logs");
edit_log_table!(log_user_change, list_user_changes, "user_edit_logs");

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The generic admin-action log referenced by the restore driver
    /// (§4.5: "records the operation in the admin-action log") and by
    /// the media fan-out delete / bulk-restore admin operations.
    #[instrument(skip(self, detail))]
    pub async fn log_admin_action(&self, action: &str, actor_id: Uuid, detail: Option<Value>) -> Result<(), DbError> {
        sqlx::query("INSERT INTO admin_action_log (action, actor_id, detail) VALUES ($1, $2, $3)")
            .bind(action)
            .bind(actor_id)
            .bind(detail)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Same as [`AuditRepository::log_admin_action`], inside a transaction
/// the caller already owns (the ledger adjustment and debt-approval
/// paths write this alongside their ledger row, atomically).
#[instrument(skip(tx, detail))]
pub async fn log_admin_action_within_tx(
    tx: &mut Transaction<'_, Postgres>,
    action: &str,
    actor_id: Uuid,
    detail: Option<Value>,
) -> Result<(), DbError> {
    sqlx::query("INSERT INTO admin_action_log (action, actor_id, detail) VALUES ($1, $2, $3)")
        .bind(action)
        .bind(actor_id)
        .bind(detail)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
