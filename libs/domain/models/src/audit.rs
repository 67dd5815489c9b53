// [libs/domain/models/src/audit.rs]
/*!
 * APARATO: AUDIT, EVENTS & TRASH DOMAIN MODELS (ESTRATO L2)
 * Immutable edit logs, per-entry event stream, and the generic trash
 * row shape backing `move_to_trash` / `restore_from_trash`.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryEventKind {
    Created,
    RoomAssigned,
    GatePassIssued,
    ItemsOut,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryEvent {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub kind: EntryEventKind,
    pub payload: serde_json::Value,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Backs every `*_edit_logs` table (customer, entry, room_entry,
/// gate_pass, user) — one generic shape, one table name per source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditLogEntry {
    pub id: Uuid,
    pub table_name: &'static str,
    pub row_id: Uuid,
    pub actor_id: Uuid,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Backs `trash_bin`. `payload` materialises the row and its owned
/// children as JSON at the moment of soft-delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashRecord {
    pub id: Uuid,
    pub source_table: &'static str,
    pub source_id: Uuid,
    pub payload: serde_json::Value,
    pub deleted_by: Uuid,
    pub deleted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub restored_at: Option<DateTime<Utc>>,
}

/// Retention window for soft-deleted rows (the design: 30 days).
pub const TRASH_RETENTION: chrono::Duration = chrono::Duration::days(30);

/// Drives the change-gated backup optimisation of the design — one row
/// per watched table, updated by statement-level triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableChangeWatermark {
    pub table_name: &'static str,
    pub last_modified: DateTime<Utc>,
}

/// One colour per date, assigned by a guard role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenColor {
    pub date: chrono::NaiveDate,
    pub color: String,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
}
