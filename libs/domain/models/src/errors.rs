// [libs/domain/models/src/errors.rs]
/*!
 * =================================================================
 * APARATO: CORE ERROR CATALOG (ESTRATO L2)
 * CLASIFICACIÓN: DOMAIN ERROR TAXONOMY
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DEL NÚCLEO
 *
 * Cada variante lleva el contexto numérico o de estado necesario para
 * que un operador diagnostique sin necesidad de consultar los logs
 * (placed/committed/pickedUp/available en InsufficientStock, el estado
 * y la transición intentada en IllegalStateTransition).
 * =================================================================
 */

use uuid::Uuid;

/// Taxonomy of error kinds surfaced at the façade boundary. Infra-layer
/// errors (`DbError`, `StorageError`) map into this at the edge; nothing
/// downstream of the façade is allowed to swallow an error silently.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("entity not found: {kind} {id}")]
    NotFound { kind: &'static str, id: String },

    #[error(
            "insufficient stock for entry {entry_id}: placed={placed}, committed={committed}, picked_up={picked_up}, requested={requested}"
    )]
    InsufficientStock {
        entry_id: Uuid,
        placed: i64,
        committed: i64,
        picked_up: i64,
        requested: i64,
    },

    #[error(
            "pickup of {pickup_qty} exceeds remaining approved {remaining} for gate pass {gate_pass_id}"
    )]
    PickupExceedsApproved {
        gate_pass_id: Uuid,
        pickup_qty: i64,
        remaining: i64,
    },

    #[error("pickup window expired for gate pass {gate_pass_id} at {approval_expires_at}")]
    PickupWindowExpired {
        gate_pass_id: Uuid,
        approval_expires_at: chrono::DateTime<chrono::Utc>,
    },

    #[error("gatar shortfall: room={room}, floor={floor}, gatar={gatar} has {available} of {requested} requested")]
    GatarShortfall {
        room: String,
        floor: i16,
        gatar: i32,
        available: i64,
        requested: i64,
    },

    #[error("illegal state transition on {entity}: current={current_state}, attempted={attempted_transition}")]
    IllegalStateTransition {
        entity: &'static str,
        current_state: String,
        attempted_transition: &'static str,
    },

    #[error("conflict: {field} '{value}' already exists")]
    Conflict { field: &'static str, value: String },

    #[error("transient backend error talking to {backend}: {message}")]
    TransientBackendError { backend: String, message: String },

    #[error("permanent backend error talking to {backend} after exhausting retries: {message}")]
    PermanentBackendError { backend: String, message: String },

    #[error("authorization denied: role {role} lacks permission {permission}")]
    AuthorizationDenied { role: String, permission: String },

    #[error("no database endpoint reachable; restore flow required")]
    SetupRequired,
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound { kind, id: id.to_string() }
    }
}
