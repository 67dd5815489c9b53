// [apps/gateway/src/errors.rs]
/*!
 * APARATO: API ERROR FACADE (ESTRATO L3)
 * Traduce `CoreError` (y los dos errores de infraestructura que se le
 * suman en la frontera, `DbError`/`StorageError`) a una respuesta HTTP
 * uniforme. Los handlers nunca construyen `StatusCode` a mano: todos
 * devuelven `Result<T, ApiError>` y dejan que este módulo decida.
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coldstore_domain_models::{AuthContext, CoreError, OperationMode, Permissions};
use coldstore_infra_db::DbError;
use coldstore_infra_storage::StorageError;
use serde_json::json;
use tracing::error;

/// Every mutating handler calls this first. `AuthContext` only ever
/// arrives pre-minted by `auth_guard`; no handler inspects headers
/// itself.
pub fn require(auth: &AuthContext, permission: Permissions) -> Result<(), ApiError> {
    if auth.has(permission) {
        Ok(())
    } else {
        Err(ApiError(CoreError::AuthorizationDenied {
            role: format!("{:?}", auth.role),
            permission: format!("{permission:?}"),
        }))
    }
}

/// The operation-mode gate (spec §4.1): entry placement is accepted
/// only in Loading mode, gate-pass create/approve/pickup only in
/// Unloading mode. Policy, not an inventory invariant — enforced here
/// at the façade rather than inside the gate-pass/room-entry engines.
pub fn require_mode(current: OperationMode, expected: OperationMode, attempted: &'static str) -> Result<(), ApiError> {
    if current == expected {
        Ok(())
    } else {
        Err(ApiError(CoreError::IllegalStateTransition {
            entity: "OperationMode",
            current_state: format!("{current:?}"),
            attempted_transition: attempted,
        }))
    }
}

pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError(err.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            CoreError::InsufficientStock { .. } => (StatusCode::CONFLICT, "insufficient_stock"),
            CoreError::PickupExceedsApproved { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "pickup_exceeds_approved"),
            CoreError::PickupWindowExpired { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "pickup_window_expired"),
            CoreError::GatarShortfall { .. } => (StatusCode::CONFLICT, "gatar_shortfall"),
            CoreError::IllegalStateTransition { .. } => (StatusCode::CONFLICT, "illegal_state_transition"),
            CoreError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            CoreError::TransientBackendError { .. } => (StatusCode::SERVICE_UNAVAILABLE, "transient_backend_error"),
            CoreError::PermanentBackendError { .. } => (StatusCode::BAD_GATEWAY, "permanent_backend_error"),
            CoreError::AuthorizationDenied { .. } => (StatusCode::FORBIDDEN, "authorization_denied"),
            CoreError::SetupRequired => (StatusCode::SERVICE_UNAVAILABLE, "setup_required"),
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed with server error");
        }

        (status, Json(json!({ "error": code, "message": self.0.to_string() }))).into_response()
    }
}
