// [apps/gateway/src/middleware.rs]
/*!
 * APARATO: PERIMETER MIDDLEWARE (ESTRATO L3)
 * Dos guardias por request: `health_guard` rechaza todo menos la ruta
 * de restauración mientras el proceso esté en Setup Mode, y
 * `auth_guard` mintea el `AuthContext` que el núcleo solo consulta.
 * La identidad llega por cabeceras confiadas (el proxy de borde es
 * quien autentica); aquí solo se traduce rol -> bitset de permisos y se
 * inyecta como extensión de request.
 */

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coldstore_domain_models::{AuthContext, Permissions, Role};
use serde_json::json;
use uuid::Uuid;

use crate::state::AppState;

const HEADER_ACTOR_ID: &str = "x-actor-id";
const HEADER_ACTOR_ROLE: &str = "x-actor-role";
const HEADER_WORKER_TOKEN: &str = "x-worker-token";

fn default_permissions(role: Role) -> Permissions {
    match role {
        Role::Admin => Permissions::all(),
        Role::Accountant => Permissions::POST_LEDGER_ADJUSTMENT,
        Role::Employee => {
            Permissions::CREATE_ENTRY | Permissions::ASSIGN_ROOM | Permissions::ISSUE_GATE_PASS
        }
        Role::Guard => Permissions::RECORD_PICKUP,
        Role::Customer => Permissions::empty(),
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized", "message": message }))).into_response()
}

/// Rejects every request with an `x-actor-id`/`x-actor-role` pair that
/// doesn't parse, and internal daemons authenticate with a static
/// worker token instead of impersonating an actor.
pub async fn auth_guard(mut req: Request<Body>, next: Next) -> Response {
    if let Some(token) = req.headers().get(HEADER_WORKER_TOKEN) {
        if token.to_str().map(|t| !t.is_empty()).unwrap_or(false) {
            return next.run(req).await;
        }
    }

    let actor_id = match req.headers().get(HEADER_ACTOR_ID).and_then(|v| v.to_str().ok()).and_then(|v| Uuid::parse_str(v).ok()) {
        Some(id) => id,
        None => return unauthorized("missing or malformed x-actor-id"),
    };

    let role = match req.headers().get(HEADER_ACTOR_ROLE).and_then(|v| v.to_str().ok()) {
        Some("admin") => Role::Admin,
        Some("accountant") => Role::Accountant,
        Some("employee") => Role::Employee,
        Some("guard") => Role::Guard,
        Some("customer") => Role::Customer,
        _ => return unauthorized("missing or unrecognized x-actor-role"),
    };

    let auth = AuthContext { user_id: actor_id, role, permissions: default_permissions(role) };
    req.extensions_mut().insert(auth);

    next.run(req).await
}

/// Blocks every route except the restore endpoint while the gateway is
/// waiting on a database restore before it can serve real traffic.
pub async fn health_guard(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if req.uri().path().ends_with("/admin/restore") {
        return next.run(req).await;
    }

    match state.is_operational() {
        Ok(()) => next.run(req).await,
        Err(reason) => {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "setup_required", "message": reason }))).into_response()
        }
    }
}
