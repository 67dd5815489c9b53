// [apps/gateway/src/handlers/gate_passes.rs]
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;
use coldstore_domain_models::{AuthContext, OperationMode, Permissions};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{require, require_mode, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGatePassPayload {
    pub entry_id: Uuid,
    pub customer_id: Uuid,
    pub family_member_id: Option<Uuid>,
    pub requested_quantity: i64,
}

pub async fn create_gate_pass(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateGatePassPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::ISSUE_GATE_PASS)?;
    require_mode(state.operation_mode(), OperationMode::Unloading, "create_gate_pass")?;
    let pass = state
        .gate_passes
        .create(payload.entry_id, payload.customer_id, payload.family_member_id, payload.requested_quantity, auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(pass)))
}

#[derive(Debug, Deserialize)]
pub struct ApproveGatePassPayload {
    pub approved_quantity: i64,
}

pub async fn approve_gate_pass(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveGatePassPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::APPROVE_GATE_PASS)?;
    require_mode(state.operation_mode(), OperationMode::Unloading, "approve_gate_pass")?;
    let pass = state.gate_passes.approve(id, payload.approved_quantity, auth.user_id).await?;
    Ok(Json(pass))
}

pub async fn reject_gate_pass(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::APPROVE_GATE_PASS)?;
    let pass = state.gate_passes.reject(id, auth.user_id).await?;
    Ok(Json(pass))
}

#[derive(Debug, Deserialize)]
pub struct RecordPickupPayload {
    pub quantity: i64,
    pub source_room: String,
    pub source_floor: i16,
    pub gatar_breakdown: Vec<(i32, i64)>,
}

pub async fn record_pickup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordPickupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::RECORD_PICKUP)?;
    require_mode(state.operation_mode(), OperationMode::Unloading, "record_pickup")?;
    let pass = state
        .gate_passes
        .record_pickup(id, payload.quantity, &payload.source_room, payload.source_floor, payload.gatar_breakdown, auth.user_id)
        .await?;
    Ok(Json(pass))
}

pub async fn get_gate_pass(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.gate_passes.get(id).await?))
}

pub async fn list_for_entry(State(state): State<AppState>, Path(entry_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.gate_passes.list_for_entry(entry_id).await?))
}
