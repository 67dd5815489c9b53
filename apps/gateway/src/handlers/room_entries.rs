// [apps/gateway/src/handlers/room_entries.rs]
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;
use coldstore_domain_models::{AuthContext, OperationMode, Permissions};
use coldstore_infra_db::repositories::room_entry::GatarBreakdown;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{require, require_mode, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GatarBreakdownPayload {
    pub quantity: i64,
    pub quality_grade: Option<String>,
}

impl From<GatarBreakdownPayload> for GatarBreakdown {
    fn from(payload: GatarBreakdownPayload) -> Self {
        GatarBreakdown { quantity: payload.quantity, quality_grade: payload.quality_grade }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignRoomPayload {
    pub entry_id: Uuid,
    pub customer_id: Uuid,
    pub room: String,
    pub floor: i16,
    pub gatar_number: i32,
    pub quantity: i64,
    pub gatars: Vec<GatarBreakdownPayload>,
    pub storage_fee: Option<Decimal>,
}

pub async fn assign_room(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<AssignRoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::ASSIGN_ROOM)?;
    require_mode(state.operation_mode(), OperationMode::Loading, "assign_room")?;
    let gatars = payload.gatars.into_iter().map(Into::into).collect();
    let room_entry = state
        .room_entries
        .assign_room(
            payload.entry_id,
            payload.customer_id,
            &payload.room,
            payload.floor,
            payload.gatar_number,
            payload.quantity,
            gatars,
            payload.storage_fee,
            auth.user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(room_entry)))
}

pub async fn list_for_entry(State(state): State<AppState>, Path(entry_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.room_entries.list_for_entry(entry_id).await?))
}

pub async fn placed_for_entry(State(state): State<AppState>, Path(entry_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.room_entries.placed_for_entry(entry_id).await?))
}
