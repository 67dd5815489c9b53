// [apps/gateway/src/handlers/entries.rs]
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;
use coldstore_domain_models::{AuthContext, EntryCategory, Permissions};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{require, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEntryPayload {
    pub customer_id: Uuid,
    pub family_member_id: Option<Uuid>,
    pub category: EntryCategory,
    pub expected_quantity: i64,
    pub quarter: u8,
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::CREATE_ENTRY)?;
    let entry = state
        .entries
        .create(payload.customer_id, payload.family_member_id, payload.category, payload.expected_quantity, payload.quarter, auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_entry(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.entries.get(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct FindByThockParams {
    pub thock_number: String,
}

pub async fn find_entry_by_thock_number(
    State(state): State<AppState>,
    Query(params): Query<FindByThockParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.entries.find_by_thock_number(&params.thock_number).await?))
}

pub async fn list_entries_for_customer(State(state): State<AppState>, Path(customer_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.entries.list_by_customer(customer_id).await?))
}
