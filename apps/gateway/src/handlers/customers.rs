// [apps/gateway/src/handlers/customers.rs]
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;
use coldstore_domain_models::{AuthContext, Permissions};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{require, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerPayload {
    pub phone: String,
    pub display_name: String,
    pub father_name: Option<String>,
    pub village: Option<String>,
}

pub async fn create_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::CREATE_ENTRY)?;
    let customer = state
        .customers
        .create(&payload.phone, &payload.display_name, payload.father_name.as_deref(), payload.village.as_deref(), auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.customers.get(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct FindByPhoneParams {
    pub phone: String,
}

pub async fn find_customer_by_phone(
    State(state): State<AppState>,
    Query(params): Query<FindByPhoneParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.customers.find_by_phone(&params.phone).await?))
}

pub async fn retire_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::MANAGE_STORAGE_ADMIN)?;
    Ok(Json(state.customers.retire(id, auth.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddFamilyMemberPayload {
    pub phone: String,
    pub display_name: String,
}

pub async fn add_family_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<AddFamilyMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::CREATE_ENTRY)?;
    let member = state.customers.add_family_member(customer_id, &payload.phone, &payload.display_name).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn list_family_members(State(state): State<AppState>, Path(customer_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.customers.list_family_members(customer_id).await?))
}
