// [apps/gateway/src/handlers/ledger.rs]
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;
use coldstore_domain_models::{AuthContext, Permissions};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{require, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordRentPaymentPayload {
    pub customer_id: Uuid,
    pub amount: Decimal,
}

pub async fn record_rent_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<RecordRentPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::POST_LEDGER_ADJUSTMENT)?;
    let payment = state.ledger.record_rent_payment(payload.customer_id, payload.amount, auth.user_id).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[derive(Debug, Deserialize)]
pub struct CreateDebtRequestPayload {
    pub customer_id: Uuid,
    pub reason: String,
}

pub async fn create_debt_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateDebtRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::POST_LEDGER_ADJUSTMENT)?;
    let request = state.ledger.create_debt_request(payload.customer_id, auth.user_id, payload.reason).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn approve_debt_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::POST_LEDGER_ADJUSTMENT)?;
    Ok(Json(state.ledger.approve_debt_request(id, auth.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct InsertAdjustmentPayload {
    pub customer_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: String,
}

pub async fn insert_adjustment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<InsertAdjustmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::POST_LEDGER_ADJUSTMENT)?;
    let entry = state.ledger.insert_adjustment(payload.customer_id, payload.debit, payload.credit, payload.description, auth.user_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_for_customer(State(state): State<AppState>, Path(customer_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.ledger.list_for_customer(customer_id).await?))
}

pub async fn current_balance(State(state): State<AppState>, Path(customer_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.ledger.current_balance(customer_id).await?))
}

pub async fn reconcile_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::MANAGE_STORAGE_ADMIN)?;
    Ok(Json(state.ledger.reconcile_customer(customer_id).await?))
}
