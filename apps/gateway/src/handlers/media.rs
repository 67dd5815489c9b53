// [apps/gateway/src/handlers/media.rs]
/*!
 * Upload writes the object to the local disk backend first (spec §5:
 * local is the always-present leg of the 3-2-1 triple) and registers a
 * pending `media_sync_records` row; the background sync coordinator
 * drives the NAS/cloud legs from there. Download always prefers local,
 * falling back through NAS then cloud.
 */

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Extension;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Datelike, Utc};
use coldstore_domain_models::media::{format_local_media_path, format_object_key};
use coldstore_domain_models::{AuthContext, MediaSourceKind, Permissions};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{require, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadMediaPayload {
    pub source_kind: MediaSourceKind,
    pub source_id: Uuid,
    pub thock_number: String,
    pub media_type: String,
    pub file_name: String,
    /// Base64-encoded file body. Kept JSON-friendly rather than
    /// multipart since every caller is an internal tablet/kiosk app.
    pub content_base64: String,
}

pub async fn upload_media(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UploadMediaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::ASSIGN_ROOM)?;

    let body = BASE64
        .decode(payload.content_base64.as_bytes())
        .map_err(|e| ApiError::from(coldstore_domain_models::CoreError::Conflict { field: "content_base64", value: e.to_string() }))?;

    let object_key = format_object_key(payload.source_kind, &payload.thock_number, &payload.media_type, &payload.file_name);
    let local_path = format_local_media_path(Utc::now().year(), &payload.thock_number, &payload.file_name);

    state.storage.local.upload(&local_path, body.clone()).await?;

    let asset_id = state
        .media
        .register_asset(payload.source_kind, payload.source_id, &payload.thock_number, &payload.media_type, &payload.file_name, auth.user_id)
        .await?;

    let record = state.media.enqueue(payload.source_kind, payload.source_id, &local_path, &object_key, body.len() as i64).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "asset_id": asset_id, "sync_record": record }))))
}

pub async fn download_media(State(state): State<AppState>, Path(key): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let body = state.storage.download_with_fallback(&key).await?;
    Ok(([(axum::http::header::CONTENT_TYPE, "application/octet-stream")], body))
}

pub async fn list_cloud_pending(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::MANAGE_STORAGE_ADMIN)?;
    Ok(Json(state.media.list_cloud_pending().await?))
}

pub async fn get_sync_record(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.media.get(id).await?))
}

/// Deletes an asset from all three backends explicitly. Deleting in
/// one backend never propagates on its own (spec §4.3); this is the
/// admin escape hatch that fans the delete out to local, NAS, and
/// cloud in one call.
pub async fn delete_asset_everywhere(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(asset_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::MANAGE_STORAGE_ADMIN)?;

    let asset = state.media.get_asset(asset_id).await?;
    let object_key = format_object_key(asset.source_kind, &asset.thock_number, &asset.media_type, &asset.file_name);
    let local_path = format_local_media_path(asset.uploaded_at.year(), &asset.thock_number, &asset.file_name);

    state.storage.local.delete(&local_path).await?;
    if let Some(nas) = &state.storage.nas {
        nas.delete(&object_key).await?;
    }
    state.storage.cloud.delete(&object_key).await?;

    state
        .audit
        .log_admin_action("delete_media_asset_everywhere", auth.user_id, Some(serde_json::json!({ "asset_id": asset_id, "object_key": object_key })))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Bulk-restore scan (b): every asset already marked `cloud_synced`
/// whose local copy is missing gets pulled back down NAS-then-cloud
/// (the admin-triggered half of the design's "Initial sync / bulk
/// restore" pair; scan (a) is `list_cloud_pending`).
pub async fn bulk_restore_missing_local(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    require(&auth, Permissions::MANAGE_STORAGE_ADMIN)?;

    let assets = state.media.list_cloud_synced_assets().await?;
    let mut restored = Vec::new();
    let mut still_missing = Vec::new();

    for asset in assets {
        let local_path = format_local_media_path(asset.uploaded_at.year(), &asset.thock_number, &asset.file_name);
        if state.storage.local.exists(&local_path).await.unwrap_or(false) {
            continue;
        }

        let object_key = format_object_key(asset.source_kind, &asset.thock_number, &asset.media_type, &asset.file_name);
        let body = match &state.storage.nas {
            Some(nas) => match nas.download(&object_key).await {
                Ok(body) => Some(body),
                Err(_) => state.storage.cloud.download(&object_key).await.ok(),
            },
            None => state.storage.cloud.download(&object_key).await.ok(),
        };

        match body {
            Some(body) => {
                state.storage.local.upload(&local_path, body).await?;
                restored.push(asset.id);
            }
            None => still_missing.push(asset.id),
        }
    }

    state
        .audit
        .log_admin_action("bulk_restore_missing_local", auth.user_id, Some(serde_json::json!({ "restored": restored.len(), "still_missing": still_missing.len() })))
        .await?;

    Ok(Json(serde_json::json!({ "restored": restored, "still_missing": still_missing })))
}
