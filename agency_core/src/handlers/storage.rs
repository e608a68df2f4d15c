//! Signed-URL object storage endpoints

use crate::{
    error::{AppError, Result},
    extractors::ApiJson,
    models::ApiResponse,
    storage::UploadUrlRequest,
    AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub token: String,
}

pub async fn create_upload_url(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadUrlRequest>,
) -> Result<impl IntoResponse> {
    info!(
        "POST /api/admin/storage/upload-url - {} ({} bytes)",
        request.content_type, request.size
    );

    let issued = state.storage.create_upload_url(&request)?;
    Ok(Json(ApiResponse::success(issued)))
}

pub async fn upload_object(
    State(state): State<AppState>,
    Query(query): Query<SignedQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type header".to_string()))?;

    let stored = state.storage.put_object(&query.token, content_type, &body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}

pub async fn download_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<impl IntoResponse> {
    let object = state
        .storage
        .read_object(key.trim_start_matches('/'), &query.token)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, "private, max-age=300".to_string()),
        ],
        object.bytes,
    ))
}

/// Public image path: redirects to a short-lived signed download URL.
pub async fn image_redirect(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse> {
    let key = key.trim_start_matches('/');

    match state.storage.signed_download_url(key).await? {
        Some(url) => Ok(Redirect::temporary(&url)),
        None => {
            debug!(key = %key, "Image not found");
            Err(AppError::NotFound("Image not found".to_string()))
        }
    }
}
