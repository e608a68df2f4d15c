//! Public contact form and the admin inbox

use crate::{
    contacts::{
        ContactListQuery, ContactSubmittedResponse, CreateContactRequest, MarkReadRequest,
        UpdateStatusRequest,
    },
    error::Result,
    extractors::ApiJson,
    models::{ApiResponse, CountResponse},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

pub async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateContactRequest>,
) -> Result<impl IntoResponse> {
    info!("POST /api/contact");

    let submission = state.contacts.submit(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ContactSubmittedResponse {
            message: "Thank you for reaching out. We will get back to you soon.".to_string(),
            submission,
        }),
    ))
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ContactListQuery>,
) -> Result<impl IntoResponse> {
    let submissions = state.contacts.list(&query).await?;
    Ok(Json(ApiResponse::success(submissions)))
}

pub async fn unread_count(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let count = state.contacts.unread_count().await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let submission = state.contacts.get(id).await?;
    Ok(Json(ApiResponse::success(submission)))
}

pub async fn update_contact_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    info!("PATCH /api/admin/contacts/{}/status - {}", id, request.status);

    let submission = state.contacts.update_status(id, request.status).await?;
    Ok(Json(ApiResponse::success(submission)))
}

pub async fn mark_contact_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<MarkReadRequest>,
) -> Result<impl IntoResponse> {
    let submission = state.contacts.set_read(id, request.is_read).await?;
    Ok(Json(ApiResponse::success(submission)))
}
