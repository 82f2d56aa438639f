use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use tracing::debug;
use vitrine_core::{CreateRecordRequest, CreateRecordResponse, Status};

use super::AppState;
use super::context::call_context;
use crate::auth::Caller;
use crate::error::ApiError;

/// `POST /v1/records` -- store a new catalog record.
#[utoipa::path(
    post,
    path = "/v1/records",
    tag = "Records",
    summary = "Create record",
    description = "Store a record. An empty ID is replaced by a generated UUID.",
    request_body(content = CreateRecordRequest, description = "Record to store"),
    responses(
        (status = 200, description = "Record stored", body = CreateRecordResponse),
        (status = 400, description = "Malformed record ID", body = Status),
        (status = 401, description = "Missing or invalid token", body = Status),
        (status = 403, description = "Caller is not an admin", body = Status),
        (status = 409, description = "Record ID already exists", body = Status)
    )
)]
pub async fn create_record(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    headers: HeaderMap,
    Json(req): Json<CreateRecordRequest>,
) -> Result<Json<CreateRecordResponse>, ApiError> {
    let ctx = call_context(&state, &headers)?;
    debug!(user = %caller.username, "create record");
    Ok(Json(state.catalog.create_record(&ctx, req).await?))
}
