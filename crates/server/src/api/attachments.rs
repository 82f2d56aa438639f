use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use vitrine_core::{Status, UploadAttachmentResponse};

use super::AppState;
use super::context::call_context;
use super::frames::decode_ndjson;
use crate::error::ApiError;

/// `POST /v1/attachments` -- upload an attachment as a stream of frames.
///
/// The body is newline-delimited JSON: one `{"info": {...}}` frame followed
/// by any number of `{"chunk": "<base64>"}` frames. The response is sent
/// once the body ends.
#[utoipa::path(
    post,
    path = "/v1/attachments",
    tag = "Attachments",
    summary = "Upload attachment",
    request_body(content = String, content_type = "application/x-ndjson", description = "Info frame followed by chunk frames"),
    responses(
        (status = 200, description = "Attachment stored", body = UploadAttachmentResponse),
        (status = 400, description = "Bad framing, unknown record or attachment too large", body = Status),
        (status = 401, description = "Missing or invalid token", body = Status),
        (status = 403, description = "Caller is not an admin", body = Status)
    )
)]
pub async fn upload_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadAttachmentResponse>, ApiError> {
    let ctx = call_context(&state, &headers)?;
    let _guard = ctx.token().clone().drop_guard();
    let resp = state
        .catalog
        .upload_attachment(&ctx, decode_ndjson(body))
        .await?;
    Ok(Json(resp))
}
