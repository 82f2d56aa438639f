use std::sync::Arc;

use axum::Extension;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::debug;
use vitrine_core::{RateRecordRequest, RateRecordResponse, Status};

use super::AppState;
use super::context::call_context;
use super::frames::{NDJSON_CONTENT_TYPE, decode_ndjson, ndjson_body};
use crate::auth::Caller;
use crate::error::ApiError;

/// `POST /v1/ratings` -- rate records over a bidirectional stream.
///
/// The request body is newline-delimited `{"record_id", "score"}` frames.
/// The response body streams one `{"result": {...}}` frame per score as soon
/// as it is applied; a failure ends the stream with a `{"status": {...}}`
/// frame.
#[utoipa::path(
    post,
    path = "/v1/ratings",
    tag = "Ratings",
    summary = "Rate records",
    request_body(content = RateRecordRequest, content_type = "application/x-ndjson", description = "Stream of scores"),
    responses(
        (status = 200, description = "Stream of updated ratings", content_type = "application/x-ndjson", body = RateRecordResponse),
        (status = 401, description = "Missing or invalid token", body = Status),
        (status = 403, description = "Role may not rate", body = Status)
    )
)]
pub async fn rate_record(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let ctx = call_context(&state, &headers)?;
    let (tx, rx) = mpsc::channel::<Result<RateRecordResponse, Status>>(16);

    let catalog = Arc::clone(&state.catalog);
    let call_ctx = ctx.clone();
    tokio::spawn(async move {
        let inbound = decode_ndjson::<RateRecordRequest>(body);
        if let Err(status) = catalog.rate_record(&call_ctx, inbound, tx.clone()).await {
            let _ = tx.send(Err(status)).await;
        }
        debug!(user = %caller.username, "rating stream finished");
    });

    let guard = ctx.token().clone().drop_guard();
    let mut response = ndjson_body(rx, guard).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(NDJSON_CONTENT_TYPE),
    );
    Ok(response)
}
