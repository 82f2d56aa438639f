use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use vitrine_core::{SearchRecordsRequest, SearchRecordsResponse, Status};

use super::AppState;
use super::context::call_context;
use crate::error::ApiError;

/// SSE event name for a matching record.
pub const RECORD_EVENT: &str = "record";
/// SSE event name for the terminal status of a failed search.
pub const STATUS_EVENT: &str = "status";

/// `POST /v1/records/search` -- stream matching records as Server-Sent Events.
///
/// Each match is sent as a `record` event. A search that fails after the
/// stream has started ends with a single `status` event.
#[utoipa::path(
    post,
    path = "/v1/records/search",
    tag = "Records",
    summary = "Search records",
    request_body(content = SearchRecordsRequest, description = "Search filter"),
    responses(
        (status = 200, description = "Stream of `record` events", content_type = "text/event-stream", body = SearchRecordsResponse)
    )
)]
pub async fn search_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SearchRecordsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ctx = call_context(&state, &headers)?;
    let (tx, rx) = mpsc::channel(16);

    let catalog = Arc::clone(&state.catalog);
    let call_ctx = ctx.clone();
    tokio::spawn(async move {
        if let Err(status) = catalog.search_records(&call_ctx, req, tx.clone()).await {
            let _ = tx.send(Err(status)).await;
        }
    });

    let guard = ctx.token().clone().drop_guard();
    Ok(Sse::new(event_stream(rx, guard)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}

fn event_stream(
    rx: mpsc::Receiver<Result<SearchRecordsResponse, Status>>,
    guard: tokio_util::sync::DropGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    ReceiverStream::new(rx).filter_map(move |item| {
        let _ = &guard;
        let event = match &item {
            Ok(resp) => Event::default().event(RECORD_EVENT).json_data(resp),
            Err(status) => Event::default().event(STATUS_EVENT).json_data(status),
        };
        match event {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!(error = %e, "failed to serialize search event");
                None
            }
        }
    })
}
