use std::time::Duration;

use axum::http::HeaderMap;
use vitrine_core::{CallContext, Status, TIMEOUT_METADATA_KEY};

use super::AppState;

/// Build the context for one call: a child of the server's shutdown token,
/// bounded by the optional `x-timeout-ms` header.
pub fn call_context(state: &AppState, headers: &HeaderMap) -> Result<CallContext, Status> {
    let ctx = CallContext::with_token(state.shutdown.child_token());
    let Some(value) = headers.get(TIMEOUT_METADATA_KEY) else {
        return Ok(ctx);
    };

    let millis = value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            Status::invalid_argument(format!(
                "{TIMEOUT_METADATA_KEY} must be a whole number of milliseconds"
            ))
        })?;
    Ok(ctx.with_timeout(Duration::from_millis(millis)))
}
