//! Transport-agnostic RPC handlers.
//!
//! Handlers take a [`CallContext`] plus typed messages. Inbound streams are
//! any `Stream<Item = Result<T, Status>>`; outbound streams are
//! `mpsc::Sender<Result<T, Status>>`. The HTTP binding in [`crate::api`] is
//! one adapter over these.

mod auth;
mod catalog;

use futures::{Stream, StreamExt};
use vitrine_core::{CallContext, Status};

pub use auth::AuthService;
pub use catalog::CatalogService;

/// Wait for the next inbound message, giving up as soon as the call is
/// canceled or its deadline elapses.
///
/// `Ok(None)` means the client closed its side of the stream.
pub(crate) async fn receive<S, T>(ctx: &CallContext, inbound: &mut S) -> Result<Option<T>, Status>
where
    S: Stream<Item = Result<T, Status>> + Unpin,
{
    ctx.check()?;
    tokio::select! {
        biased;
        interrupt = ctx.done() => Err(interrupt.into()),
        message = inbound.next() => message.transpose(),
    }
}
