use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};
use tracing::{debug, warn};
use vitrine_core::{Method, Status};

use super::gate::AccessGate;
use crate::error::ApiError;

/// Tower layer that runs the [`AccessGate`] for one method before the
/// handler sees the request.
#[derive(Clone)]
pub struct AccessLayer {
    gate: Arc<AccessGate>,
    method: Method,
}

impl AccessLayer {
    pub fn new(gate: Arc<AccessGate>, method: Method) -> Self {
        Self { gate, method }
    }
}

impl<S> Layer<S> for AccessLayer {
    type Service = AccessMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessMiddleware {
            inner,
            gate: Arc::clone(&self.gate),
            method: self.method,
        }
    }
}

/// Tower service that authorizes requests for a single method.
#[derive(Clone)]
pub struct AccessMiddleware<S> {
    inner: S,
    gate: Arc<AccessGate>,
    method: Method,
}

impl<S> Service<Request<Body>> for AccessMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let method = self.method;
        let decision = self.gate.authorize(method, req.headers());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match decision {
                Ok(Some(caller)) => {
                    debug!(method = %method, user = %caller.username, role = %caller.role, "call authorized");
                    req.extensions_mut().insert(caller);
                    inner.call(req).await
                }
                Ok(None) => inner.call(req).await,
                Err(e) => {
                    warn!(method = %method, error = %e, "call rejected");
                    Ok(ApiError(Status::from(e)).into_response())
                }
            }
        })
    }
}
