pub mod attachments;
pub mod auth;
pub mod context;
pub mod frames;
pub mod health;
pub mod openapi;
pub mod ratings;
pub mod records;
pub mod schemas;
pub mod search;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vitrine_core::Method;

use crate::auth::{AccessGate, AccessLayer};
use crate::service::{AuthService, CatalogService};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Catalog method handlers.
    pub catalog: Arc<CatalogService>,
    /// Login handler.
    pub auth: Arc<AuthService>,
    /// Per-method access control.
    pub gate: Arc<AccessGate>,
    /// Cancelled on shutdown; every call context is a child of it.
    pub shutdown: CancellationToken,
}

/// Build the Axum router with all API routes and middleware.
///
/// Every method route carries its own [`AccessLayer`], so authorization runs
/// once before the handler for unary and streaming methods alike.
pub fn router(state: AppState) -> Router {
    let gate = Arc::clone(&state.gate);
    let guard = move |method: Method| AccessLayer::new(Arc::clone(&gate), method);

    Router::new()
        .route("/health", get(health::health))
        .route("/api-doc/openapi.json", get(openapi::openapi_json))
        .route(
            "/v1/auth/login",
            post(auth::login).layer(guard(Method::Login)),
        )
        .route(
            "/v1/records",
            post(records::create_record).layer(guard(Method::CreateRecord)),
        )
        .route(
            "/v1/records/search",
            post(search::search_records).layer(guard(Method::SearchRecords)),
        )
        .route(
            "/v1/attachments",
            post(attachments::upload_attachment).layer(guard(Method::UploadAttachment)),
        )
        .route(
            "/v1/ratings",
            post(ratings::rate_record).layer(guard(Method::RateRecord)),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
