use axum::Json;
use axum::extract::State;
use vitrine_core::{LoginRequest, LoginResponse, Status};

use super::AppState;
use crate::error::ApiError;

/// `POST /v1/auth/login` -- exchange a username and password for an access token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    summary = "Login",
    request_body(content = LoginRequest, description = "Login credentials"),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 404, description = "Incorrect username or password", body = Status)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    Ok(Json(state.auth.login(req).await?))
}
