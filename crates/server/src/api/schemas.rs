use serde::Serialize;
use utoipa::ToSchema;

/// Response body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of records currently stored.
    pub records: usize,
}
