#![allow(clippy::needless_for_each)]

use axum::Json;
use utoipa::OpenApi;
use vitrine_core::{
    AttachmentInfo, Code, CreateRecordRequest, CreateRecordResponse, Display, Filter, Gpu,
    Keyboard, KeyboardLayout, LoginRequest, LoginResponse, Memory, MemoryUnit, Processor,
    RateRecordRequest, RateRecordResponse, Record, Resolution, SearchRecordsRequest,
    SearchRecordsResponse, Status, Storage, StorageDriver, UploadAttachmentResponse, Weight,
};

use super::schemas::HealthResponse;

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Vitrine Catalog API",
        version = "0.1.0",
        description = "HTTP binding of the Vitrine catalog service. Create, search, rate and attach images to catalog records.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "Login and token issuance"),
        (name = "Records", description = "Record creation and search"),
        (name = "Attachments", description = "Streaming attachment upload"),
        (name = "Ratings", description = "Bidirectional rating stream")
    ),
    paths(
        super::health::health,
        super::auth::login,
        super::records::create_record,
        super::search::search_records,
        super::attachments::upload_attachment,
        super::ratings::rate_record,
    ),
    components(schemas(
        HealthResponse, Status, Code,
        LoginRequest, LoginResponse,
        Record, Processor, Memory, MemoryUnit, Gpu, Storage, StorageDriver, Display,
        Resolution, Keyboard, KeyboardLayout, Weight,
        CreateRecordRequest, CreateRecordResponse,
        Filter, SearchRecordsRequest, SearchRecordsResponse,
        AttachmentInfo, UploadAttachmentResponse,
        RateRecordRequest, RateRecordResponse,
    ))
)]
pub struct ApiDoc;

/// `GET /api-doc/openapi.json` -- the OpenAPI document for this API.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
