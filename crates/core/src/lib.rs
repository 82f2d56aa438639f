pub mod access;
pub mod context;
pub mod filter;
pub mod messages;
pub mod rating;
pub mod record;
pub mod status;

pub use access::{Method, Role};
pub use context::{CallContext, Interrupt};
pub use filter::Filter;
pub use messages::{
    AttachmentInfo, CreateRecordRequest, CreateRecordResponse, LoginRequest, LoginResponse,
    RateRecordRequest, RateRecordResponse, ResponseFrame, SearchRecordsRequest,
    SearchRecordsResponse, UploadAttachmentResponse, UploadMessage,
};
pub use rating::Rating;
pub use record::{
    Display, Gpu, Keyboard, KeyboardLayout, Memory, MemoryUnit, Processor, Record, Resolution,
    Storage, StorageDriver, Weight,
};
pub use status::{Code, Status};

/// Maximum cumulative size of a single attachment upload (1 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 1 << 20;

/// Metadata key carrying the access token on guarded calls.
pub const AUTHORIZATION_METADATA_KEY: &str = "authorization";

/// Metadata key carrying an optional per-call timeout in milliseconds.
pub const TIMEOUT_METADATA_KEY: &str = "x-timeout-ms";
