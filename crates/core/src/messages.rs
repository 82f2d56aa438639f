//! Request and response messages for every RPC method.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::record::Record;
use crate::status::Status;

/// `Login` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `Login` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginResponse {
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// `CreateRecord` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateRecordRequest {
    pub record: Record,
}

/// `CreateRecord` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateRecordResponse {
    pub id: String,
}

/// `SearchRecords` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchRecordsRequest {
    #[serde(default)]
    pub filter: Filter,
}

/// One message of the `SearchRecords` response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchRecordsResponse {
    pub record: Record,
}

/// Header message of an attachment upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttachmentInfo {
    /// Record the attachment belongs to.
    pub record_id: String,
    /// Content type, either a MIME type (`image/png`) or an extension (`.jpg`).
    pub content_type: String,
}

/// One inbound message of the `UploadAttachment` stream.
///
/// The first message must be [`UploadMessage::Info`]; every following one
/// must be [`UploadMessage::Chunk`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMessage {
    Info(AttachmentInfo),
    Chunk(#[serde(with = "base64_bytes")] Bytes),
}

/// `UploadAttachment` response, sent once the client closes its stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadAttachmentResponse {
    /// Generated attachment ID.
    pub id: String,
    /// Total number of bytes received.
    pub size: u32,
}

/// One inbound message of the `RateRecord` stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RateRecordRequest {
    pub record_id: String,
    pub score: f64,
}

/// One outbound message of the `RateRecord` stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RateRecordResponse {
    pub record_id: String,
    pub rated_count: u32,
    pub average_score: f64,
}

/// One outbound frame of a streamed response: either a message or the
/// terminal status that ends the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFrame<T> {
    Result(T),
    Status(Status),
}

impl<T> From<Result<T, Status>> for ResponseFrame<T> {
    fn from(result: Result<T, Status>) -> Self {
        match result {
            Ok(message) => Self::Result(message),
            Err(status) => Self::Status(status),
        }
    }
}

impl<T> From<ResponseFrame<T>> for Result<T, Status> {
    fn from(frame: ResponseFrame<T>) -> Self {
        match frame {
            ResponseFrame::Result(message) => Ok(message),
            ResponseFrame::Status(status) => Err(status),
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as B64;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&B64.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        B64.decode(encoded)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_frames_use_tagged_json() {
        let info = UploadMessage::Info(AttachmentInfo {
            record_id: "abc".into(),
            content_type: "image/png".into(),
        });
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(
            json,
            r#"{"info":{"record_id":"abc","content_type":"image/png"}}"#
        );

        let chunk: UploadMessage = serde_json::from_str(r#"{"chunk":"aGVsbG8="}"#).unwrap();
        assert_eq!(chunk, UploadMessage::Chunk(Bytes::from_static(b"hello")));
    }

    #[test]
    fn response_frames_wrap_results_and_statuses() {
        let ok: ResponseFrame<RateRecordResponse> = Ok(RateRecordResponse {
            record_id: "r".into(),
            rated_count: 2,
            average_score: 4.5,
        })
        .into();
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["result"]["rated_count"], 2);

        let err: ResponseFrame<RateRecordResponse> =
            Err(Status::invalid_argument("record r doesn't exist")).into();
        let json = serde_json::to_string(&err).unwrap();
        let back: ResponseFrame<RateRecordResponse> = serde_json::from_str(&json).unwrap();
        let result: Result<RateRecordResponse, Status> = back.into();
        assert_eq!(result.unwrap_err().code, crate::status::Code::InvalidArgument);
    }

    #[test]
    fn invalid_base64_chunk_is_rejected() {
        let result = serde_json::from_str::<UploadMessage>(r#"{"chunk":"not base64!"}"#);
        assert!(result.is_err());
    }
}
