//! Client-streaming attachment upload.

use std::path::Path;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tokio_util::io::ReaderStream;
use tracing::debug;
use vitrine_core::{AttachmentInfo, Method, UploadAttachmentResponse, UploadMessage};

use crate::{Error, VitrineClient, error};

/// Bytes of attachment data carried by one chunk frame.
pub const CHUNK_SIZE: usize = 1024;

/// Encode one upload frame as a line of NDJSON.
fn encode(message: &UploadMessage) -> std::io::Result<Bytes> {
    let mut buf = serde_json::to_vec(message).map_err(std::io::Error::other)?;
    buf.push(b'\n');
    Ok(Bytes::from(buf))
}

/// Split `data` into chunk-sized slices without copying.
fn split_chunks(data: &Bytes) -> Vec<std::io::Result<Bytes>> {
    (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| Ok(data.slice(start..data.len().min(start + CHUNK_SIZE))))
        .collect()
}

impl VitrineClient {
    /// Upload `data` as an attachment of `record_id`. Requires the admin role.
    ///
    /// `content_type` is a MIME type (`image/png`) or an extension (`.jpg`).
    pub async fn upload_attachment(
        &self,
        record_id: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<UploadAttachmentResponse, Error> {
        self.upload_stream(record_id, content_type, stream::iter(split_chunks(&data)))
            .await
    }

    /// Upload the file at `path`, reading it in chunks. The file extension
    /// is sent as the content type.
    pub async fn upload_file(
        &self,
        record_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<UploadAttachmentResponse, Error> {
        let path = path.as_ref();
        let content_type = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            Error::Configuration(format!("cannot open {}: {e}", path.display()))
        })?;

        self.upload_stream(
            record_id,
            &content_type,
            ReaderStream::with_capacity(file, CHUNK_SIZE),
        )
        .await
    }

    /// Send the info frame, then one chunk frame per item of `chunks`.
    pub async fn upload_stream<S>(
        &self,
        record_id: &str,
        content_type: &str,
        chunks: S,
    ) -> Result<UploadAttachmentResponse, Error>
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        let info = UploadMessage::Info(AttachmentInfo {
            record_id: record_id.to_owned(),
            content_type: content_type.to_owned(),
        });
        let frames = stream::once(async move { encode(&info) }).chain(chunks.map(|chunk| {
            let chunk = chunk?;
            encode(&UploadMessage::Chunk(chunk))
        }));

        let response = self
            .request(Method::UploadAttachment, "/v1/attachments")
            .await
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(reqwest::Body::wrap_stream(frames))
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error::from_response(response).await);
        }
        let resp: UploadAttachmentResponse = response
            .json()
            .await
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        debug!(record_id, attachment_id = %resp.id, size = resp.size, "attachment uploaded");
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_newline_terminated_json() {
        let frame = encode(&UploadMessage::Chunk(Bytes::from_static(b"hi"))).unwrap();
        assert_eq!(&frame[..], b"{\"chunk\":\"aGk=\"}\n");
    }

    #[tokio::test]
    async fn chunks_split_at_chunk_size() {
        let data = Bytes::from(vec![7u8; CHUNK_SIZE * 2 + 10]);
        let frames: Vec<Bytes> = stream::iter(split_chunks(&data))
            .map(|chunk| encode(&UploadMessage::Chunk(chunk?)))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(frames.len(), 3);
        let lines: Vec<&[u8]> = frames.iter().map(|f| f.strip_suffix(b"\n").unwrap()).collect();
        let last: UploadMessage = serde_json::from_slice(lines[2]).unwrap();
        assert_eq!(last, UploadMessage::Chunk(Bytes::from(vec![7u8; 10])));
    }
}
