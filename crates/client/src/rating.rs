//! Bidirectional rating session.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};
use vitrine_core::{Method, RateRecordRequest, RateRecordResponse, ResponseFrame};

use crate::{Error, VitrineClient, error};

type ResponseStream = Pin<Box<dyn Stream<Item = Result<RateRecordResponse, Error>> + Send>>;

/// An open `RateRecord` call.
///
/// Scores go out through [`send`](Self::send); the updated rating for each
/// one comes back through the [`Stream`] impl, in order. Call
/// [`close_send`](Self::close_send) once every score is sent; the response
/// stream ends after the server has answered them all. A failure ends the
/// stream with one [`Error`].
pub struct RatingSession {
    requests: Option<mpsc::Sender<RateRecordRequest>>,
    responses: ResponseStream,
}

impl RatingSession {
    /// Send one score.
    pub async fn send(&self, record_id: impl Into<String>, score: f64) -> Result<(), Error> {
        let Some(requests) = &self.requests else {
            return Err(Error::Configuration("rating session is closed for sending".into()));
        };
        requests
            .send(RateRecordRequest {
                record_id: record_id.into(),
                score,
            })
            .await
            .map_err(|_| Error::Connection("rating stream closed".into()))
    }

    /// A handle for sending from another task.
    pub fn sender(&self) -> Option<mpsc::Sender<RateRecordRequest>> {
        self.requests.clone()
    }

    /// Half-close: no more scores will be sent.
    pub fn close_send(&mut self) {
        self.requests = None;
    }
}

impl Stream for RatingSession {
    type Item = Result<RateRecordResponse, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.responses.as_mut().poll_next(cx)
    }
}

fn encode(req: &RateRecordRequest) -> std::io::Result<Bytes> {
    let mut buf = serde_json::to_vec(req).map_err(std::io::Error::other)?;
    buf.push(b'\n');
    Ok(Bytes::from(buf))
}

fn failed(err: Error) -> ResponseStream {
    Box::pin(stream::iter([Err(err)]))
}

/// Decode NDJSON response frames. The first status frame ends the stream.
fn response_frames(response: reqwest::Response) -> ResponseStream {
    let reader = StreamReader::new(
        response
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other)),
    );
    let lines = tokio::io::BufReader::new(reader).lines();

    Box::pin(stream::unfold(Some(lines), |lines| async move {
        let mut lines = lines?;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    return match serde_json::from_str::<ResponseFrame<RateRecordResponse>>(&line) {
                        Ok(ResponseFrame::Result(resp)) => Some((Ok(resp), Some(lines))),
                        Ok(ResponseFrame::Status(status)) => Some((Err(Error::Api(status)), None)),
                        Err(e) => Some((
                            Err(Error::Deserialization(format!("bad rating frame: {e}"))),
                            None,
                        )),
                    };
                }
                Ok(None) => return None,
                Err(e) => {
                    return Some((
                        Err(Error::Connection(format!("rating stream error: {e}"))),
                        None,
                    ));
                }
            }
        }
    }))
}

impl VitrineClient {
    /// Open a `RateRecord` session. Requires the admin or user role.
    ///
    /// The request is sent in the background; an authentication failure
    /// surfaces as the first item of the response stream.
    pub async fn open_rating_session(&self) -> RatingSession {
        let (tx, rx) = mpsc::channel::<RateRecordRequest>(16);
        let body = ReceiverStream::new(rx).map(|req| encode(&req));

        let pending = self
            .request(Method::RateRecord, "/v1/ratings")
            .await
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(reqwest::Body::wrap_stream(body))
            .send();
        // Sending runs on its own task so scores flow before anyone reads.
        let call = tokio::spawn(pending);

        let responses = stream::once(async move {
            let response = match call.await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => return failed(Error::Connection(e.to_string())),
                Err(e) => {
                    return failed(Error::Connection(format!("rating call task failed: {e}")));
                }
            };
            if !response.status().is_success() {
                return failed(error::from_response(response).await);
            }
            response_frames(response)
        })
        .flatten();

        RatingSession {
            requests: Some(tx),
            responses: Box::pin(responses),
        }
    }

    /// Rate several records in one session and collect the updated ratings.
    ///
    /// Scores are sent from a separate task while responses are read, and
    /// the two are joined before returning.
    pub async fn rate_records(
        &self,
        scores: Vec<(String, f64)>,
    ) -> Result<Vec<RateRecordResponse>, Error> {
        let mut session = self.open_rating_session().await;
        let Some(sender) = session.sender() else {
            return Ok(Vec::new());
        };
        session.close_send();

        let send_task = tokio::spawn(async move {
            for (record_id, score) in scores {
                if sender
                    .send(RateRecordRequest { record_id, score })
                    .await
                    .is_err()
                {
                    warn!("rating stream closed before every score was sent");
                    break;
                }
            }
        });

        let mut results = Vec::new();
        let mut failure = None;
        while let Some(item) = session.next().await {
            match item {
                Ok(resp) => {
                    debug!(
                        record_id = %resp.record_id,
                        rated_count = resp.rated_count,
                        average_score = resp.average_score,
                        "record rated"
                    );
                    results.push(resp);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(session);

        if let Err(e) = send_task.await {
            warn!(error = %e, "rating send task failed");
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}
