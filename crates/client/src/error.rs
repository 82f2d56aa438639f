use thiserror::Error;
use vitrine_core::{Code, Status};

/// Errors returned by the Vitrine client.
#[derive(Debug, Error)]
pub enum Error {
    /// The server could not be reached or the connection broke mid-call.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with a non-success status and no parsable body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The call failed with a status reported by the service.
    #[error("{0}")]
    Api(Status),

    /// A response body or frame could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// The client was misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// The service status, when the call reached the service and failed there.
    pub fn status(&self) -> Option<&Status> {
        match self {
            Self::Api(status) => Some(status),
            _ => None,
        }
    }

    /// The status code, when the call failed inside the service.
    pub fn code(&self) -> Option<Code> {
        self.status().map(Status::code)
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Api(status) => matches!(status.code, Code::Internal | Code::DeadlineExceeded),
            Self::Deserialization(_) | Self::Configuration(_) => false,
        }
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Self::Api(status)
    }
}

/// Turn an unsuccessful response into an [`Error`], preferring the
/// `{"code", "message"}` body the service sends.
pub(crate) async fn from_response(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => match serde_json::from_str::<Status>(&body) {
            Ok(status) => Error::Api(status),
            Err(_) => Error::Http {
                status,
                message: body,
            },
        },
        Err(e) => Error::Connection(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_expose_their_code() {
        let err = Error::from(Status::permission_denied("no permission to access this RPC"));
        assert_eq!(err.code(), Some(Code::PermissionDenied));
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "permission_denied: no permission to access this RPC"
        );
    }

    #[test]
    fn transport_errors_are_retryable() {
        assert!(Error::Connection("refused".into()).is_retryable());
        assert!(
            Error::Http {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(Error::Connection("refused".into()).code().is_none());
    }
}
