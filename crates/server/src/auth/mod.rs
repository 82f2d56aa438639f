pub mod gate;
pub mod middleware;
pub mod token;

use thiserror::Error;
use vitrine_core::Status;

pub use gate::{AccessGate, Caller};
pub use middleware::AccessLayer;
pub use token::{Claims, IssuedToken, TokenService};

/// Reasons a call can be refused before its handler runs, or a token can
/// fail to be issued.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization token is not provided")]
    MissingToken,

    #[error("access token is invalid: {0}")]
    InvalidToken(String),

    #[error("access token has expired")]
    Expired,

    #[error("no permission to access this RPC")]
    PermissionDenied,

    #[error("cannot generate access token: {0}")]
    Signing(String),
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::Expired => {
                Self::unauthenticated(err.to_string())
            }
            AuthError::PermissionDenied => Self::permission_denied(err.to_string()),
            AuthError::Signing(_) => Self::internal(err.to_string()),
        }
    }
}
