use thiserror::Error;
use vitrine_core::{Interrupt, Status};

/// Errors from record, rating and identity store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record ID is not a valid UUID: {0}")]
    InvalidId(String),

    #[error("{kind} with ID {id} already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("search interrupted: {0:?}")]
    Interrupted(Interrupt),

    #[error("record sink closed: {0}")]
    SinkClosed(String),

    #[error("password hash error: {0}")]
    PasswordHash(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.into(),
        }
    }
}

impl From<StoreError> for Status {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidId(_) => Self::invalid_argument(err.to_string()),
            StoreError::AlreadyExists { .. } => Self::already_exists(err.to_string()),
            StoreError::Interrupted(interrupt) => interrupt.into(),
            StoreError::SinkClosed(_) => Self::canceled(err.to_string()),
            StoreError::PasswordHash(_) | StoreError::Backend(_) => {
                Self::internal(err.to_string())
            }
        }
    }
}
