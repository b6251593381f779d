use crate::error::DomainError;
use thiserror::Error;

/// Errors of the persistence/store layer. Never fatal to a running session;
/// callers turn them into HTTP statuses or editor status text.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("entity not found: {entity}")]
    NotFound { entity: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ServiceError {
    /// True for errors caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::InvalidInput(_) => true,
            ServiceError::Domain(d) => matches!(
                d,
                DomainError::Validation { .. }
                    | DomainError::DuplicateHotspot { .. }
                    | DomainError::UnknownInitialState { .. }
                    | DomainError::InvalidRoomId(_)
                    | DomainError::Json(_)
                    | DomainError::Yaml(_)
            ),
            _ => false,
        }
    }
}
