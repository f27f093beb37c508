use std::fmt;

use thiserror::Error;

/// Failure taxonomy shared by every layer above the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing profile or keyword; detected before any network call.
    PreconditionFailed,
    NetworkUnavailable,
    BadRequest { details: String },
    NotFound,
    ServerError(u16),
    /// The request was superseded by a newer one for the same key.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::PreconditionFailed => write!(f, "precondition failed"),
            ErrorKind::NetworkUnavailable => write!(f, "network unavailable"),
            ErrorKind::BadRequest { details } => write!(f, "bad request ({details})"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::ServerError(status) => write!(f, "server error {status}"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PreconditionFailed, message)
    }

    pub fn bad_request(details: impl Into<String>) -> Self {
        let details = details.into();
        Self::new(
            ErrorKind::BadRequest {
                details: details.clone(),
            },
            details,
        )
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// True for failures raised locally, before anything reached the network.
    pub fn is_precondition(&self) -> bool {
        self.kind == ErrorKind::PreconditionFailed
    }
}

/// Rejects empty (or whitespace-only) profile ids for profile-scoped calls.
pub fn require_profile(profile_id: &str) -> Result<&str, ApiError> {
    if profile_id.trim().is_empty() {
        return Err(ApiError::precondition("no profile selected"));
    }
    Ok(profile_id)
}
