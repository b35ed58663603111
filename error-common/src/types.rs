use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::codes;

/// Classification of a [`ClinicError`], independent of its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Conflict,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    /// Wire code for this kind
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => codes::INVALID_REQUEST,
            ErrorKind::NotFound => codes::NOT_FOUND,
            ErrorKind::Conflict => codes::CONFLICT,
            ErrorKind::Unauthorized => codes::UNAUTHORIZED,
            ErrorKind::Internal => codes::INTERNAL_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::InvalidRequest => "invalid request",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(text)
    }
}

/// Service-level error carrying its kind and a contextual message.
///
/// Messages are built as `"<operation>: <detail>"` so that the failing
/// operation is visible in logs and in the response body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClinicError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),
}

impl ClinicError {
    pub fn invalid_request(context: &str, detail: impl fmt::Display) -> Self {
        Self::InvalidRequest(format!("{context}: {detail}"))
    }

    pub fn not_found(context: &str) -> Self {
        Self::NotFound(format!("{context}: {}", ErrorKind::NotFound))
    }

    pub fn conflict(context: &str) -> Self {
        Self::Conflict(format!("{context}: {}", ErrorKind::Conflict))
    }

    pub fn unauthorized(context: &str) -> Self {
        Self::Unauthorized(format!("{context}: {}", ErrorKind::Unauthorized))
    }

    /// Wrap any lower-level failure as an internal error, keeping its text
    pub fn internal(context: &str, source: impl fmt::Display) -> Self {
        Self::Internal(format!("{context}: {source}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClinicError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ClinicError::NotFound(_) => ErrorKind::NotFound,
            ClinicError::Conflict(_) => ErrorKind::Conflict,
            ClinicError::Unauthorized(_) => ErrorKind::Unauthorized,
            ClinicError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn message(&self) -> &str {
        match self {
            ClinicError::InvalidRequest(m)
            | ClinicError::NotFound(m)
            | ClinicError::Conflict(m)
            | ClinicError::Unauthorized(m)
            | ClinicError::Internal(m) => m,
        }
    }

    /// Re-prefix the message with an outer operation, keeping the kind
    pub fn context(self, outer: &str) -> Self {
        let wrap = |m: String| format!("{outer}: {m}");
        match self {
            ClinicError::InvalidRequest(m) => ClinicError::InvalidRequest(wrap(m)),
            ClinicError::NotFound(m) => ClinicError::NotFound(wrap(m)),
            ClinicError::Conflict(m) => ClinicError::Conflict(wrap(m)),
            ClinicError::Unauthorized(m) => ClinicError::Unauthorized(wrap(m)),
            ClinicError::Internal(m) => ClinicError::Internal(wrap(m)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ClinicError>;
