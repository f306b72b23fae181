use thiserror::Error;

/// Errors returned by a [`LaceworkApi`](super::LaceworkApi) implementation.
///
/// Status codes are kept as plain integers so the domain does not depend
/// on any particular HTTP stack.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid request (400): {0}")]
    BadRequest(String),

    #[error("Unauthorized (401): {0}")]
    Unauthorized(String),

    #[error("Forbidden (403): {0}")]
    Forbidden(String),

    #[error("Resource not found (404): {0}")]
    NotFound(String),

    #[error("Rate limit exceeded (429)")]
    RateLimited,

    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    #[error("Unexpected response ({0}): {1}")]
    Unexpected(u16, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Classify a non-success HTTP status with its response body.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => Self::BadRequest(body),
            401 => Self::Unauthorized(body),
            403 => Self::Forbidden(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimited,
            500..=599 => Self::Server(status, body),
            _ => Self::Unexpected(status, body),
        }
    }

    /// Whether the credentials were rejected.
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Forbidden(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
