//! Errors from external service calls

use thiserror::Error;

use crate::domain::FailureKind;

/// Failure of an HTTP-backed service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with an `{"error": ..}` payload
    #[error("Service rejected the request: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::ServiceError
    }
}

/// Failure of the device geolocation provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location access denied")]
    Denied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}
