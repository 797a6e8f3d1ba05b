//! User-facing failure taxonomy

use serde::{Deserialize, Serialize};

/// Category of a failed operation, used to pick the user-facing message
///
/// Every component error maps onto one of these. None of them is fatal to
/// the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Empty or malformed input, non-positive budget
    InputValidation,
    /// No geocoding match, empty price list
    NotFound,
    /// Location outside the configured region
    OutOfRegion,
    /// Device declined or could not provide a position
    LocationUnavailable,
    /// Network or service failure from an external call
    ServiceError,
    /// Session actor gone
    Internal,
}

impl FailureKind {
    /// Whether the user can retry the same operation unchanged
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::ServiceError | FailureKind::LocationUnavailable)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::InputValidation => "invalid input",
            FailureKind::NotFound => "not found",
            FailureKind::OutOfRegion => "out of region",
            FailureKind::LocationUnavailable => "location unavailable",
            FailureKind::ServiceError => "service error",
            FailureKind::Internal => "internal error",
        };
        write!(f, "{}", label)
    }
}
