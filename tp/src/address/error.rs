//! Address resolution errors

use thiserror::Error;

use crate::domain::{FailureKind, GeoPoint};
use crate::services::{LocationError, ServiceError};
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Address query is empty")]
    EmptyQuery,

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(GeoPoint),

    #[error("No location found for '{0}'")]
    NotFound(String),

    #[error("Location {point} is outside {region}")]
    OutOfRegion { point: GeoPoint, region: String },

    #[error("Device location unavailable: {0}")]
    LocationUnavailable(#[from] LocationError),

    #[error("Location lookup failed: {0}")]
    LookupFailed(#[source] ServiceError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ResolveError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ResolveError::EmptyQuery | ResolveError::InvalidCoordinates(_) => FailureKind::InputValidation,
            ResolveError::NotFound(_) => FailureKind::NotFound,
            ResolveError::OutOfRegion { .. } => FailureKind::OutOfRegion,
            ResolveError::LocationUnavailable(_) => FailureKind::LocationUnavailable,
            ResolveError::LookupFailed(e) => e.kind(),
            ResolveError::Session(_) => FailureKind::Internal,
        }
    }
}
