//! Device location provider for terminal use

use async_trait::async_trait;
use tracing::debug;

use super::{LocationError, LocationProvider};
use crate::domain::GeoPoint;

/// Reports a fixed position, or unavailable when none is configured
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    position: Option<GeoPoint>,
}

impl FixedLocationProvider {
    pub fn new(position: Option<GeoPoint>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        debug!(position = ?self.position, "current_position: called");
        self.position
            .ok_or_else(|| LocationError::Unavailable("no device position configured".to_string()))
    }
}
