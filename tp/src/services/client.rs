//! Service trait definitions
//!
//! Each consumed external interface is a stateless async trait, so the
//! pipeline components can be driven by HTTP adapters in the binary and by
//! scripted mocks in tests.

use async_trait::async_trait;

use super::{
    GenerationRequest, GeocodeCandidate, LocationError, PricingRequest, RegionFilter, ReverseGeocode, ServiceError,
};
use crate::domain::{GeoPoint, Ingredient, RecommendationResult};

/// Produces the ingredient list for a dish
#[async_trait]
pub trait IngredientGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<Ingredient>, ServiceError>;
}

/// Prices a basket across stores
#[async_trait]
pub trait PricingService: Send + Sync {
    async fn recommend(&self, request: PricingRequest) -> Result<RecommendationResult, ServiceError>;
}

/// Free text to ranked candidates; an empty list is a valid answer
#[async_trait]
pub trait ForwardGeocoder: Send + Sync {
    async fn search(&self, query: &str, filter: &RegionFilter) -> Result<Vec<GeocodeCandidate>, ServiceError>;
}

/// Point to display name and region code
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, point: GeoPoint) -> Result<ReverseGeocode, ServiceError>;
}

/// Device geolocation
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<GeoPoint, LocationError>;
}
