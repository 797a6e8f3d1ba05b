//! Request and response types for the consumed services

use serde::{Deserialize, Serialize};

use crate::domain::{Address, BasketItem, BoundingBox, GeoPoint};

/// Ingredient generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub dish: String,
    pub people_count: u32,
}

/// Price recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub people_count: u32,
    pub budget: f64,
    pub ingredients: Vec<BasketItem>,
}

/// One forward geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub lat: f64,
    pub lng: f64,
    pub label: String,
}

impl GeocodeCandidate {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn into_address(self) -> Address {
        let point = self.point();
        Address::new(self.label, point)
    }
}

/// Reverse geocoding answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocode {
    pub display_name: String,

    /// Administrative region code; `None` when the point has no region (open sea)
    pub region_code: Option<String>,
}

/// Constraint passed to forward geocoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFilter {
    pub code: String,
    pub bounds: BoundingBox,
    pub language: String,
}
