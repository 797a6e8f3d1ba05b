//! Geographic types: points, bounding boxes, resolved addresses

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that both coordinates are finite and within WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// Rectangular approximation of a region
///
/// Only used as a cheap pre-check. A point inside the box may still lie
/// outside the region itself; the reverse-lookup region code decides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Inclusive containment test
    pub fn contains(&self, point: GeoPoint) -> bool {
        let inside = point.lat >= self.south && point.lat <= self.north && point.lng >= self.west && point.lng <= self.east;
        debug!(%point, inside, "BoundingBox::contains: called");
        inside
    }

    /// Check the box is well formed (south < north, west < east, in range)
    pub fn is_valid(&self) -> bool {
        GeoPoint::new(self.south, self.west).is_valid()
            && GeoPoint::new(self.north, self.east).is_valid()
            && self.south < self.north
            && self.west < self.east
    }

    /// Nominatim `viewbox` parameter: `west,north,east,south`
    pub fn to_viewbox(&self) -> String {
        format!("{},{},{},{}", self.west, self.north, self.east, self.south)
    }
}

/// A validated, human-readable location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Display text (geocoder label or display name)
    pub text: String,

    pub lat: f64,

    pub lng: f64,
}

impl Address {
    pub fn new(text: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            text: text.into(),
            lat: point.lat,
            lng: point.lng,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}
