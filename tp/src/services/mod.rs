//! External services consumed by the pipeline
//!
//! Ingredient generation, store pricing, forward/reverse geocoding and
//! device location, each behind an async trait with an HTTP (or fixed)
//! implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

mod backend;
pub mod client;
mod device;
mod error;
mod nominatim;
mod types;

pub use backend::BackendClient;
pub use client::{ForwardGeocoder, IngredientGenerator, LocationProvider, PricingService, ReverseGeocoder};
pub use device::FixedLocationProvider;
pub use error::{LocationError, ServiceError};
pub use nominatim::NominatimClient;
pub use types::{GenerationRequest, GeocodeCandidate, PricingRequest, RegionFilter, ReverseGeocode};

use crate::config::{Config, ServicesConfig};

/// The full set of service handles the planner needs
#[derive(Clone)]
pub struct Services {
    pub generator: Arc<dyn IngredientGenerator>,
    pub pricing: Arc<dyn PricingService>,
    pub forward: Arc<dyn ForwardGeocoder>,
    pub reverse: Arc<dyn ReverseGeocoder>,
    pub location: Arc<dyn LocationProvider>,
}

/// Build HTTP-backed services from configuration
///
/// The backend client serves both generation and pricing, and one Nominatim
/// client serves both geocoding directions.
pub fn create_services(config: &Config) -> Result<Services, ServiceError> {
    debug!(backend = %config.services.backend_url, geocoder = %config.services.geocoder_url, "create_services: called");
    let backend = Arc::new(BackendClient::from_config(&config.services)?);
    let nominatim = Arc::new(NominatimClient::from_config(&config.services, &config.region)?);
    let location = Arc::new(FixedLocationProvider::new(config.device.position()));

    Ok(Services {
        generator: backend.clone(),
        pricing: backend,
        forward: nominatim.clone(),
        reverse: nominatim,
        location,
    })
}

/// Shared reqwest client with the configured timeout and user agent
pub(crate) fn http_client(config: &ServicesConfig) -> Result<Client, ServiceError> {
    let timeout = Duration::from_millis(config.timeout_ms);
    Client::builder()
        .timeout(timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(ServiceError::Network)
}
