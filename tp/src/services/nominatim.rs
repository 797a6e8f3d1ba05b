//! Nominatim geocoding client
//!
//! Forward search is restricted to the configured region with
//! `countrycodes` plus a bounded `viewbox`. Reverse lookup reports the
//! country code from the `address` block; Nominatim answers points with no
//! region (open sea) with an `{"error": ..}` body, reported as no code.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{
    ForwardGeocoder, GeocodeCandidate, RegionFilter, ReverseGeocode, ReverseGeocoder, ServiceError, http_client,
};
use crate::config::{RegionConfig, ServicesConfig};
use crate::domain::GeoPoint;

/// Nominatim HTTP client
pub struct NominatimClient {
    base_url: String,
    language: String,
    max_candidates: u32,
    http: Client,
}

impl NominatimClient {
    pub fn from_config(services: &ServicesConfig, region: &RegionConfig) -> Result<Self, ServiceError> {
        debug!(base_url = %services.geocoder_url, "from_config: called");
        Ok(Self {
            base_url: services.geocoder_url.trim_end_matches('/').to_string(),
            language: region.language.clone(),
            max_candidates: services.max_candidates.max(1),
            http: http_client(services)?,
        })
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, ServiceError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status, "get_text: API error");
            return Err(ServiceError::ApiError { status, message: text });
        }

        Ok(response.text().await?)
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseBody {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<ReverseAddress>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    #[serde(default)]
    country_code: Option<String>,
}

pub(crate) fn parse_search(body: &str) -> Result<Vec<GeocodeCandidate>, ServiceError> {
    let hits: Vec<SearchHit> = serde_json::from_str(body)?;
    hits.into_iter()
        .map(|hit| {
            let lat = hit.lat.trim().parse::<f64>();
            let lng = hit.lon.trim().parse::<f64>();
            match (lat, lng) {
                (Ok(lat), Ok(lng)) => Ok(GeocodeCandidate {
                    lat,
                    lng,
                    label: hit.display_name,
                }),
                _ => Err(ServiceError::InvalidResponse(format!(
                    "unparseable coordinates: {}, {}",
                    hit.lat, hit.lon
                ))),
            }
        })
        .collect()
}

pub(crate) fn parse_reverse(body: &str, point: GeoPoint) -> Result<ReverseGeocode, ServiceError> {
    let parsed: ReverseBody = serde_json::from_str(body)?;
    if let Some(error) = parsed.error {
        debug!(%error, "parse_reverse: no region at point");
        return Ok(ReverseGeocode {
            display_name: point.to_string(),
            region_code: None,
        });
    }
    Ok(ReverseGeocode {
        display_name: parsed.display_name.unwrap_or_else(|| point.to_string()),
        region_code: parsed
            .address
            .and_then(|a| a.country_code)
            .map(|c| c.to_lowercase()),
    })
}

#[async_trait]
impl ForwardGeocoder for NominatimClient {
    async fn search(&self, query: &str, filter: &RegionFilter) -> Result<Vec<GeocodeCandidate>, ServiceError> {
        debug!(%query, region = %filter.code, "search: called");
        let body = self
            .get_text(
                "search",
                &[
                    ("format", "json".to_string()),
                    ("q", query.to_string()),
                    ("countrycodes", filter.code.clone()),
                    ("viewbox", filter.bounds.to_viewbox()),
                    ("bounded", "1".to_string()),
                    ("limit", self.max_candidates.to_string()),
                    ("accept-language", filter.language.clone()),
                ],
            )
            .await?;
        let candidates = parse_search(&body)?;
        debug!(count = candidates.len(), "search: done");
        Ok(candidates)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, point: GeoPoint) -> Result<ReverseGeocode, ServiceError> {
        debug!(%point, "reverse: called");
        let body = self
            .get_text(
                "reverse",
                &[
                    ("format", "json".to_string()),
                    ("lat", point.lat.to_string()),
                    ("lon", point.lng.to_string()),
                    ("accept-language", self.language.clone()),
                ],
            )
            .await?;
        parse_reverse(&body, point)
    }
}
