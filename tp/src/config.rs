//! Trip planner configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{BoundingBox, GeoPoint};
use crate::services::RegionFilter;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Geographic region addresses must fall in
    pub region: RegionConfig,

    /// External service endpoints
    pub services: ServicesConfig,

    /// Stand-in for the device geolocation provider
    pub device: DeviceConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.region.code.trim().is_empty() {
            return Err(eyre::eyre!("region.code must not be empty"));
        }
        if !self.region.bounds.is_valid() {
            return Err(eyre::eyre!(
                "region.bounds is not a valid box (south < north, west < east, within lat/lng ranges): {:?}",
                self.region.bounds
            ));
        }
        if self.services.timeout_ms == 0 {
            return Err(eyre::eyre!("services.timeout-ms must be greater than zero"));
        }
        if let Some(point) = self.device.position()
            && !point.is_valid()
        {
            return Err(eyre::eyre!("device position is not a valid coordinate: {}", point));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, without failing
    ///
    /// Used before logging is initialized, so errors are swallowed.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::default_paths(),
        };
        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    /// Project-local file first, then the user config directory
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".tripplanner.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("tripplanner").join("tripplanner.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Region configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Administrative region code returned by reverse geocoding (ISO 3166-1 alpha-2)
    pub code: String,

    /// Display name for messages
    pub name: String,

    /// Preferred language for geocoder labels
    pub language: String,

    /// Rectangular approximation used for cheap rejection
    pub bounds: BoundingBox,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            code: "ph".to_string(),
            name: "Philippines".to_string(),
            language: "en".to_string(),
            bounds: BoundingBox::new(4.2, 116.8, 21.2, 126.6),
        }
    }
}

impl RegionConfig {
    /// Case-insensitive match against a geocoder region code
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }

    pub fn filter(&self) -> RegionFilter {
        RegionFilter {
            code: self.code.to_lowercase(),
            bounds: self.bounds,
            language: self.language.clone(),
        }
    }
}

/// External service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Base URL of the recommendation backend
    #[serde(rename = "backend-url")]
    pub backend_url: String,

    /// Ingredient generation endpoint path
    #[serde(rename = "generate-path")]
    pub generate_path: String,

    /// Price recommendation endpoint path
    #[serde(rename = "recommendation-path")]
    pub recommendation_path: String,

    /// Nominatim-compatible geocoder base URL
    #[serde(rename = "geocoder-url")]
    pub geocoder_url: String,

    /// User-Agent sent with every request (required by public Nominatim)
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Maximum forward geocoding candidates requested
    #[serde(rename = "max-candidates")]
    pub max_candidates: u32,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            generate_path: "/api/generate/".to_string(),
            recommendation_path: "/api/recommendation/".to_string(),
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("tripplanner/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 30_000,
            max_candidates: 5,
        }
    }
}

/// Fixed device position
///
/// A terminal has no GPS; when both coordinates are set they are reported
/// as the device's current position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl DeviceConfig {
    pub fn position(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}
