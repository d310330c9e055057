//! Nominatim Geocoder
//!
//! Implements Geocoder against the Nominatim search API
//! (OpenStreetMap). One GET per lookup, bounded by a timeout.
//!
//! See: https://nominatim.org/release-docs/latest/api/Search/

use crate::domain::entities::Address;
use crate::domain::ports::{GeocodeError, Geocoder};
use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL of the service (e.g., "https://nominatim.openstreetmap.org")
    pub base_url: String,
    /// Upper bound on a single lookup
    pub timeout: Duration,
    /// Sent as User-Agent; the public instance rejects anonymous clients
    pub user_agent: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: format!("local-delivery/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// One entry of the search response. Only the position is read.
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: Degrees,
    lon: Degrees,
}

/// Nominatim returns degrees as strings; other servers use numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    fn value(&self) -> Result<f64, GeocodeError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| GeocodeError::Malformed(format!("invalid degrees: {:?}", s))),
        }
    }
}

/// Nominatim-backed geocoder.
pub struct NominatimGeocoder {
    config: NominatimConfig,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    /// Create a geocoder with the given configuration.
    pub fn new(config: NominatimConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }

    /// Extract the first result's position from a decoded response.
    fn first_position(results: Vec<serde_json::Value>) -> Result<Coordinate, GeocodeError> {
        let first = results.into_iter().next().ok_or(GeocodeError::NoResults)?;
        let result: SearchResult =
            serde_json::from_value(first).map_err(|e| GeocodeError::Malformed(e.to_string()))?;

        let coordinate = Coordinate::new(result.lat.value()?, result.lon.value()?);
        if !coordinate.is_valid() {
            return Err(GeocodeError::OutOfRange {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            });
        }

        Ok(coordinate)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &Address) -> Result<Coordinate, GeocodeError> {
        if !address.is_complete() {
            return Err(GeocodeError::IncompleteAddress);
        }

        let query = address.query();
        tracing::debug!("geocoding {:?}", query);

        let response = self
            .client
            .get(self.search_url())
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("geocoder request failed for {:?}: {}", query, e);
                GeocodeError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("geocoder returned {} for {:?}", status, query);
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let results = response
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(|e| {
                if e.is_decode() {
                    GeocodeError::Malformed(e.to_string())
                } else {
                    GeocodeError::Transport(e.to_string())
                }
            });

        match results.and_then(Self::first_position) {
            Ok(coordinate) => {
                tracing::debug!("geocoded {:?} -> {}", query, coordinate);
                Ok(coordinate)
            }
            Err(e) => {
                tracing::warn!("geocoding {:?} failed: {}", query, e);
                Err(e)
            }
        }
    }
}
