//! Geocoder Port
//!
//! Defines the interface for resolving postal addresses to coordinates.

use crate::domain::entities::Address;
use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;

/// Reasons a geocoding lookup produced no coordinate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeocodeError {
    /// One of street, city or postal code is blank
    #[error("address is incomplete")]
    IncompleteAddress,
    /// Connection failure or timeout
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a non-2xx status
    #[error("unexpected status {0}")]
    Status(u16),
    /// The body was not the expected JSON
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The service found nothing for the query
    #[error("no results")]
    NoResults,
    /// The first result lies outside valid latitude/longitude ranges
    #[error("coordinate out of range: {latitude}, {longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Resolver for postal address to coordinate.
///
/// This is an outbound port that abstracts the geocoding service.
/// Implementations issue at most one lookup per call and never retry;
/// every failure comes back as a [`GeocodeError`] value.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve an address to a coordinate.
    async fn resolve(&self, address: &Address) -> Result<Coordinate, GeocodeError>;
}
