//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use crate::domain::ports::GeocodeError;
use serde::{Deserialize, Serialize};

/// Distance reported for a destination that could not be measured.
///
/// Kept for callers that need a plain number. Eligibility checks never
/// compare against it: an [`DistanceResult::Unreachable`] destination is
/// outside every radius.
pub const SENTINEL_DISTANCE_MILES: f64 = 99999.0;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Maximum delivery distance in miles.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DeliveryRadius(f64);

impl DeliveryRadius {
    /// Create a radius, rejecting negative and non-finite values.
    pub fn new(miles: f64) -> Option<Self> {
        if miles.is_finite() && miles >= 0.0 {
            Some(Self(miles))
        } else {
            None
        }
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn miles(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for DeliveryRadius {
    type Error = String;

    fn try_from(miles: f64) -> Result<Self, Self::Error> {
        Self::new(miles).ok_or_else(|| format!("invalid delivery radius: {}", miles))
    }
}

impl From<DeliveryRadius> for f64 {
    fn from(radius: DeliveryRadius) -> Self {
        radius.0
    }
}

impl std::fmt::Display for DeliveryRadius {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mi", self.0)
    }
}

/// Why a destination could not be measured.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnreachableReason {
    #[error("store coordinates have not been set")]
    StoreCoordinatesUnset,
    #[error("store coordinates could not be read")]
    StoreCoordinatesUnavailable,
    #[error("destination address is incomplete")]
    IncompleteAddress,
    #[error("geocoding failed: {0}")]
    GeocodeFailure(GeocodeError),
}

/// Outcome of measuring the distance from the store to a destination.
#[derive(Debug, Clone, PartialEq)]
pub enum DistanceResult {
    /// Great-circle distance in miles
    Measured(f64),
    /// The distance is unknown; treated as out of range
    Unreachable(UnreachableReason),
}

impl DistanceResult {
    /// The measured distance, if any.
    pub fn miles(&self) -> Option<f64> {
        match self {
            Self::Measured(miles) => Some(*miles),
            Self::Unreachable(_) => None,
        }
    }

    /// The measured distance, or [`SENTINEL_DISTANCE_MILES`] when unknown.
    pub fn miles_or_sentinel(&self) -> f64 {
        self.miles().unwrap_or(SENTINEL_DISTANCE_MILES)
    }

    /// Whether the destination lies within the radius. Fails closed.
    pub fn is_within(&self, radius: DeliveryRadius) -> bool {
        match self {
            Self::Measured(miles) => {
                crate::domain::services::DeliveryEligibility::is_within_radius(
                    *miles,
                    radius.miles(),
                )
            }
            Self::Unreachable(_) => false,
        }
    }
}

/// How the delivery radius for a cart is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusPolicy {
    /// Largest radius among cart lines with local delivery enabled
    MaxCartItem,
    /// One radius configured on the shipping method
    MethodLevel(DeliveryRadius),
}

impl RadiusPolicy {
    /// Parse a policy name.
    ///
    /// `"method"` selects [`RadiusPolicy::MethodLevel`] with the given radius;
    /// anything else falls back to [`RadiusPolicy::MaxCartItem`].
    pub fn parse(name: &str, method_radius: DeliveryRadius) -> Self {
        match name.trim().to_lowercase().as_str() {
            "method" | "method_level" => Self::MethodLevel(method_radius),
            _ => Self::MaxCartItem,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxCartItem => "max_cart_item",
            Self::MethodLevel(_) => "method",
        }
    }
}

impl Default for RadiusPolicy {
    fn default() -> Self {
        Self::MaxCartItem
    }
}
