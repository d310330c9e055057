//! Delivery Eligibility Service
//!
//! Pure domain logic deciding whether a destination is close enough to
//! the store for local delivery. No I/O happens here.

use crate::domain::entities::ProductDeliverySettings;
use crate::domain::services::distance_miles;
use crate::domain::value_objects::{
    Coordinate, DeliveryRadius, DistanceResult, RadiusPolicy, UnreachableReason,
};

/// Delivery eligibility rules.
///
/// Radius selection depends on the configured [`RadiusPolicy`]:
/// - `MaxCartItem`: the largest radius among products with local delivery
///   enabled, or `None` when no such product is in the cart
/// - `MethodLevel`: the shipping method's radius, whatever the cart holds
pub struct DeliveryEligibility;

impl DeliveryEligibility {
    /// Inclusive radius comparison.
    #[inline]
    pub fn is_within_radius(distance: f64, radius: f64) -> bool {
        distance <= radius
    }

    /// Measure the distance from the store to a resolved destination.
    ///
    /// A store that was never geocoded makes every destination unreachable.
    pub fn measure(store: Option<&Coordinate>, destination: &Coordinate) -> DistanceResult {
        match store {
            Some(store) => DistanceResult::Measured(distance_miles(store, destination)),
            None => DistanceResult::Unreachable(UnreachableReason::StoreCoordinatesUnset),
        }
    }

    /// Pick the radius that applies to a cart.
    pub fn select_radius(
        policy: &RadiusPolicy,
        cart: &[ProductDeliverySettings],
    ) -> Option<DeliveryRadius> {
        match policy {
            RadiusPolicy::MethodLevel(radius) => Some(*radius),
            RadiusPolicy::MaxCartItem => cart
                .iter()
                .filter_map(|p| p.effective_radius())
                .fold(None, |best: Option<DeliveryRadius>, radius| match best {
                    Some(b) if b >= radius => Some(b),
                    _ => Some(radius),
                }),
        }
    }

    /// Products with local delivery enabled that cannot reach the destination.
    pub fn out_of_range<'a>(
        distance: &DistanceResult,
        radius: Option<DeliveryRadius>,
        cart: &'a [ProductDeliverySettings],
    ) -> Vec<&'a ProductDeliverySettings> {
        let reachable = radius.map_or(false, |r| distance.is_within(r));
        if reachable {
            return Vec::new();
        }

        cart.iter()
            .filter(|p| p.local_delivery_enabled)
            .collect()
    }
}
