//! Haversine distance calculation.
//!
//! Great-circle distance between two coordinates on a spherical Earth,
//! reported in miles.

use crate::domain::value_objects::Coordinate;

/// Earth's mean radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Calculates the great-circle distance from `store` to `destination` in miles.
///
/// Degree differences are converted to radians before halving, so results
/// match existing delivery quotes to the last digit.
///
/// # Example
/// ```
/// use local_delivery::domain::services::distance_miles;
/// use local_delivery::domain::Coordinate;
///
/// let d = distance_miles(&Coordinate::new(0.0, 0.0), &Coordinate::new(0.0, 1.0));
/// assert!((d - 69.097).abs() < 0.01);
/// ```
#[inline]
pub fn distance_miles(store: &Coordinate, destination: &Coordinate) -> f64 {
    let d_lat = (destination.latitude - store.latitude).to_radians();
    let d_lon = (destination.longitude - store.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + store.latitude.to_radians().cos()
            * destination.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push near-antipodal points just past 1.0
    let a = a.min(1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}
