mod distance;
mod eligibility;

pub use distance::{distance_miles, EARTH_RADIUS_MILES};
pub use eligibility::DeliveryEligibility;
