//! Domain Layer
//!
//! Entities, value objects, ports and pure services. Nothing here
//! performs I/O.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{
    Address, CartLine, DeliveryNotice, ProductDeliverySettings, ShippingRate,
    LOCAL_DELIVERY_METHOD_ID,
};
pub use value_objects::{
    Coordinate, DeliveryRadius, DistanceResult, RadiusPolicy, UnreachableReason,
    SENTINEL_DISTANCE_MILES,
};
