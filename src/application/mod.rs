//! Application Layer
//!
//! Use cases composed from domain services and ports.

mod delivery_service;

pub use delivery_service::{
    CheckoutValidation, DeliveryError, LocalDeliveryService, ShippingMethodSettings,
    ShippingQuote,
};
