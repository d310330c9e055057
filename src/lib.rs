//! local-delivery Library
//!
//! Store-radius delivery eligibility: geocodes customer addresses, measures
//! great-circle distance from the store and decides whether a cart may be
//! delivered locally. Exposed as a library for integration tests.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{CheckoutValidation, DeliveryError, LocalDeliveryService, ShippingQuote};
pub use config::load_config;
pub use domain::entities::{Address, CartLine, DeliveryNotice, ProductDeliverySettings, ShippingRate};
pub use domain::ports::{GeocodeError, Geocoder, NoticeStore, ProductSettingsRepository, StoreLocationRepository};
pub use domain::services::{distance_miles, DeliveryEligibility};
pub use domain::value_objects::{Coordinate, DeliveryRadius, DistanceResult, RadiusPolicy};
