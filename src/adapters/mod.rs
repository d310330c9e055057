//! Adapters
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters
//! implement the domain ports (geocoding, storage, notices).

pub mod inbound;
pub mod outbound;
