//! Store Location Repository Port
//!
//! Persists the store's geocoded coordinate.

use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;

/// Repository for the store coordinate.
///
/// The coordinate is resolved once and read on every eligibility check.
#[async_trait]
pub trait StoreLocationRepository: Send + Sync {
    /// Get the stored coordinate, or None if the store was never geocoded.
    async fn get_store_location(&self) -> anyhow::Result<Option<Coordinate>>;

    /// Replace the stored coordinate.
    async fn set_store_location(&self, coordinate: Coordinate) -> anyhow::Result<()>;
}
