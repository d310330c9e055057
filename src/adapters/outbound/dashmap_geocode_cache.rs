//! DashMap Geocode Cache
//!
//! Decorates a Geocoder with a TTL cache of successful lookups.
//! Failed lookups are never cached, so a transient outage does not pin a
//! customer as unreachable.

use crate::domain::entities::Address;
use crate::domain::ports::{GeocodeError, Geocoder};
use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct CachedCoordinate {
    coordinate: Coordinate,
    stored_at: Instant,
}

/// Caching geocoder backed by DashMap.
///
/// Entries are keyed by the normalised query text and expire after `ttl`.
pub struct CachingGeocoder {
    inner: Arc<dyn Geocoder>,
    entries: Arc<DashMap<String, CachedCoordinate>>,
    ttl: Duration,
}

impl CachingGeocoder {
    pub fn new(inner: Arc<dyn Geocoder>, ttl: Duration) -> Self {
        Self {
            inner,
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn cache_key(address: &Address) -> String {
        address.query().to_lowercase()
    }

    /// Start the background garbage collection task.
    ///
    /// Removes entries older than the TTL.
    pub fn start_gc(&self, interval: Duration) {
        let entries = self.entries.clone();
        let ttl = self.ttl;

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let removed = Self::remove_expired(&entries, ttl);
                if removed > 0 {
                    tracing::debug!("geocode cache GC removed {} expired entries", removed);
                }
            }
        });
    }

    /// Remove all expired entries now. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        Self::remove_expired(&self.entries, self.ttl)
    }

    /// Number of cached lookups (including expired ones not yet collected).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_expired(entries: &DashMap<String, CachedCoordinate>, ttl: Duration) -> usize {
        let before = entries.len();
        entries.retain(|_, cached| cached.stored_at.elapsed() < ttl);
        before.saturating_sub(entries.len())
    }
}

#[async_trait]
impl Geocoder for CachingGeocoder {
    async fn resolve(&self, address: &Address) -> Result<Coordinate, GeocodeError> {
        let key = Self::cache_key(address);

        if let Some(cached) = self.entries.get(&key).map(|e| *e.value()) {
            if cached.stored_at.elapsed() < self.ttl {
                tracing::debug!("geocode cache hit for {:?}", key);
                return Ok(cached.coordinate);
            }
            self.entries.remove(&key);
        }

        let coordinate = self.inner.resolve(address).await?;
        self.entries.insert(
            key,
            CachedCoordinate {
                coordinate,
                stored_at: Instant::now(),
            },
        );

        Ok(coordinate)
    }
}
