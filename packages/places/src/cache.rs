//! Time-bounded geocode cache with single-flight lookups

use crate::error::GeocodeError;
use crate::geocoder::{Geocoder, LatLng};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use waypoint_parser::normalize_name;

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of a completed lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    Found(LatLng),
    NotFound,
}

/// Immutable cache entry, replaced wholesale on refresh
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub lookup: Lookup,
    pub inserted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Approximate number of live entries
    pub entry_count: u64,
    /// External lookups issued since creation
    pub lookups_issued: u64,
}

/// Geocode cache keyed by normalized place name
///
/// Concurrent misses for one key share a single external lookup. Found and
/// not-found results are cached for the TTL; failures are not cached, so the
/// next call retries. Expired entries are dropped lazily on access.
#[derive(Clone)]
pub struct GeocodeCache {
    inner: Cache<String, Arc<CacheEntry>>,
    geocoder: Arc<dyn Geocoder>,
    lookups: Arc<AtomicU64>,
    ttl: Duration,
}

impl GeocodeCache {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self::with_ttl(geocoder, DEFAULT_TTL)
    }

    pub fn with_ttl(geocoder: Arc<dyn Geocoder>, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().time_to_live(ttl).build(),
            geocoder,
            lookups: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve a place name, consulting the geocoder only on a miss
    pub async fn resolve(&self, name: &str) -> Result<Lookup, Arc<GeocodeError>> {
        self.entry(name).await.map(|entry| entry.lookup)
    }

    /// Cached entry for `name`, looking it up on a miss
    pub async fn entry(&self, name: &str) -> Result<Arc<CacheEntry>, Arc<GeocodeError>> {
        let key = normalize_name(name);
        self.inner
            .try_get_with(key.clone(), self.fetch(key))
            .await
    }

    async fn fetch(&self, key: String) -> Result<Arc<CacheEntry>, GeocodeError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(name = %key, "geocode lookup");

        let lookup = match self.geocoder.lookup(&key).await {
            Ok(Some(coords)) => Lookup::Found(coords),
            Ok(None) => Lookup::NotFound,
            Err(e) => {
                tracing::warn!(name = %key, error = %e, "geocode lookup failed");
                return Err(e);
            }
        };

        Ok(Arc::new(CacheEntry {
            key,
            lookup,
            inserted_at: Utc::now(),
        }))
    }

    /// Cached entry without triggering a lookup
    pub async fn get(&self, name: &str) -> Option<Arc<CacheEntry>> {
        self.inner.get(&normalize_name(name)).await
    }

    pub async fn invalidate(&self, name: &str) {
        self.inner.invalidate(&normalize_name(name)).await;
    }

    pub fn lookups_issued(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
            lookups_issued: self.lookups_issued(),
        }
    }
}
