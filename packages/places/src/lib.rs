//! # Waypoint Places
//!
//! Place marks found in a document get a stable color and, through an
//! external geocoder, coordinates.
//!
//! ```text
//! Document ──▶ PlaceRegistry::scan ──▶ colors written into marks
//!          ──▶ Enricher::begin ──▶ resolve (GeocodeCache ─▶ Geocoder) ──▶ apply
//! ```

pub mod cache;
pub mod enricher;
pub mod error;
pub mod geocoder;
pub mod registry;

pub use cache::{CacheEntry, CacheStats, GeocodeCache, Lookup, DEFAULT_TTL};
pub use enricher::{needs_enrichment, EnrichmentBatch, EnrichmentReport, Enricher, Resolution};
pub use error::{EnrichmentUnresolved, GeocodeError, UnresolvedReason};
pub use geocoder::{Geocoder, LatLng, StaticGeocoder};
pub use registry::{PlaceRegistry, DEFAULT_PALETTE_SIZE};
