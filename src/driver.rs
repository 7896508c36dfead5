pub mod extract;
pub mod spider;

use async_trait::async_trait;

use crate::error::DriverError;
use crate::model::{PlaceRecord, PlaceSeed, RawReview};

pub use spider::SpiderDriver;

/// Outcome of resolving a seed against the maps service. `ambiguous` is set
/// when the query matched more than one candidate; the record is then the
/// first result the service returned.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: PlaceRecord,
    pub ambiguous: bool,
}

/// Capability seam over the browser-automation collaborator. The rest of
/// the pipeline only ever talks to this trait, so the spider.cloud-backed
/// implementation can be swapped for a mock or a future API client.
#[async_trait]
pub trait MapsDriver: Send + Sync {
    /// Resolve a seed to a single place. The returned record carries the
    /// seed's id so downstream joins stay stable across scrape runs.
    async fn resolve_place(&self, seed: &PlaceSeed) -> Result<Resolution, DriverError>;

    /// Fetch up to `max` reviews for an already-resolved place. An empty
    /// vector is a valid result (the place simply has no reviews).
    async fn fetch_reviews(
        &self,
        place: &PlaceRecord,
        max: usize,
    ) -> Result<Vec<RawReview>, DriverError>;
}
