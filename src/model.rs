use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the input seed list. Immutable once loaded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaceSeed {
    pub id: String,
    pub name: String,
    pub locality: String,
}

impl PlaceSeed {
    /// Query string handed to the maps service; name plus locality is
    /// expected to resolve a unique place.
    pub fn query(&self) -> String {
        format!("{} {}", self.name.trim(), self.locality.trim())
    }
}

/// One row of the append-only raw place store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaceRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    pub description: String,
    pub attributes: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub maps_url: String,
    pub scraped_at: DateTime<Utc>,
}

impl PlaceRecord {
    pub const HEADERS: [&'static str; 12] = [
        "id",
        "name",
        "address",
        "latitude",
        "longitude",
        "category",
        "description",
        "attributes",
        "rating",
        "review_count",
        "maps_url",
        "scraped_at",
    ];
}

/// A review exactly as extracted: author display name, star count,
/// text (never empty once stored) and the service's relative timestamp
/// ("3 bulan yang lalu").
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawReview {
    pub author: String,
    pub rating: u8,
    pub text: String,
    pub relative_time: String,
}

/// One file of the raw review store: the place it belongs to plus every
/// review collected for it. `place.scraped_at` anchors relative timestamps
/// during processing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaceDocument {
    pub place: PlaceRecord,
    pub reviews: Vec<RawReview>,
}

/// Cleaned place-level output row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessedPlace {
    pub id: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: String,
    pub attributes: String,
    pub rating: f64,
    pub review_count: u32,
    pub scraped_at: DateTime<Utc>,
}

impl ProcessedPlace {
    pub const HEADERS: [&'static str; 11] = [
        "id",
        "name",
        "category",
        "address",
        "latitude",
        "longitude",
        "description",
        "attributes",
        "rating",
        "review_count",
        "scraped_at",
    ];
}

/// Cleaned review-level output row, joined to its place by `place_id`.
/// `reviewer` is an anonymized fingerprint, `review_date` an ISO date
/// (empty when the relative timestamp could not be resolved).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProcessedReview {
    pub place_id: String,
    pub reviewer: String,
    pub rating: u8,
    pub text: String,
    pub review_date: String,
}

impl ProcessedReview {
    pub const HEADERS: [&'static str; 5] =
        ["place_id", "reviewer", "rating", "text", "review_date"];
}

/// A record that failed validation or coercion during processing. Kept for
/// inspection, never silently discarded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Reject {
    pub kind: String,
    pub id: String,
    pub reason: String,
}

impl Reject {
    pub const HEADERS: [&'static str; 3] = ["kind", "id", "reason"];

    pub fn new(kind: &str, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Reject {
            kind: kind.to_string(),
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// One row of the scraping failure log.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FailureRecord {
    pub stage: String,
    pub id: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}
