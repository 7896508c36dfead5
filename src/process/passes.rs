//! The processing run, as ordered passes over the raw stores:
//! dedup places, coerce/validate, normalize text, clean + sample reviews,
//! join, emit. Every pass reports its in/kept counts; everything removed
//! for cause lands in the rejects or orphans datasets.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Settings;
use crate::model::{PlaceDocument, PlaceRecord, ProcessedPlace, ProcessedReview, Reject};
use crate::process::metrics::PassTracker;
use crate::process::{sample, text, timeparse};
use crate::store::{places, processed, reviews};

#[derive(Debug, Default)]
pub struct ProcessOutcome {
    pub places: usize,
    pub reviews: usize,
    pub rejects: usize,
    pub orphans: usize,
}

impl ProcessOutcome {
    pub fn print(&self) {
        println!(
            "Processed {} places, {} reviews ({} rejects, {} orphaned reviews).",
            self.places, self.reviews, self.rejects, self.orphans
        );
    }
}

pub fn run(settings: &Settings) -> Result<ProcessOutcome> {
    let mut tracker = PassTracker::new();
    let mut rejects: Vec<Reject> = Vec::new();

    // Pass 1: load + dedup places, newest scrape wins per id.
    let (rows, bad_rows) = places::load_lenient(&settings.places_path)?;
    let loaded = rows.len() + bad_rows.len();
    rejects.extend(bad_rows);
    let deduped = dedup_places(rows);
    tracker.record("dedup_places", loaded, deduped.len());

    // Pass 2: coerce + normalize into the processed place schema.
    let dedup_len = deduped.len();
    let mut clean_places = Vec::with_capacity(dedup_len);
    for record in deduped {
        match coerce_place(record) {
            Ok(place) => clean_places.push(place),
            Err(reject) => rejects.push(reject),
        }
    }
    tracker.record("coerce_places", dedup_len, clean_places.len());
    clean_places.sort_by(|a, b| a.id.cmp(&b.id));

    // Pass 3: load review documents, clean + dedup + sample per place.
    let (docs, doc_rejects) = reviews::load_all(&settings.reviews_dir)?;
    rejects.extend(doc_rejects);

    let mut reviews_by_place: BTreeMap<String, Vec<ProcessedReview>> = BTreeMap::new();
    let mut raw_review_count = 0;
    for doc in docs {
        raw_review_count += doc.reviews.len();
        let place_id = doc.place.id.clone();
        let cleaned = clean_reviews(&doc, &mut rejects);
        let sampled = sample::stratified_sample(
            cleaned,
            settings.max_reviews_processed,
            sample::place_seed(&place_id),
        );
        reviews_by_place.insert(place_id, sampled);
    }
    let cleaned_total: usize = reviews_by_place.values().map(Vec::len).sum();
    tracker.record("clean_reviews", raw_review_count, cleaned_total);

    // Pass 4: join reviews to places; a review set whose place is absent is
    // orphaned and reported, never dropped.
    let place_ids: HashSet<&str> = clean_places.iter().map(|p| p.id.as_str()).collect();
    let mut joined = Vec::new();
    let mut orphans = Vec::new();
    for (place_id, rows) in reviews_by_place {
        if place_ids.contains(place_id.as_str()) {
            joined.extend(rows);
        } else {
            warn!(id = %place_id, count = rows.len(), "reviews reference a place with no record");
            orphans.extend(rows);
        }
    }
    tracker.record("join_reviews", cleaned_total, joined.len());

    // Pass 5: atomic emit.
    let out = |name: &str| settings.processed_dir.join(name);
    processed::write_csv(&out("places.csv"), &ProcessedPlace::HEADERS, &clean_places)?;
    processed::write_csv(&out("reviews.csv"), &ProcessedReview::HEADERS, &joined)?;
    processed::write_csv(&out("rejects.csv"), &Reject::HEADERS, &rejects)?;
    processed::write_csv(&out("orphan_reviews.csv"), &ProcessedReview::HEADERS, &orphans)?;

    let outcome = ProcessOutcome {
        places: clean_places.len(),
        reviews: joined.len(),
        rejects: rejects.len(),
        orphans: orphans.len(),
    };
    info!(
        places = outcome.places,
        reviews = outcome.reviews,
        rejects = outcome.rejects,
        orphans = outcome.orphans,
        "processing finished"
    );
    Ok(outcome)
}

/// Keep the most recent scrape of each place id.
fn dedup_places(rows: Vec<PlaceRecord>) -> Vec<PlaceRecord> {
    let mut latest: HashMap<String, PlaceRecord> = HashMap::new();
    for row in rows {
        match latest.get(&row.id) {
            Some(kept) if kept.scraped_at >= row.scraped_at => {}
            _ => {
                latest.insert(row.id.clone(), row);
            }
        }
    }
    let mut out: Vec<PlaceRecord> = latest.into_values().collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

/// Coerce one raw place row into the processed schema. Bounded fields out
/// of range are rejects; absent optionals default the way the upstream
/// data does (no rating reads as 0).
fn coerce_place(record: PlaceRecord) -> Result<ProcessedPlace, Reject> {
    let rating = record.rating.unwrap_or(0.0);
    if !(0.0..=5.0).contains(&rating) {
        return Err(Reject::new(
            "place",
            record.id,
            format!("rating {} out of 0-5 range", rating),
        ));
    }
    if record.latitude.is_some() != record.longitude.is_some() {
        return Err(Reject::new(
            "place",
            record.id,
            "incomplete coordinate pair",
        ));
    }
    if let (Some(lat), Some(lng)) = (record.latitude, record.longitude) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(Reject::new(
                "place",
                record.id,
                format!("coordinates ({}, {}) out of range", lat, lng),
            ));
        }
    }

    Ok(ProcessedPlace {
        id: record.id,
        name: text::clean_text(&record.name),
        category: text::clean_text(&record.category),
        address: text::clean_text(&record.address),
        latitude: record.latitude,
        longitude: record.longitude,
        description: text::clean_text(&record.description),
        attributes: text::clean_attributes(&record.attributes),
        rating,
        review_count: record.review_count.unwrap_or(0),
        scraped_at: record.scraped_at,
    })
}

/// Clean one document's reviews: normalize text, drop empties, dedup by
/// (author, text) signature, validate the rating bound, anonymize, and
/// resolve the relative timestamp against the document's scrape time.
fn clean_reviews(doc: &PlaceDocument, rejects: &mut Vec<Reject>) -> Vec<ProcessedReview> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();

    for review in &doc.reviews {
        let author = text::clean_text(&review.author);
        let cleaned = text::clean_text(&review.text);
        if cleaned.is_empty() {
            continue;
        }
        let signature = (author.clone(), cleaned.clone());
        if !seen.insert(signature) {
            continue;
        }
        if review.rating > 5 {
            rejects.push(Reject::new(
                "review",
                doc.place.id.clone(),
                format!("rating {} out of 0-5 range", review.rating),
            ));
            continue;
        }

        out.push(ProcessedReview {
            place_id: doc.place.id.clone(),
            reviewer: text::anonymize_author(&author),
            rating: review.rating,
            text: cleaned,
            review_date: timeparse::resolve_to_iso(&review.relative_time, doc.place.scraped_at),
        });
    }
    out
}
