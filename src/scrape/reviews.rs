//! Stage two: fetch reviews for every place in the raw place store and
//! write one JSON document per place id.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::driver::MapsDriver;
use crate::error::DriverError;
use crate::model::{PlaceDocument, PlaceRecord, RawReview};
use crate::scrape::{backoff, progress_bar, ScrapeStats};
use crate::store::{failures::FailureLog, places, reviews};

pub async fn run(driver: &dyn MapsDriver, settings: &Settings) -> Result<ScrapeStats> {
    let (rows, bad_rows) = places::load_lenient(&settings.places_path)?;
    for reject in &bad_rows {
        warn!(row = %reject.id, reason = %reject.reason, "skipping unreadable place row");
    }

    // The store is append-only across runs; scrape reviews once per id,
    // against the most recent record of the place.
    let mut latest: HashMap<String, PlaceRecord> = HashMap::new();
    for row in rows {
        match latest.get(&row.id) {
            Some(kept) if kept.scraped_at >= row.scraped_at => {}
            _ => {
                latest.insert(row.id.clone(), row);
            }
        }
    }
    let mut places: Vec<PlaceRecord> = latest.into_values().collect();
    places.sort_by(|a, b| a.id.cmp(&b.id));

    let mut failures = FailureLog::open_append(&settings.failures_path)?;
    let mut stats = ScrapeStats {
        total: places.len(),
        ..Default::default()
    };
    let pb = progress_bar(places.len())?;
    let throttle = Duration::from_millis(settings.throttle_ms);

    for place in &places {
        if reviews::exists(&settings.reviews_dir, &place.id) {
            debug!(id = %place.id, "review document exists, skipping");
            stats.skipped += 1;
            pb.inc(1);
            continue;
        }

        match fetch_with_retry(driver, place, settings).await {
            Ok(collected) => {
                let doc = PlaceDocument {
                    place: place.clone(),
                    reviews: collected,
                };
                reviews::write_document(&settings.reviews_dir, &doc)?;
                debug!(id = %place.id, count = doc.reviews.len(), "saved review document");
                stats.ok += 1;
            }
            Err(e) => {
                warn!(id = %place.id, error = %e, "place failed, continuing batch");
                failures.record("reviews", &place.id, &e.to_string())?;
                stats.failed += 1;
            }
        }

        pb.inc(1);
        tokio::time::sleep(throttle).await;
    }

    pb.finish_and_clear();
    info!(
        total = stats.total,
        ok = stats.ok,
        skipped = stats.skipped,
        failed = stats.failed,
        "review scraping finished"
    );
    Ok(stats)
}

async fn fetch_with_retry(
    driver: &dyn MapsDriver,
    place: &PlaceRecord,
    settings: &Settings,
) -> Result<Vec<RawReview>, DriverError> {
    for attempt in 0..=settings.max_retries {
        match driver
            .fetch_reviews(place, settings.max_reviews_per_place)
            .await
        {
            Ok(collected) => return Ok(collected),
            Err(e) if e.is_transient() && attempt < settings.max_retries => {
                let wait = backoff(settings.base_backoff_ms, attempt);
                warn!(
                    id = %place.id,
                    attempt = attempt + 1,
                    max = settings.max_retries,
                    wait_s = wait.as_secs_f64(),
                    error = %e,
                    "transient failure, backing off"
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
    unreachable!("retry loop always returns")
}
