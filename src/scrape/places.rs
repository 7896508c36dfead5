//! Stage one: resolve every seed against the maps service and append one
//! row per place to the raw place store.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::driver::{MapsDriver, Resolution};
use crate::error::DriverError;
use crate::model::PlaceSeed;
use crate::scrape::{backoff, progress_bar, ScrapeStats};
use crate::store::{failures::FailureLog, places, seeds};

pub async fn run(driver: &dyn MapsDriver, settings: &Settings) -> Result<ScrapeStats> {
    let seed_list = seeds::load(&settings.seeds_path)?;
    let existing = places::existing_ids(&settings.places_path)?;

    let mut store = places::PlaceStore::open_append(&settings.places_path)?;
    let mut failures = FailureLog::open_append(&settings.failures_path)?;

    let mut stats = ScrapeStats {
        total: seed_list.len(),
        ..Default::default()
    };
    let pb = progress_bar(seed_list.len())?;
    let throttle = Duration::from_millis(settings.throttle_ms);

    for seed in &seed_list {
        if existing.contains(&seed.id) {
            debug!(id = %seed.id, "already in place store, skipping");
            stats.skipped += 1;
            pb.inc(1);
            continue;
        }

        match resolve_with_retry(driver, seed, settings).await {
            Ok(resolution) => {
                if resolution.ambiguous {
                    warn!(
                        id = %seed.id,
                        query = %seed.query(),
                        "query matched multiple candidates, kept first result"
                    );
                }
                store.append(&resolution.record)?;
                stats.ok += 1;
            }
            Err(e) => {
                warn!(id = %seed.id, error = %e, "seed failed, continuing batch");
                failures.record("places", &seed.id, &e.to_string())?;
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
        "place scraping finished"
    );
    Ok(stats)
}

/// Bounded retry with exponential backoff, transient failures only.
/// Resolution failures (not found, blocked) are terminal for the seed.
async fn resolve_with_retry(
    driver: &dyn MapsDriver,
    seed: &PlaceSeed,
    settings: &Settings,
) -> Result<Resolution, DriverError> {
    for attempt in 0..=settings.max_retries {
        match driver.resolve_place(seed).await {
            Ok(resolution) => return Ok(resolution),
            Err(e) if e.is_transient() && attempt < settings.max_retries => {
                let wait = backoff(settings.base_backoff_ms, attempt);
                warn!(
                    id = %seed.id,
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
