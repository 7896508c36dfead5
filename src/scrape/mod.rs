pub mod places;
pub mod reviews;

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// End-of-run accounting for a scraping stage. Per-record failures are
/// counted here and in the failure log; they never abort the batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ScrapeStats {
    pub fn print(&self, stage: &str) {
        println!(
            "{}: {} total ({} ok, {} skipped, {} failed)",
            stage, self.total, self.ok, self.skipped, self.failed
        );
    }
}

pub(crate) fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Exponential backoff wait for attempt `n` (0-based).
pub(crate) fn backoff(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(2u64.saturating_pow(attempt)))
}
