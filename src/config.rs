use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

/// Pipeline settings. Defaults below; any field can be overridden through
/// the environment with a `WISATA_` prefix (e.g. `WISATA_THROTTLE_MS=5000`),
/// and the CLI path flags override both.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed list: CSV with `id,name,locality` columns.
    pub seeds_path: PathBuf,
    /// Append-only raw place store (CSV, one row per resolved place).
    pub places_path: PathBuf,
    /// Raw review store: one JSON document per place id.
    pub reviews_dir: PathBuf,
    /// Append-only failure/skip log shared by both scraping stages.
    pub failures_path: PathBuf,
    /// Processed datasets are regenerated wholesale under this directory.
    pub processed_dir: PathBuf,

    /// Delay between navigations, to stay under the service's radar.
    pub throttle_ms: u64,
    /// Per-navigation timeout; a slower action counts as a failure.
    pub timeout_ms: u64,
    /// Bounded retries for transient failures before a record is marked failed.
    pub max_retries: u32,
    /// Backoff base; actual wait is `base * 2^attempt`.
    pub base_backoff_ms: u64,

    /// Hard cap on review cards collected per place while scraping.
    pub max_reviews_per_place: usize,
    /// Per-place review cap in the processed dataset (stratified sample).
    pub max_reviews_processed: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            seeds_path: PathBuf::from("data/raw/seeds.csv"),
            places_path: PathBuf::from("data/raw/places.csv"),
            reviews_dir: PathBuf::from("data/raw/reviews"),
            failures_path: PathBuf::from("data/raw/failures.csv"),
            processed_dir: PathBuf::from("data/processed"),
            throttle_ms: 2_000,
            timeout_ms: 60_000,
            max_retries: 3,
            base_backoff_ms: 2_000,
            max_reviews_per_place: 400,
            max_reviews_processed: 150,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("WISATA").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert!(s.max_retries >= 1);
        assert!(s.max_reviews_processed <= s.max_reviews_per_place);
        assert!(s.throttle_ms > 0);
    }
}
