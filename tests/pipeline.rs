// End-to-end pipeline tests over a scripted driver: every navigation is
// answered from fixtures, everything else is the real stages and stores.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use wisata_scraper::config::Settings;
use wisata_scraper::driver::{MapsDriver, Resolution};
use wisata_scraper::error::DriverError;
use wisata_scraper::model::{PlaceRecord, PlaceSeed, RawReview};
use wisata_scraper::{process, scrape, store};

#[derive(Default)]
struct MockDriver {
    not_found: HashSet<String>,
    ambiguous: HashSet<String>,
    reviews: HashMap<String, Vec<RawReview>>,
    // Remaining transient failures per seed id before a call succeeds.
    transient: Mutex<HashMap<String, u32>>,
}

impl MockDriver {
    fn record_for(&self, seed: &PlaceSeed) -> PlaceRecord {
        PlaceRecord {
            id: seed.id.clone(),
            name: seed.name.clone(),
            address: format!("Jl. Raya, {}", seed.locality),
            latitude: Some(-6.3),
            longitude: Some(107.3),
            category: "Tempat wisata".into(),
            description: String::new(),
            attributes: String::new(),
            rating: Some(4.5),
            review_count: Some(100),
            maps_url: format!("https://www.google.com/maps/place/{}", seed.id),
            scraped_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    fn take_transient(&self, id: &str) -> bool {
        let mut transient = self.transient.lock().unwrap();
        match transient.get_mut(id) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl MapsDriver for MockDriver {
    async fn resolve_place(&self, seed: &PlaceSeed) -> Result<Resolution, DriverError> {
        if self.take_transient(&seed.id) {
            return Err(DriverError::RateLimited);
        }
        if self.not_found.contains(&seed.id) {
            return Err(DriverError::NotFound);
        }
        Ok(Resolution {
            record: self.record_for(seed),
            ambiguous: self.ambiguous.contains(&seed.id),
        })
    }

    async fn fetch_reviews(
        &self,
        place: &PlaceRecord,
        max: usize,
    ) -> Result<Vec<RawReview>, DriverError> {
        if self.take_transient(&place.id) {
            return Err(DriverError::Timeout);
        }
        let mut reviews = self.reviews.get(&place.id).cloned().unwrap_or_default();
        reviews.truncate(max);
        Ok(reviews)
    }
}

fn settings(dir: &TempDir) -> Settings {
    let root = dir.path();
    Settings {
        seeds_path: root.join("seeds.csv"),
        places_path: root.join("places.csv"),
        reviews_dir: root.join("reviews"),
        failures_path: root.join("failures.csv"),
        processed_dir: root.join("processed"),
        throttle_ms: 0,
        base_backoff_ms: 1,
        ..Settings::default()
    }
}

fn write_seeds(path: &Path, rows: &[(&str, &str, &str)]) {
    let mut content = String::from("id,name,locality\n");
    for (id, name, locality) in rows {
        content.push_str(&format!("{},{},{}\n", id, name, locality));
    }
    std::fs::write(path, content).unwrap();
}

fn review(author: &str, rating: u8, text: &str) -> RawReview {
    RawReview {
        author: author.into(),
        rating,
        text: text.into(),
        relative_time: "3 hari yang lalu".into(),
    }
}

#[tokio::test]
async fn scenario_one_seed_three_reviews() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir);
    write_seeds(&settings.seeds_path, &[("A", "Candi X", "Karawang")]);

    let driver = MockDriver {
        reviews: HashMap::from([(
            "A".to_string(),
            vec![
                review("Budi", 5, "Tenang dan bersih."),
                review("Siti", 4, "Bagus untuk keluarga."),
                review("Agus", 3, "Lumayan."),
            ],
        )]),
        ..Default::default()
    };

    let stats = scrape::places::run(&driver, &settings).await.unwrap();
    assert_eq!((stats.ok, stats.failed), (1, 0));

    let stats = scrape::reviews::run(&driver, &settings).await.unwrap();
    assert_eq!((stats.ok, stats.failed), (1, 0));

    let outcome = process::run(&settings).unwrap();
    assert_eq!(outcome.places, 1);
    assert_eq!(outcome.reviews, 3);
    assert_eq!(outcome.orphans, 0);

    let reviews = std::fs::read_to_string(settings.processed_dir.join("reviews.csv")).unwrap();
    let rows: Vec<&str> = reviews.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.starts_with("A,")));

    let places = std::fs::read_to_string(settings.processed_dir.join("places.csv")).unwrap();
    assert_eq!(places.lines().count(), 2);
    assert!(places.lines().nth(1).unwrap().starts_with("A,Candi X,"));
}

#[tokio::test]
async fn every_seed_lands_in_store_or_failure_log() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir);
    write_seeds(
        &settings.seeds_path,
        &[
            ("ok", "Curug Cigentis", "Karawang"),
            ("missing", "Tempat Hilang", "Karawang"),
            ("flaky", "Pantai Samudra", "Karawang"),
        ],
    );

    let driver = MockDriver {
        not_found: HashSet::from(["missing".to_string()]),
        // More transient failures than the retry budget allows.
        transient: Mutex::new(HashMap::from([("flaky".to_string(), 10)])),
        ..Default::default()
    };

    let stats = scrape::places::run(&driver, &settings).await.unwrap();
    assert_eq!((stats.ok, stats.failed), (1, 2));

    let store_ids = store::places::existing_ids(&settings.places_path).unwrap();
    let failure_ids: HashSet<String> = store::failures::load(&settings.failures_path)
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();

    for id in ["ok", "missing", "flaky"] {
        let in_store = store_ids.contains(id);
        let in_failures = failure_ids.contains(id);
        assert!(
            in_store != in_failures,
            "{} must be in exactly one of store/failure log",
            id
        );
    }
}

#[tokio::test]
async fn transient_failures_are_retried_within_budget() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir);
    write_seeds(&settings.seeds_path, &[("flaky", "Pantai", "Karawang")]);

    let driver = MockDriver {
        transient: Mutex::new(HashMap::from([("flaky".to_string(), 2)])),
        ..Default::default()
    };

    let stats = scrape::places::run(&driver, &settings).await.unwrap();
    assert_eq!((stats.ok, stats.failed), (1, 0));
    assert!(store::failures::load(&settings.failures_path)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn second_run_skips_scraped_seeds() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir);
    write_seeds(&settings.seeds_path, &[("A", "Candi X", "Karawang")]);

    let driver = MockDriver::default();
    scrape::places::run(&driver, &settings).await.unwrap();
    let stats = scrape::places::run(&driver, &settings).await.unwrap();
    assert_eq!((stats.ok, stats.skipped), (0, 1));

    // Still exactly one data row in the store.
    let content = std::fs::read_to_string(&settings.places_path).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn review_stage_writes_empty_documents_and_skips_existing() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir);
    write_seeds(&settings.seeds_path, &[("A", "Candi X", "Karawang")]);

    let driver = MockDriver::default();
    scrape::places::run(&driver, &settings).await.unwrap();

    let stats = scrape::reviews::run(&driver, &settings).await.unwrap();
    assert_eq!(stats.ok, 1);
    let (docs, _) = store::reviews::load_all(&settings.reviews_dir).unwrap();
    assert_eq!(docs.len(), 1);
    assert!(docs[0].reviews.is_empty());

    let stats = scrape::reviews::run(&driver, &settings).await.unwrap();
    assert_eq!((stats.ok, stats.skipped), (0, 1));
}

#[tokio::test]
async fn missing_seed_file_is_a_stage_error() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir);
    let driver = MockDriver::default();
    assert!(scrape::places::run(&driver, &settings).await.is_err());
}

#[tokio::test]
async fn review_cap_truncates_collected_reviews() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings(&dir);
    settings.max_reviews_per_place = 2;
    write_seeds(&settings.seeds_path, &[("A", "Candi X", "Karawang")]);

    let driver = MockDriver {
        reviews: HashMap::from([(
            "A".to_string(),
            (0..10)
                .map(|n| review(&format!("user{}", n), 5, "bagus"))
                .collect(),
        )]),
        ..Default::default()
    };

    scrape::places::run(&driver, &settings).await.unwrap();
    scrape::reviews::run(&driver, &settings).await.unwrap();

    let (docs, _) = store::reviews::load_all(&settings.reviews_dir).unwrap();
    assert_eq!(docs[0].reviews.len(), 2);
}
