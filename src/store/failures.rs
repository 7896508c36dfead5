use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::model::FailureRecord;

const HEADERS: [&str; 4] = ["stage", "id", "reason", "at"];

/// Append-only failure/skip log shared by the scraping stages. Every seed
/// or place that could not be scraped ends up here with a reason, so a run
/// accounts for each input exactly once: place store or failure log.
pub struct FailureLog {
    writer: csv::Writer<std::fs::File>,
}

impl FailureLog {
    pub fn open_append(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open failure log {:?}", path))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADERS)?;
        }
        Ok(FailureLog { writer })
    }

    pub fn record(&mut self, stage: &str, id: &str, reason: &str) -> Result<()> {
        self.writer.serialize(FailureRecord {
            stage: stage.to_string(),
            id: id.to_string(),
            reason: reason.to_string(),
            at: Utc::now(),
        })?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn load(path: &Path) -> Result<Vec<FailureRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.csv");

        let mut log = FailureLog::open_append(&path).unwrap();
        log.record("places", "a", "place not found").unwrap();
        drop(log);

        let mut log = FailureLog::open_append(&path).unwrap();
        log.record("reviews", "b", "navigation timed out").unwrap();
        drop(log);

        let records = load(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stage, "places");
        assert_eq!(records[1].id, "b");
    }
}
