use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::PipelineError;
use crate::model::{PlaceRecord, Reject};

/// Append-only writer over the raw place store. The header row is written
/// once, when the file is created; every later run just appends, so history
/// across runs is preserved and interrupting a run never corrupts the file
/// beyond the row being written.
pub struct PlaceStore {
    writer: csv::Writer<std::fs::File>,
}

impl PlaceStore {
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
            .with_context(|| format!("failed to open place store {:?}", path))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(PlaceRecord::HEADERS)?;
        }
        Ok(PlaceStore { writer })
    }

    pub fn append(&mut self, record: &PlaceRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Ids already present in the store, for skip-if-scraped. Tolerates rows
/// that would fail full deserialization; only the id column matters here.
pub fn existing_ids(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let id_idx = rdr
        .headers()?
        .iter()
        .position(|h| h == "id")
        .unwrap_or(0);

    let mut ids = HashSet::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(id) = record.get(id_idx) {
            if !id.is_empty() {
                ids.insert(id.to_string());
            }
        }
    }
    Ok(ids)
}

/// Load the full store, routing rows that fail type coercion into the
/// rejects list instead of aborting. A missing or header-only store is a
/// structural error for the stages that require it.
pub fn load_lenient(path: &Path) -> Result<(Vec<PlaceRecord>, Vec<Reject>)> {
    let empty = || -> anyhow::Error {
        PipelineError::EmptyInput {
            path: path.to_path_buf(),
        }
        .into()
    };
    if !path.exists() {
        return Err(empty());
    }

    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open place store {:?}", path))?;

    let mut records = Vec::new();
    let mut rejects = Vec::new();
    for (i, result) in rdr.deserialize::<PlaceRecord>().enumerate() {
        // Header is line 1; first data row is line 2.
        let line = i + 2;
        match result {
            Ok(record) if record.id.trim().is_empty() => {
                rejects.push(Reject::new("place", format!("line {}", line), "missing id"));
            }
            Ok(record) => records.push(record),
            Err(e) => {
                rejects.push(Reject::new("place", format!("line {}", line), e.to_string()));
            }
        }
    }

    if records.is_empty() && rejects.is_empty() {
        return Err(empty());
    }
    Ok((records, rejects))
}
