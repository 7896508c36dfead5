use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Write a processed dataset atomically: serialize into `<name>.tmp` next
/// to the target, then rename over it. A failure mid-write leaves the
/// previous output intact. An empty row set still gets its header row, so
/// an empty dataset is a real, schema-bearing file.
pub fn write_csv<S: Serialize>(path: &Path, headers: &[&str], rows: &[S]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("processed output path has no file name")?;
    let tmp = parent.join(format!("{}.tmp", file_name));

    {
        let mut writer = csv::Writer::from_path(&tmp)
            .with_context(|| format!("failed to create {:?}", tmp))?;
        if rows.is_empty() {
            writer.write_record(headers)?;
        } else {
            for row in rows {
                writer.serialize(row)?;
            }
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move {:?} into place", tmp))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProcessedReview;

    fn review(place_id: &str) -> ProcessedReview {
        ProcessedReview {
            place_id: place_id.into(),
            reviewer: "ab12cd34ef".into(),
            rating: 5,
            text: "Bagus".into(),
            review_date: "2025-01-01".into(),
        }
    }

    #[test]
    fn empty_dataset_still_has_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        let rows: Vec<ProcessedReview> = Vec::new();
        write_csv(&path, &ProcessedReview::HEADERS, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), ProcessedReview::HEADERS.join(","));
    }

    #[test]
    fn replaces_previous_output_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        write_csv(&path, &ProcessedReview::HEADERS, &[review("a"), review("b")]).unwrap();
        write_csv(&path, &ProcessedReview::HEADERS, &[review("c")]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("c,ab12cd34ef"));
        assert!(!content.contains("a,ab12cd34ef"));
        assert!(!dir.path().join("reviews.csv.tmp").exists());
    }
}
