use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::model::{PlaceDocument, Reject};

/// Path of the per-place review document inside the store directory.
pub fn document_path(dir: &Path, place_id: &str) -> PathBuf {
    dir.join(format!("{}.json", sanitize_filename(place_id)))
}

pub fn exists(dir: &Path, place_id: &str) -> bool {
    document_path(dir, place_id).exists()
}

/// Write one place's review document. Pretty-printed so the raw store stays
/// hand-inspectable.
pub fn write_document(dir: &Path, doc: &PlaceDocument) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = document_path(dir, &doc.place.id);
    let json = serde_json::to_string_pretty(doc)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

/// Load every document in the store. Unreadable files are reported as
/// rejects, not dropped. An absent directory reads as an empty store: the
/// processor treats that as a soft condition.
pub fn load_all(dir: &Path) -> Result<(Vec<PlaceDocument>, Vec<Reject>)> {
    let mut docs = Vec::new();
    let mut rejects = Vec::new();
    if !dir.exists() {
        return Ok((docs, rejects));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    // Deterministic order regardless of directory listing order.
    paths.sort();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| serde_json::from_str::<PlaceDocument>(&raw).map_err(Into::into));
        match parsed {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                warn!(file = %name, error = %e, "unreadable review document");
                rejects.push(Reject::new("document", name, e.to_string()));
            }
        }
    }
    Ok((docs, rejects))
}

/// Keep alphanumerics, spaces, dashes and underscores; everything else is
/// dropped so place ids map to safe file names.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}
