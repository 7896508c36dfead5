use std::path::Path;

use anyhow::{Context, Result};

use crate::error::PipelineError;
use crate::model::PlaceSeed;

/// Load the seed list. A missing or empty seed file is a structural error:
/// there is nothing the place stage could do with it.
pub fn load(path: &Path) -> Result<Vec<PlaceSeed>> {
    if !path.exists() {
        return Err(PipelineError::EmptyInput {
            path: path.to_path_buf(),
        }
        .into());
    }

    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open seed file {:?}", path))?;

    let mut seeds = Vec::new();
    for result in rdr.deserialize() {
        let seed: PlaceSeed = result.context("failed to parse seed row")?;
        seeds.push(seed);
    }

    if seeds.is_empty() {
        return Err(PipelineError::EmptyInput {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(seeds)
}
