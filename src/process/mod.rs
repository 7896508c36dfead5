//! Stage three: clean, deduplicate and join the raw stores into the
//! processed datasets. Pure file-to-file transformation; running it twice
//! on unchanged raw stores produces identical output.

pub mod metrics;
pub mod passes;
pub mod sample;
pub mod text;
pub mod timeparse;

pub use passes::{run, ProcessOutcome};
