// Google Maps tourism scraper + processing pipeline.
//
// Three file-decoupled stages: scrape place listings into an append-only
// CSV store, scrape reviews into one JSON document per place, then clean
// and join both stores into the processed datasets.

pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod process;
pub mod scrape;
pub mod store;

pub use config::Settings;
pub use driver::{MapsDriver, Resolution};
pub use error::{DriverError, PipelineError};
pub use model::{PlaceDocument, PlaceRecord, PlaceSeed, RawReview};
