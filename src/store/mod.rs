//! Flat-file stores. Each store is owned by the stage that writes it:
//! raw stores are append-only, processed output is atomic-replace, and
//! downstream stages only ever read upstream stores.

pub mod failures;
pub mod places;
pub mod processed;
pub mod reviews;
pub mod seeds;
