//! Batch queue and bundle storage.
//!
//! This module provides:
//! - `BatchQueue`: ordered queue of creatives; edits are rejected while a run is active
//! - `BundleStore` / `BundleLookup`: extracted zip bundles referenced by key

mod bundles;
#[allow(clippy::module_inception)]
mod queue;

pub use bundles::{BundleLookup, BundleStore, ExtractedBundle};
pub use queue::{BatchQueue, BatchState, QueueError, QueueResult};
