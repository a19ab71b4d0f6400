//! AdProof Core - batch capture pipeline for ad-creative QA
//!
//! This crate contains the queue, capture, recording and orchestration logic
//! with zero UI dependencies. The preview surface and compliance checker are
//! supplied by the embedding application through [`orchestrator::CreativeHost`].

pub mod capture;
pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod queue;
pub mod recording;

pub use orchestrator::{BatchError, BatchOrchestrator, CancelHandle, CreativeHost};
pub use queue::{BatchQueue, BundleStore};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
