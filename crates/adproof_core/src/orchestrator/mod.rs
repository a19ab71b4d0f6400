//! Batch orchestrator for running queued creatives end to end.
//!
//! A run acquires capture permission once, then walks the queue strictly in
//! order. Each item goes through a pipeline of steps that validate, execute
//! and record their results; a failed item is marked and the run moves on.
//!
//! # Architecture
//!
//! ```text
//! BatchOrchestrator
//!     ├── prepare recorder (once per run)
//!     └── for each item: ItemPipeline
//!             ├── Step: Load
//!             ├── Step: Compliance
//!             ├── Step: Record
//!             └── Step: Proof pack
//! ```
//!
//! # Example
//!
//! ```ignore
//! use adproof_core::orchestrator::BatchOrchestrator;
//!
//! let mut orchestrator = BatchOrchestrator::new(settings, host, bundles, recorder)
//!     .with_log_dir(".logs");
//! orchestrator.queue_mut().add_tag("Leaderboard", markup, 728, 90)?;
//!
//! let progress = orchestrator.start_processing().await?;
//! println!("{} complete, {} failed", progress.completed.len(), progress.errors.len());
//! ```

mod batch;
mod errors;
mod host;
mod pipeline;
mod progress;
mod step;
pub mod steps;
#[cfg(test)]
pub(crate) mod test_support;
mod types;

pub use batch::{BatchOrchestrator, SharedLogCallback};
pub use errors::{BatchError, PipelineError, PipelineResult, StepError, StepResult};
pub use host::{CompletionCallback, ComplianceReport, CreativeHost};
pub use pipeline::{CancelHandle, ItemPipeline, PipelineRunResult};
pub use progress::ProgressModel;
pub use step::ItemStep;
pub use steps::{ComplianceStep, LoadStep, ProofPackStep, RecordStep};
pub use types::{BatchTiming, ItemContext, ItemState, StepOutcome};
