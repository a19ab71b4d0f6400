//! Data models for AdProof.
//!
//! This module contains the core data structures shared by the queue,
//! the orchestrator and presentation layers:
//! - Enums for input type, item status, compliance and run phase
//! - Queue items and binary artifacts
//! - The progress snapshot

mod enums;
mod item;
mod progress;

pub use enums::{BatchPhase, ComplianceStatus, InputType, ItemStatus};
pub use item::{Artifact, BatchItem};
pub use progress::{BatchProgress, CompletedItem, ItemErrorSummary};
