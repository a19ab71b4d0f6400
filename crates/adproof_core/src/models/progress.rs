//! Progress snapshot consumed by presentation layers.

use serde::{Deserialize, Serialize};

use super::enums::{BatchPhase, ComplianceStatus};

/// Summary of an item that completed its pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedItem {
    pub id: String,
    pub name: String,
    pub compliance_status: ComplianceStatus,
    pub processing_time_ms: u64,
}

/// Summary of an item that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemErrorSummary {
    pub id: String,
    pub name: String,
    pub message: String,
}

/// Continuously updated view of a batch run.
///
/// `completed` and `errors` are append-only during a run and reset when
/// the next run starts. `estimated_time_remaining_ms` is a coarse budget
/// estimate, not a measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub phase: BatchPhase,
    /// Index of the active item.
    pub current_item: Option<usize>,
    pub total_items: usize,
    /// Human-readable status line for the active item.
    pub current_item_status: String,
    pub estimated_time_remaining_ms: u64,
    pub completed: Vec<CompletedItem>,
    pub errors: Vec<ItemErrorSummary>,
    /// Message for a run-level failure (phase `Error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_error: Option<String>,
}

impl BatchProgress {
    /// Fresh snapshot for a run over `total_items` items.
    pub fn starting(total_items: usize) -> Self {
        Self {
            phase: BatchPhase::Preparing,
            total_items,
            ..Default::default()
        }
    }

    /// Number of items that reached a terminal outcome.
    pub fn finished_count(&self) -> usize {
        self.completed.len() + self.errors.len()
    }

    /// Fraction of the run that is done, in `0.0..=1.0`.
    pub fn fraction_done(&self) -> f64 {
        if self.total_items == 0 {
            return 0.0;
        }
        self.finished_count() as f64 / self.total_items as f64
    }
}
