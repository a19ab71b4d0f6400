//! Core types for the item pipeline.

use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;

use crate::config::TimingSettings;
use crate::logging::RunLogger;
use crate::models::{Artifact, BatchItem, ComplianceStatus};
use crate::queue::BundleLookup;
use crate::recording::Recorder;

use super::host::CreativeHost;
use super::progress::ProgressModel;

/// Timed holds used by the steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTiming {
    pub settle: Duration,
    pub countdown: Duration,
    pub countdown_tick: Duration,
    pub recording: Duration,
    pub compliance_grace: Duration,
    /// Per-item budget for the ETA estimate.
    pub item_budget: Duration,
    pub countdown_every_item: bool,
}

impl BatchTiming {
    /// Coarse ETA for `remaining` items. Never corrected by measured times.
    pub fn eta_ms(&self, remaining: usize) -> u64 {
        self.item_budget.as_millis() as u64 * remaining as u64
    }
}

impl From<&TimingSettings> for BatchTiming {
    fn from(settings: &TimingSettings) -> Self {
        Self {
            settle: Duration::from_millis(settings.settle_ms),
            countdown: Duration::from_millis(settings.countdown_ms),
            countdown_tick: Duration::from_millis(settings.countdown_tick_ms),
            recording: Duration::from_millis(settings.recording_ms),
            compliance_grace: Duration::from_millis(settings.compliance_grace_ms),
            item_budget: Duration::from_millis(settings.item_budget_ms),
            countdown_every_item: settings.countdown_every_item,
        }
    }
}

impl Default for BatchTiming {
    fn default() -> Self {
        Self::from(&TimingSettings::default())
    }
}

/// Read-only context passed to item steps.
///
/// Holds the item being processed and the run's shared resources. Mutable
/// results go in `ItemState`.
pub struct ItemContext<'a> {
    /// Position of the item in the queue.
    pub index: usize,
    /// Snapshot of the item taken when it became active.
    pub item: &'a BatchItem,
    pub host: &'a dyn CreativeHost,
    pub bundles: &'a dyn BundleLookup,
    /// The run's recorder; only the record step locks it.
    pub recorder: &'a AsyncMutex<Box<dyn Recorder>>,
    pub timing: &'a BatchTiming,
    pub logger: &'a RunLogger,
    pub progress: &'a ProgressModel,
    /// Show the countdown before this item's recording.
    pub countdown: bool,
    /// False in compliance-only runs.
    pub capture_enabled: bool,
}

impl ItemContext<'_> {
    /// Publish a status line for the active item.
    pub fn report_status(&self, status: impl Into<String>) {
        let status = status.into();
        self.progress.update(|p| p.current_item_status = status);
    }
}

/// Results accumulated by the steps of one item.
#[derive(Debug, Default)]
pub struct ItemState {
    /// The creative was loaded and signalled ready.
    pub loaded: bool,
    /// Resolved compliance status.
    pub compliance: Option<ComplianceStatus>,
    /// The recorder was started for this item.
    pub recording_started: bool,
    pub recording: Option<Artifact>,
    pub proof_pack: Option<Artifact>,
}

/// Outcome of a step's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped, with the reason.
    Skipped(String),
}
