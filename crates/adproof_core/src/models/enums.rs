//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// How a creative was supplied to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Raw ad markup pasted or loaded as a tag.
    Tag,
    /// Extracted zip bundle, referenced by a bundle-store key.
    Bundle,
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputType::Tag => write!(f, "tag"),
            InputType::Bundle => write!(f, "bundle"),
        }
    }
}

/// Per-item status inside a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Queued, not yet visited by a run.
    #[default]
    Pending,
    /// Creative is being loaded into the preview surface.
    Loading,
    /// Compliance checks are running.
    Checking,
    /// Countdown and capture are in progress.
    Recording,
    /// Proof pack is being generated.
    Processing,
    /// Finished successfully.
    Complete,
    /// Failed with an error message.
    Error,
    /// Run was cancelled while this item was in flight.
    ///
    /// Set only on the item a cancellation interrupted, so the queue does
    /// not keep showing it as loading or checking. It never counts as
    /// completed or failed and is cleared when the next run starts.
    Skipped,
}

impl ItemStatus {
    /// Get display string for UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Loading => "Loading",
            Self::Checking => "Checking",
            Self::Recording => "Recording",
            Self::Processing => "Processing",
            Self::Complete => "Complete",
            Self::Error => "Error",
            Self::Skipped => "Skipped",
        }
    }

    /// Whether the item has reached a terminal status for the current run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error | Self::Skipped)
    }
}

/// Outcome of the compliance checks for one creative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Pass,
    Fail,
    Warn,
    Pending,
}

impl ComplianceStatus {
    /// Collapse an inconclusive result into a terminal one.
    ///
    /// `Pending` (and a missing result) maps to `Warn`: an inconclusive
    /// check is never reported as a pass.
    pub fn resolve(status: Option<Self>) -> Self {
        match status {
            Some(Self::Pass) => Self::Pass,
            Some(Self::Fail) => Self::Fail,
            Some(Self::Warn) | Some(Self::Pending) | None => Self::Warn,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceStatus::Pass => write!(f, "pass"),
            ComplianceStatus::Fail => write!(f, "fail"),
            ComplianceStatus::Warn => write!(f, "warn"),
            ComplianceStatus::Pending => write!(f, "pending"),
        }
    }
}

/// Run-level phase of the batch orchestrator.
///
/// `Idle -> Preparing -> Processing -> {Complete | Cancelled | Error}`.
/// `Finalizing` is published between the last item and the completion
/// callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPhase {
    #[default]
    Idle,
    Preparing,
    Processing,
    Finalizing,
    Complete,
    Error,
    Cancelled,
}

impl BatchPhase {
    /// Whether a run has ended in this phase.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Complete | Self::Error | Self::Cancelled)
    }
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BatchPhase::Idle => "idle",
            BatchPhase::Preparing => "preparing",
            BatchPhase::Processing => "processing",
            BatchPhase::Finalizing => "finalizing",
            BatchPhase::Complete => "complete",
            BatchPhase::Error => "error",
            BatchPhase::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}
