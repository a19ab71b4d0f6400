//! Error types for the batch orchestrator.
//!
//! Errors carry context that chains through layers:
//! Run → Item → Step → Collaborator

use thiserror::Error;

use crate::capture::CaptureError;
use crate::recording::RecordingError;

/// Run-level failure. Nothing here is ever recorded on an item.
#[derive(Error, Debug)]
pub enum BatchError {
    /// `start_processing` was called on an empty queue.
    #[error("Queue is empty")]
    EmptyQueue,

    /// A run is already in progress.
    #[error("A batch run is already in progress")]
    AlreadyRunning,

    /// Capture permission could not be obtained.
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Per-item pipeline result.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed; the item is marked as errored.
    #[error("Item '{item_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        item_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// The cancel flag was observed before a step. Not an error outcome.
    #[error("Item '{item_name}' was cancelled before step '{step_name}'")]
    Cancelled { item_name: String, step_name: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        item_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            item_name: item_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a cancelled result.
    pub fn cancelled(item_name: impl Into<String>, step_name: impl Into<String>) -> Self {
        Self::Cancelled {
            item_name: item_name.into(),
            step_name: step_name.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Error from one item step.
#[derive(Error, Debug)]
pub enum StepError {
    /// A bundle item references a key missing from bundle storage.
    #[error("Bundle not found: {key}")]
    BundleNotFound { key: String },

    /// Recording failed (no data, not prepared, encoder failure).
    #[error(transparent)]
    Recording(#[from] RecordingError),

    /// A host collaborator failed; the message is kept verbatim.
    #[error("{message}")]
    Collaborator { operation: String, message: String },

    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),
}

impl StepError {
    /// Create a bundle not found error.
    pub fn bundle_not_found(key: impl Into<String>) -> Self {
        Self::BundleNotFound { key: key.into() }
    }

    /// Wrap a collaborator failure.
    pub fn collaborator(operation: impl Into<String>, error: anyhow::Error) -> Self {
        Self::Collaborator {
            operation: operation.into(),
            message: error.to_string(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
