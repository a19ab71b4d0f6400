//! Item step trait definition.
//!
//! Every phase an item passes through implements this trait, providing a
//! consistent interface for validation and execution.

use async_trait::async_trait;

use crate::models::ItemStatus;

use super::errors::StepResult;
use super::types::{ItemContext, ItemState, StepOutcome};

/// Trait for item pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
///
/// The item's status is set to `status()` before `validate_input` runs.
#[async_trait]
pub trait ItemStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Status the item is in while this step runs.
    fn status(&self) -> ItemStatus;

    /// Validate inputs before execution.
    fn validate_input(&self, _ctx: &ItemContext<'_>, _state: &ItemState) -> StepResult<()> {
        Ok(())
    }

    /// Execute the step's main work and record results in `state`.
    ///
    /// Returns `StepOutcome::Skipped` if the step decided not to run.
    async fn execute(&self, ctx: &ItemContext<'_>, state: &mut ItemState)
        -> StepResult<StepOutcome>;

    /// Validate outputs after a successful execution.
    fn validate_output(&self, _ctx: &ItemContext<'_>, _state: &ItemState) -> StepResult<()> {
        Ok(())
    }
}
