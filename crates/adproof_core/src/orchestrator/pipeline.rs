//! Pipeline runner that executes item steps in sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::ItemStatus;

use super::errors::{PipelineError, PipelineResult};
use super::step::ItemStep;
use super::steps::{ComplianceStep, LoadStep, ProofPackStep, RecordStep};
use super::types::{ItemContext, ItemState, StepOutcome};

/// Pipeline that runs a sequence of steps for one item.
///
/// The cancel flag is sampled before every step, so a cancellation lands
/// after the load wait, after compliance, after the recorder stopped, or
/// before the next item starts.
pub struct ItemPipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn ItemStep>>,
}

impl ItemPipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Load → compliance → record → proof pack.
    pub fn standard() -> Self {
        Self::new()
            .with_step(LoadStep)
            .with_step(ComplianceStep)
            .with_step(RecordStep)
            .with_step(ProofPackStep)
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: ItemStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: ItemStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run every step for `ctx.item`.
    ///
    /// `on_step` is told the step name and status before each step starts.
    pub async fn run<F>(
        &self,
        ctx: &ItemContext<'_>,
        state: &mut ItemState,
        cancel: &CancelHandle,
        mut on_step: F,
    ) -> PipelineResult<PipelineRunResult>
    where
        F: FnMut(&str, ItemStatus) + Send,
    {
        let mut result = PipelineRunResult::default();
        let item_name = ctx.item.name.as_str();

        for step in &self.steps {
            let step_name = step.name();
            if cancel.is_cancelled() {
                ctx.logger
                    .warn(&format!("Cancelled before step '{}'", step_name));
                return Err(PipelineError::cancelled(item_name, step_name));
            }

            on_step(step_name, step.status());

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(item_name, step_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            let outcome = match step.execute(ctx, state).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    ctx.logger.error(&format!("{} failed: {}", step_name, e));
                    return Err(PipelineError::step_failed(item_name, step_name, e));
                }
            };

            match outcome {
                StepOutcome::Success => {
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(item_name, step_name, e));
                    }
                    ctx.logger.debug(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        Ok(result)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for ItemPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Handle for cancelling a running batch.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// The run stops at the next checkpoint; a hold in progress finishes first.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag. Called when a run starts.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }
}
