//! Record step - countdown, then a fixed-length recording of the creative.
//!
//! The countdown only runs before the first recording of a run unless
//! `countdown_every_item` is set. The recorder is stopped and its session
//! discarded whatever the outcome.

use async_trait::async_trait;

use crate::models::ItemStatus;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::ItemStep;
use crate::orchestrator::types::{ItemContext, ItemState, StepOutcome};

/// Records the creative for the configured duration.
pub struct RecordStep;

impl RecordStep {
    async fn countdown(ctx: &ItemContext<'_>) {
        let total = ctx.timing.countdown;
        let tick = ctx.timing.countdown_tick;
        if total.is_zero() {
            return;
        }
        if tick.is_zero() || tick >= total {
            ctx.report_status("Recording in 1...");
            tokio::time::sleep(total).await;
            return;
        }

        let ticks = (total.as_millis() / tick.as_millis()) as u32;
        for remaining in (1..=ticks).rev() {
            ctx.report_status(format!("Recording in {}...", remaining));
            tokio::time::sleep(tick).await;
        }
        let rest = total.saturating_sub(tick * ticks);
        if !rest.is_zero() {
            tokio::time::sleep(rest).await;
        }
    }
}

#[async_trait]
impl ItemStep for RecordStep {
    fn name(&self) -> &str {
        "Record"
    }

    fn status(&self) -> ItemStatus {
        ItemStatus::Recording
    }

    async fn execute(
        &self,
        ctx: &ItemContext<'_>,
        state: &mut ItemState,
    ) -> StepResult<StepOutcome> {
        if !ctx.capture_enabled {
            return Ok(StepOutcome::Skipped("Capture disabled".to_string()));
        }

        if ctx.countdown {
            Self::countdown(ctx).await;
        }

        let mut recorder = ctx.recorder.lock().await;
        state.recording_started = true;
        recorder.start().await?;
        ctx.report_status(format!("Recording {}", ctx.item.name));
        ctx.logger.info(&format!(
            "Recording for {} ms",
            ctx.timing.recording.as_millis()
        ));

        tokio::time::sleep(ctx.timing.recording).await;

        let artifact = recorder.stop().await?;
        ctx.logger.info(&format!("Recorded {} bytes", artifact.len()));
        state.recording = Some(artifact);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &ItemContext<'_>, state: &ItemState) -> StepResult<()> {
        match &state.recording {
            Some(artifact) if !artifact.is_empty() => Ok(()),
            _ => Err(StepError::invalid_output("Recording produced no artifact")),
        }
    }
}
