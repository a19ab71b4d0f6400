//! Proof pack step - hands the recording to the proof-pack builder.

use async_trait::async_trait;

use crate::models::ItemStatus;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::ItemStep;
use crate::orchestrator::types::{ItemContext, ItemState, StepOutcome};

/// Generates the proof pack. A `None` result is allowed.
pub struct ProofPackStep;

#[async_trait]
impl ItemStep for ProofPackStep {
    fn name(&self) -> &str {
        "Proof pack"
    }

    fn status(&self) -> ItemStatus {
        ItemStatus::Processing
    }

    async fn execute(
        &self,
        ctx: &ItemContext<'_>,
        state: &mut ItemState,
    ) -> StepResult<StepOutcome> {
        ctx.report_status(format!("Generating proof pack for {}", ctx.item.name));
        let pack = ctx
            .host
            .generate_proof_pack(ctx.item, state.recording.as_ref())
            .await
            .map_err(|e| StepError::collaborator("generate_proof_pack", e))?;

        match &pack {
            Some(artifact) => ctx.logger.info(&format!(
                "Proof pack ready ({}, {} bytes)",
                artifact.mime_type,
                artifact.len()
            )),
            None => ctx.logger.info("No proof pack produced"),
        }
        state.proof_pack = pack;
        Ok(StepOutcome::Success)
    }
}
