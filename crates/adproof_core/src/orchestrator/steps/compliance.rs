//! Compliance step - runs the external checks and resolves their result.

use async_trait::async_trait;

use crate::models::{ComplianceStatus, ItemStatus};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::ItemStep;
use crate::orchestrator::types::{ItemContext, ItemState, StepOutcome};

/// Runs compliance, waits out the grace interval, then reads the result.
///
/// A pending or missing result is recorded as `Warn`.
pub struct ComplianceStep;

#[async_trait]
impl ItemStep for ComplianceStep {
    fn name(&self) -> &str {
        "Compliance"
    }

    fn status(&self) -> ItemStatus {
        ItemStatus::Checking
    }

    fn validate_input(&self, _ctx: &ItemContext<'_>, state: &ItemState) -> StepResult<()> {
        if !state.loaded {
            return Err(StepError::invalid_input("Creative is not loaded"));
        }
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &ItemContext<'_>,
        state: &mut ItemState,
    ) -> StepResult<StepOutcome> {
        ctx.report_status(format!("Checking compliance of {}", ctx.item.name));
        ctx.host
            .run_compliance()
            .await
            .map_err(|e| StepError::collaborator("run_compliance", e))?;

        tokio::time::sleep(ctx.timing.compliance_grace).await;

        let report = ctx.host.compliance_result();
        let reported = report.as_ref().map(|r| r.status);
        let status = ComplianceStatus::resolve(reported);
        match reported {
            None => ctx.logger.warn("No compliance result; recording as warn"),
            Some(ComplianceStatus::Pending) => {
                ctx.logger.warn("Compliance still pending; recording as warn")
            }
            Some(_) => ctx.logger.info(&format!("Compliance: {}", status)),
        }
        if let Some(summary) = report.and_then(|r| r.summary) {
            ctx.logger.debug(&summary);
        }

        state.compliance = Some(status);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &ItemContext<'_>, state: &ItemState) -> StepResult<()> {
        match state.compliance {
            Some(status) if status.is_terminal() => Ok(()),
            _ => Err(StepError::invalid_output("Compliance status was not resolved")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchItem;
    use crate::orchestrator::test_support::{Harness, MockHost};

    async fn run_with(result: Option<ComplianceStatus>) -> ComplianceStatus {
        let host = MockHost::new();
        host.set_compliance(result);
        let harness = Harness::new(BatchItem::tag("A", "<div></div>", 300, 250));
        let mut state = ItemState {
            loaded: true,
            ..Default::default()
        };

        let ctx = harness.ctx(&host);
        ComplianceStep.execute(&ctx, &mut state).await.unwrap();
        ComplianceStep.validate_output(&ctx, &state).unwrap();
        assert_eq!(host.calls(), vec!["compliance"]);
        state.compliance.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn conclusive_results_are_kept() {
        assert_eq!(run_with(Some(ComplianceStatus::Pass)).await, ComplianceStatus::Pass);
        assert_eq!(run_with(Some(ComplianceStatus::Fail)).await, ComplianceStatus::Fail);
    }

    #[tokio::test(start_paused = true)]
    async fn inconclusive_results_become_warn() {
        assert_eq!(run_with(Some(ComplianceStatus::Pending)).await, ComplianceStatus::Warn);
        assert_eq!(run_with(None).await, ComplianceStatus::Warn);
    }

    #[test]
    fn requires_loaded_creative() {
        let host = MockHost::new();
        let harness = Harness::new(BatchItem::tag("A", "<div></div>", 300, 250));
        assert!(ComplianceStep
            .validate_input(&harness.ctx(&host), &ItemState::default())
            .is_err());
    }
}
