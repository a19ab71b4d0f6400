//! Load step - puts the creative into the preview and waits for it to settle.
//!
//! Tag items are loaded from their markup. Bundle items are resolved through
//! bundle storage first; a missing key fails the item with `BundleNotFound`.

use async_trait::async_trait;

use crate::models::{InputType, ItemStatus};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::ItemStep;
use crate::orchestrator::types::{ItemContext, ItemState, StepOutcome};

/// Loads the creative, waits for its ready signal, then holds for the settle interval.
pub struct LoadStep;

#[async_trait]
impl ItemStep for LoadStep {
    fn name(&self) -> &str {
        "Load"
    }

    fn status(&self) -> ItemStatus {
        ItemStatus::Loading
    }

    fn validate_input(&self, ctx: &ItemContext<'_>, _state: &ItemState) -> StepResult<()> {
        if ctx.item.content.trim().is_empty() {
            return Err(StepError::invalid_input(format!(
                "Item '{}' has no content",
                ctx.item.name
            )));
        }
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &ItemContext<'_>,
        state: &mut ItemState,
    ) -> StepResult<StepOutcome> {
        let item = ctx.item;
        ctx.report_status(format!("Loading {} ({})", item.name, item.size_label()));

        match item.input_type {
            InputType::Tag => {
                ctx.logger.info(&format!(
                    "Item {}: loading tag at {}",
                    ctx.index + 1,
                    item.size_label()
                ));
                ctx.host
                    .load_tag(&item.content, item.width, item.height)
                    .await
                    .map_err(|e| StepError::collaborator("load_tag", e))?;
            }
            InputType::Bundle => {
                let bundle = ctx
                    .bundles
                    .lookup(&item.content)
                    .ok_or_else(|| StepError::bundle_not_found(&item.content))?;
                if !bundle.has_entry_point() {
                    return Err(StepError::invalid_input(format!(
                        "Bundle '{}' has no entry point '{}'",
                        item.content, bundle.entry_point
                    )));
                }
                ctx.logger.info(&format!(
                    "Item {}: loading bundle '{}' ({} files, entry {})",
                    ctx.index + 1,
                    item.content,
                    bundle.files.len(),
                    bundle.entry_point
                ));
                ctx.host
                    .load_bundle(&bundle, item.width, item.height)
                    .await
                    .map_err(|e| StepError::collaborator("load_bundle", e))?;
            }
        }

        ctx.report_status(format!("Waiting for {} to signal ready", item.name));
        ctx.host
            .wait_for_ad_ready()
            .await
            .map_err(|e| StepError::collaborator("wait_for_ad_ready", e))?;

        ctx.report_status(format!("Settling {}", item.name));
        tokio::time::sleep(ctx.timing.settle).await;

        state.loaded = true;
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &ItemContext<'_>, state: &ItemState) -> StepResult<()> {
        if !state.loaded {
            return Err(StepError::invalid_output("Creative was not loaded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchItem;
    use crate::orchestrator::test_support::{Harness, MockHost};
    use crate::queue::ExtractedBundle;
    use std::collections::HashMap;

    #[tokio::test(start_paused = true)]
    async fn tag_item_loads_waits_and_settles() {
        let host = MockHost::new();
        let harness = Harness::new(BatchItem::tag("A", "<div>a</div>", 300, 250));
        let mut state = ItemState::default();

        let started = tokio::time::Instant::now();
        let outcome = LoadStep
            .execute(&harness.ctx(&host), &mut state)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Success);
        assert!(state.loaded);
        assert_eq!(host.calls(), vec!["load_tag:<div>a</div>", "ready"]);
        assert_eq!(started.elapsed(), harness.timing.settle);
    }

    #[tokio::test(start_paused = true)]
    async fn log_names_queue_position() {
        let host = MockHost::new();
        let mut harness = Harness::new(BatchItem::tag("C", "<div>c</div>", 160, 600));
        harness.index = 2;

        LoadStep
            .execute(&harness.ctx(&host), &mut ItemState::default())
            .await
            .unwrap();
        let tail = harness.logger.get_tail();
        assert!(
            tail.iter().any(|line| line.contains("Item 3: loading tag")),
            "{:?}",
            tail
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bundle_resolves_through_lookup() {
        let host = MockHost::new();
        let harness = Harness::new(BatchItem::bundle("B", "bundle-1", 728, 90));
        let mut files = HashMap::new();
        files.insert("index.html".to_string(), b"<html></html>".to_vec());
        harness
            .bundles
            .insert_with_key("bundle-1", ExtractedBundle::new(files, "index.html"));

        let mut state = ItemState::default();
        LoadStep
            .execute(&harness.ctx(&host), &mut state)
            .await
            .unwrap();
        assert_eq!(host.calls(), vec!["load_bundle:index.html:1", "ready"]);
    }

    #[tokio::test]
    async fn missing_bundle_key_is_bundle_not_found() {
        let host = MockHost::new();
        let harness = Harness::new(BatchItem::bundle("B", "bundle-missing", 728, 90));
        let mut state = ItemState::default();

        let err = LoadStep
            .execute(&harness.ctx(&host), &mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::BundleNotFound { ref key } if key == "bundle-missing"));
        assert!(host.calls().is_empty());
        assert!(!state.loaded);
    }

    #[tokio::test]
    async fn load_failure_keeps_host_message() {
        let host = MockHost::new();
        host.fail_load_of("<broken>");
        let harness = Harness::new(BatchItem::tag("A", "<broken>", 300, 250));

        let err = LoadStep
            .execute(&harness.ctx(&host), &mut ItemState::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Preview failed to load markup");
    }

    #[test]
    fn empty_content_is_rejected() {
        let host = MockHost::new();
        let harness = Harness::new(BatchItem::tag("A", "  ", 300, 250));
        assert!(LoadStep
            .validate_input(&harness.ctx(&host), &ItemState::default())
            .is_err());
    }
}
