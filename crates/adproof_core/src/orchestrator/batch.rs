//! Batch orchestrator.
//!
//! Drives every queued item through the item pipeline, strictly one at a
//! time, with a single capture permission shared by the whole run.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::time::Instant;

use crate::config::Settings;
use crate::logging::{LogCallback, LogConfig, RunLogger};
use crate::models::{
    BatchPhase, BatchProgress, CompletedItem, ComplianceStatus, ItemErrorSummary, ItemStatus,
};
use crate::queue::{BatchQueue, BundleLookup};
use crate::recording::Recorder;

use super::errors::{BatchError, PipelineError};
use super::host::{CompletionCallback, CreativeHost};
use super::pipeline::{CancelHandle, ItemPipeline};
use super::progress::ProgressModel;
use super::types::{BatchTiming, ItemContext, ItemState};

/// Shared UI log sink; wrapped into each run's logger.
pub type SharedLogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Owns the queue, the recorder and the progress model for batch runs.
///
/// # Example
///
/// ```ignore
/// let mut orchestrator = BatchOrchestrator::new(settings, host, bundles, recorder);
/// orchestrator.queue_mut().add_tag("Banner", markup, 300, 250)?;
///
/// let cancel = orchestrator.cancel_handle();
/// let progress = orchestrator.start_processing().await?;
/// ```
pub struct BatchOrchestrator {
    settings: Settings,
    timing: BatchTiming,
    queue: BatchQueue,
    host: Arc<dyn CreativeHost>,
    bundles: Arc<dyn BundleLookup>,
    recorder: AsyncMutex<Box<dyn Recorder>>,
    pipeline: ItemPipeline,
    cancel: CancelHandle,
    progress: ProgressModel,
    log_dir: Option<PathBuf>,
    log_callback: Option<SharedLogCallback>,
    on_complete: Option<CompletionCallback>,
    last_log_path: Option<PathBuf>,
}

impl BatchOrchestrator {
    pub fn new(
        settings: Settings,
        host: Arc<dyn CreativeHost>,
        bundles: Arc<dyn BundleLookup>,
        recorder: Box<dyn Recorder>,
    ) -> Self {
        Self {
            timing: BatchTiming::from(&settings.timing),
            settings,
            queue: BatchQueue::new(),
            host,
            bundles,
            recorder: AsyncMutex::new(recorder),
            pipeline: ItemPipeline::standard(),
            cancel: CancelHandle::new(),
            progress: ProgressModel::new(),
            log_dir: None,
            log_callback: None,
            on_complete: None,
            last_log_path: None,
        }
    }

    /// Write a log file per run into `dir`.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Forward every run log line to `callback`.
    pub fn with_log_callback(mut self, callback: SharedLogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    /// Called with the final item list when a run completes without cancellation.
    pub fn with_on_complete(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    /// Replace the item pipeline.
    pub fn with_pipeline(mut self, pipeline: ItemPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timing(&self) -> &BatchTiming {
        &self.timing
    }

    pub fn queue(&self) -> &BatchQueue {
        &self.queue
    }

    /// Queue edits fail with `QueueError::Locked` while a run is active.
    pub fn queue_mut(&mut self) -> &mut BatchQueue {
        &mut self.queue
    }

    /// Handle that stops the run at its next checkpoint.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Live progress updates.
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> BatchProgress {
        self.progress.snapshot()
    }

    /// Log file of the most recent run, if one was written.
    pub fn last_log_path(&self) -> Option<&PathBuf> {
        self.last_log_path.as_ref()
    }

    fn create_run_logger(&self) -> RunLogger {
        let run_name = format!("batch_{}", Local::now().format("%Y%m%d_%H%M%S"));
        let config = LogConfig::from(&self.settings.logging);
        let callback = || {
            self.log_callback.as_ref().map(|shared| {
                let shared = Arc::clone(shared);
                Box::new(move |line: &str| shared(line)) as LogCallback
            })
        };

        let Some(dir) = &self.log_dir else {
            return RunLogger::in_memory(run_name, config, callback());
        };
        match RunLogger::new(&run_name, dir, config.clone(), callback()) {
            Ok(logger) => logger,
            Err(e) => {
                tracing::warn!("Cannot create run log in {}: {}", dir.display(), e);
                RunLogger::in_memory(run_name, config, callback())
            }
        }
    }

    /// Run every queued item.
    ///
    /// Returns the final progress snapshot for complete and cancelled runs.
    /// A capture permission failure ends the run in phase `Error` before any
    /// item is loaded and is returned as `BatchError::Capture`.
    pub async fn start_processing(&mut self) -> Result<BatchProgress, BatchError> {
        if self.queue.is_processing() {
            return Err(BatchError::AlreadyRunning);
        }
        if self.queue.is_empty() {
            return Err(BatchError::EmptyQueue);
        }

        self.cancel.reset();
        let logger = self.create_run_logger();
        self.last_log_path = logger.log_path().map(|p| p.to_path_buf());
        let capture_enabled = self.settings.capture.enabled;

        let Self {
            timing,
            queue,
            host,
            bundles,
            recorder,
            pipeline,
            cancel,
            progress,
            on_complete,
            ..
        } = self;

        let total = queue.len();
        queue.begin_run();
        progress.replace(BatchProgress {
            current_item_status: "Preparing".to_string(),
            estimated_time_remaining_ms: timing.eta_ms(total),
            ..BatchProgress::starting(total)
        });
        tracing::info!("Batch run started with {} items", total);
        logger.phase(&format!("Batch of {} items", total));

        if capture_enabled {
            progress.update(|p| p.current_item_status = "Requesting capture permission".to_string());
            let prepared = recorder.get_mut().prepare().await;
            if let Err(e) = prepared {
                logger.error(&format!("Capture unavailable: {}", e));
                logger.show_tail("Run failed");
                recorder.get_mut().release();
                queue.end_run();
                progress.update(|p| {
                    p.phase = BatchPhase::Error;
                    p.current_item_status = e.to_string();
                    p.estimated_time_remaining_ms = 0;
                    p.run_error = Some(e.to_string());
                });
                tracing::error!("Batch run aborted: {}", e);
                return Err(BatchError::Capture(e));
            }
            logger.success("Capture permission granted");
        } else {
            logger.info("Capture disabled; running compliance checks only");
        }

        progress.update(|p| p.phase = BatchPhase::Processing);

        let mut cancelled = false;
        let mut countdown_pending = true;

        for index in 0..total {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let Some(item) = queue.get(index).cloned() else {
                break;
            };

            queue.set_current(index);
            progress.update(|p| {
                p.current_item = Some(index);
                p.current_item_status = format!("Starting {}", item.name);
                p.estimated_time_remaining_ms = timing.eta_ms(total - index);
            });
            logger.section(&format!(
                "[{}/{}] {} ({}, {})",
                index + 1,
                total,
                item.name,
                item.input_type,
                item.size_label()
            ));

            let started = Instant::now();
            let mut state = ItemState::default();
            let result = {
                let ctx = ItemContext {
                    index,
                    item: &item,
                    host: host.as_ref(),
                    bundles: bundles.as_ref(),
                    recorder: &*recorder,
                    timing: &*timing,
                    logger: &logger,
                    progress: &*progress,
                    countdown: countdown_pending || timing.countdown_every_item,
                    capture_enabled,
                };
                let progress = &*progress;
                let queue = &mut *queue;
                pipeline
                    .run(&ctx, &mut state, cancel, |step_name, status| {
                        queue.set_status(index, status);
                        progress.update(|p| {
                            p.current_item_status = format!("{}: {}", item.name, step_name)
                        });
                    })
                    .await
            };
            if state.recording_started {
                countdown_pending = false;
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(_) => {
                    let compliance = ComplianceStatus::resolve(state.compliance);
                    queue.set_complete(index, compliance, elapsed_ms, state.proof_pack.take());
                    logger.success(&format!(
                        "{} complete ({}, {} ms)",
                        item.name, compliance, elapsed_ms
                    ));
                    progress.update(|p| {
                        p.completed.push(CompletedItem {
                            id: item.id.clone(),
                            name: item.name.clone(),
                            compliance_status: compliance,
                            processing_time_ms: elapsed_ms,
                        });
                        p.estimated_time_remaining_ms = timing.eta_ms(total - index - 1);
                    });
                }
                Err(PipelineError::Cancelled { step_name, .. }) => {
                    queue.set_status(index, ItemStatus::Skipped);
                    logger.warn(&format!("Cancelled before {}", step_name));
                    cancelled = true;
                    break;
                }
                Err(PipelineError::StepFailed { source, .. }) => {
                    let message = source.to_string();
                    logger.error(&format!("{} failed: {}", item.name, message));
                    queue.set_error(index, message.clone(), elapsed_ms);
                    progress.update(|p| {
                        p.errors.push(ItemErrorSummary {
                            id: item.id.clone(),
                            name: item.name.clone(),
                            message,
                        });
                        p.estimated_time_remaining_ms = timing.eta_ms(total - index - 1);
                    });
                }
            }
        }

        recorder.get_mut().release();

        if cancelled {
            queue.end_run();
            progress.update(|p| {
                p.phase = BatchPhase::Cancelled;
                p.current_item_status = "Cancelled".to_string();
                p.estimated_time_remaining_ms = 0;
            });
            logger.warn("Batch cancelled");
            logger.close();
            tracing::info!("Batch run cancelled");
            return Ok(progress.snapshot());
        }

        progress.update(|p| {
            p.phase = BatchPhase::Finalizing;
            p.current_item_status = "Finalizing".to_string();
            p.estimated_time_remaining_ms = 0;
        });
        queue.end_run();
        if let Some(callback) = on_complete.as_ref() {
            callback(queue.items());
        }

        let snapshot = {
            progress.update(|p| {
                p.phase = BatchPhase::Complete;
                p.current_item_status = format!(
                    "{} complete, {} failed",
                    p.completed.len(),
                    p.errors.len()
                );
            });
            progress.snapshot()
        };
        logger.success(&snapshot.current_item_status);
        if !snapshot.errors.is_empty() {
            logger.show_tail("Batch finished with errors");
        }
        logger.close();
        tracing::info!(
            "Batch run complete: {} complete, {} failed",
            snapshot.completed.len(),
            snapshot.errors.len()
        );
        Ok(snapshot)
    }
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("queue_len", &self.queue.len())
            .field("phase", &self.progress.snapshot().phase)
            .field("pipeline", &self.pipeline.step_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Artifact;
    use crate::orchestrator::test_support::{MockHost, MockRecorder};
    use crate::orchestrator::{ItemStep, StepOutcome, StepResult};
    use crate::queue::{BundleStore, ExtractedBundle};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    fn orchestrator(host: Arc<MockHost>, recorder: MockRecorder) -> BatchOrchestrator {
        BatchOrchestrator::new(
            Settings::default(),
            host,
            Arc::new(BundleStore::new()),
            Box::new(recorder),
        )
    }

    fn tags(orchestrator: &mut BatchOrchestrator, names: &[&str]) {
        for name in names {
            orchestrator
                .queue_mut()
                .add_tag(*name, format!("<div>{}</div>", name), 300, 250)
                .unwrap();
        }
    }

    fn loads(host: &MockHost) -> Vec<String> {
        host.calls()
            .into_iter()
            .filter(|c| c.starts_with("load_"))
            .collect()
    }

    #[tokio::test]
    async fn empty_queue_is_rejected() {
        let mut orchestrator = orchestrator(Arc::new(MockHost::new()), MockRecorder::new());
        assert!(matches!(
            orchestrator.start_processing().await,
            Err(BatchError::EmptyQueue)
        ));
        assert_eq!(orchestrator.progress().phase, BatchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn visits_items_in_order_once() {
        let host = Arc::new(MockHost::new());
        let recorder = MockRecorder::new();
        let log = recorder.log();
        let mut orchestrator = orchestrator(host.clone(), recorder);
        tags(&mut orchestrator, &["A", "B", "C"]);

        let progress = orchestrator.start_processing().await.unwrap();

        assert_eq!(progress.phase, BatchPhase::Complete);
        assert_eq!(
            loads(&host),
            vec!["load_tag:<div>A</div>", "load_tag:<div>B</div>", "load_tag:<div>C</div>"]
        );
        assert_eq!(progress.current_item, Some(2));
        assert_eq!(progress.completed.len(), 3);
        assert!(progress.errors.is_empty());
        assert_eq!(progress.estimated_time_remaining_ms, 0);
        assert_eq!(
            *log.lock(),
            vec!["prepare", "start", "stop", "start", "stop", "start", "stop", "release"]
        );

        let queue = orchestrator.queue();
        assert!(!queue.is_processing());
        assert_eq!(queue.current_index(), None);
        for item in queue.items() {
            assert_eq!(item.status, ItemStatus::Complete);
            assert_eq!(item.compliance_status, Some(ComplianceStatus::Pass));
            assert!(item.artifact.is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn current_item_strictly_increases() {
        let host = Arc::new(MockHost::new());
        let mut orchestrator = orchestrator(host, MockRecorder::new());
        tags(&mut orchestrator, &["A", "B", "C", "D"]);

        let mut rx = orchestrator.subscribe();
        let watcher = tokio::spawn(async move {
            let mut seen: Vec<usize> = Vec::new();
            while rx.changed().await.is_ok() {
                let (phase, current) = {
                    let p = rx.borrow_and_update();
                    (p.phase, p.current_item)
                };
                if let Some(index) = current {
                    if seen.last() != Some(&index) {
                        seen.push(index);
                    }
                }
                if phase.is_finished() {
                    break;
                }
            }
            seen
        });

        orchestrator.start_processing().await.unwrap();
        let seen = watcher.await.unwrap();
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "{:?}", seen);
        assert_eq!(seen.last(), Some(&3));
    }

    /// Notes the ETA each item sees once it is underway.
    struct EtaSnapshotStep {
        seen: Arc<Mutex<Vec<(usize, u64)>>>,
    }

    #[async_trait]
    impl ItemStep for EtaSnapshotStep {
        fn name(&self) -> &str {
            "ETA snapshot"
        }

        fn status(&self) -> ItemStatus {
            ItemStatus::Processing
        }

        async fn execute(
            &self,
            ctx: &ItemContext<'_>,
            _state: &mut ItemState,
        ) -> StepResult<StepOutcome> {
            let eta = ctx.progress.snapshot().estimated_time_remaining_ms;
            self.seen.lock().push((ctx.index, eta));
            Ok(StepOutcome::Success)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn eta_counts_remaining_items_at_fixed_budget() {
        let host = Arc::new(MockHost::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut orchestrator = orchestrator(host, MockRecorder::new()).with_pipeline(
            ItemPipeline::standard().with_step(EtaSnapshotStep {
                seen: Arc::clone(&seen),
            }),
        );
        tags(&mut orchestrator, &["A", "B", "C"]);
        assert_eq!(orchestrator.timing().item_budget.as_millis(), 8000);

        let mut rx = orchestrator.subscribe();
        let watcher = tokio::spawn(async move {
            let mut observed = Vec::new();
            while rx.changed().await.is_ok() {
                let p = rx.borrow_and_update().clone();
                observed.push((p.phase, p.current_item, p.estimated_time_remaining_ms));
                if p.phase.is_finished() {
                    break;
                }
            }
            observed
        });

        let progress = orchestrator.start_processing().await.unwrap();
        let observed = watcher.await.unwrap();

        // Items take 4500 ms (6500 ms with the countdown), never the 8000 ms
        // budget, so any measured correction would show up here.
        assert_eq!(*seen.lock(), vec![(0, 24_000), (1, 16_000), (2, 8_000)]);
        assert_eq!(progress.estimated_time_remaining_ms, 0);

        for (phase, current, eta) in observed {
            match (phase, current) {
                (BatchPhase::Processing, Some(i)) => assert!(
                    eta == (3 - i as u64) * 8000 || eta == (2 - i as u64) * 8000,
                    "item {} published eta {}",
                    i,
                    eta
                ),
                (BatchPhase::Preparing, _) => assert_eq!(eta, 24_000),
                (BatchPhase::Complete, _) => assert_eq!(eta, 0),
                _ => {}
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permission_failure_aborts_before_loading() {
        let host = Arc::new(MockHost::new());
        let recorder = MockRecorder::denying();
        let log = recorder.log();
        let mut orchestrator = orchestrator(host.clone(), recorder);
        tags(&mut orchestrator, &["A", "B"]);

        let err = orchestrator.start_processing().await.unwrap_err();
        assert!(matches!(
            err,
            BatchError::Capture(crate::capture::CaptureError::PermissionDenied)
        ));

        let progress = orchestrator.progress();
        assert_eq!(progress.phase, BatchPhase::Error);
        assert!(progress.run_error.is_some());
        assert!(progress.completed.is_empty() && progress.errors.is_empty());
        assert!(host.calls().is_empty());
        assert!(orchestrator
            .queue()
            .items()
            .iter()
            .all(|i| i.status == ItemStatus::Pending));
        assert_eq!(*log.lock(), vec!["prepare", "release"]);
        assert!(!orchestrator.queue().is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn item_failure_does_not_stop_the_batch() {
        let host = Arc::new(MockHost::new());
        host.fail_load_of("<div>B</div>");
        let mut orchestrator = orchestrator(host.clone(), MockRecorder::new());
        tags(&mut orchestrator, &["A", "B", "C"]);

        let progress = orchestrator.start_processing().await.unwrap();

        assert_eq!(progress.phase, BatchPhase::Complete);
        let completed: Vec<&str> = progress.completed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(completed, vec!["A", "C"]);
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(progress.errors[0].name, "B");
        assert_eq!(progress.errors[0].message, "Preview failed to load markup");

        let b = orchestrator.queue().get(1).unwrap();
        assert_eq!(b.status, ItemStatus::Error);
        assert_eq!(b.error.as_deref(), Some("Preview failed to load markup"));
        assert!(b.compliance_status.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_checking_stops_the_run() {
        let host = Arc::new(MockHost::new());
        let recorder = MockRecorder::new();
        let log = recorder.log();
        let completions = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&completions);
        let mut orchestrator = orchestrator(host.clone(), recorder).with_on_complete(Box::new(
            move |_items: &[crate::models::BatchItem]| *counter.lock() += 1,
        ));
        tags(&mut orchestrator, &["A", "B", "C", "D"]);
        host.cancel_during_compliance(2, orchestrator.cancel_handle());

        let progress = orchestrator.start_processing().await.unwrap();

        assert_eq!(progress.phase, BatchPhase::Cancelled);
        assert_eq!(progress.completed.len(), 1);
        assert_eq!(progress.completed[0].name, "A");
        assert!(progress.errors.is_empty());
        assert_eq!(*completions.lock(), 0);

        let items = orchestrator.queue().items();
        assert_eq!(items[0].status, ItemStatus::Complete);
        assert_eq!(items[1].status, ItemStatus::Skipped);
        assert_eq!(items[2].status, ItemStatus::Pending);
        assert_eq!(items[3].status, ItemStatus::Pending);
        assert!(!host.calls().iter().any(|c| c == "load_tag:<div>C</div>"));
        assert_eq!(log.lock().last().map(String::as_str), Some("release"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_flag_is_reset_for_next_run() {
        let host = Arc::new(MockHost::new());
        let mut orchestrator = orchestrator(host, MockRecorder::new());
        tags(&mut orchestrator, &["A"]);

        orchestrator.cancel();
        let progress = orchestrator.start_processing().await.unwrap();
        assert_eq!(progress.phase, BatchPhase::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_only_before_first_recording() {
        let host = Arc::new(MockHost::new());
        let mut orchestrator = orchestrator(host, MockRecorder::new());
        tags(&mut orchestrator, &["A", "B"]);

        let started = Instant::now();
        orchestrator.start_processing().await.unwrap();
        // settle 1000 + grace 500 + recording 3000 per item, countdown 2000 once
        assert_eq!(started.elapsed().as_millis(), 2 * 4500 + 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_callback_gets_final_items() {
        let host = Arc::new(MockHost::new());
        let seen: Arc<Mutex<Vec<(ItemStatus, Option<Artifact>)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut orchestrator = orchestrator(host, MockRecorder::new()).with_on_complete(Box::new(
            move |items: &[crate::models::BatchItem]| {
                sink.lock()
                    .extend(items.iter().map(|i| (i.status, i.artifact.clone())));
            },
        ));
        tags(&mut orchestrator, &["A", "B"]);

        orchestrator.start_processing().await.unwrap();
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen
            .iter()
            .all(|(status, artifact)| *status == ItemStatus::Complete && artifact.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn compliance_only_mode_skips_capture() {
        let host = Arc::new(MockHost::new());
        let recorder = MockRecorder::new();
        let log = recorder.log();
        let mut settings = Settings::default();
        settings.capture.enabled = false;
        let mut orchestrator = BatchOrchestrator::new(
            settings,
            host.clone(),
            Arc::new(BundleStore::new()),
            Box::new(recorder),
        );
        tags(&mut orchestrator, &["A"]);

        let progress = orchestrator.start_processing().await.unwrap();
        assert_eq!(progress.phase, BatchPhase::Complete);
        assert_eq!(*log.lock(), vec!["release"]);
        assert!(host.calls().contains(&"proof_pack:A:false".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn bundle_items_resolve_or_fail() {
        let host = Arc::new(MockHost::new());
        let bundles = BundleStore::new();
        let mut files = HashMap::new();
        files.insert("index.html".to_string(), b"<html></html>".to_vec());
        let key = bundles.insert(ExtractedBundle::new(files, "index.html"));

        let mut orchestrator = BatchOrchestrator::new(
            Settings::default(),
            host.clone(),
            Arc::new(bundles),
            Box::new(MockRecorder::new()),
        );
        orchestrator.queue_mut().add_bundle("Good", key, 300, 250).unwrap();
        orchestrator
            .queue_mut()
            .add_bundle("Missing", "bundle-unknown", 728, 90)
            .unwrap();

        let progress = orchestrator.start_processing().await.unwrap();
        assert_eq!(progress.completed.len(), 1);
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(progress.errors[0].message, "Bundle not found: bundle-unknown");
        assert_eq!(loads(&host), vec!["load_bundle:index.html:1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn queue_unlocks_after_run_and_items_reset_on_rerun() {
        let host = Arc::new(MockHost::new());
        host.fail_load_of("<div>A</div>");
        let mut orchestrator = orchestrator(host.clone(), MockRecorder::new());
        tags(&mut orchestrator, &["A"]);

        orchestrator.start_processing().await.unwrap();
        assert_eq!(orchestrator.queue().get(0).unwrap().status, ItemStatus::Error);

        host.fail_load_of("<div>other</div>");
        let progress = orchestrator.start_processing().await.unwrap();
        assert_eq!(progress.errors.len(), 0);
        let item = orchestrator.queue().get(0).unwrap();
        assert_eq!(item.status, ItemStatus::Complete);
        assert!(item.error.is_none());
        assert!(orchestrator.queue_mut().clear().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn run_log_is_written_to_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        let mut orchestrator = orchestrator(Arc::new(MockHost::new()), MockRecorder::new())
            .with_log_dir(dir.path())
            .with_log_callback(Arc::new(move |line: &str| sink.lock().push(line.to_string())));
        tags(&mut orchestrator, &["A"]);

        orchestrator.start_processing().await.unwrap();
        let path = orchestrator.last_log_path().unwrap().clone();
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("A complete"));
        assert!(lines.lock().iter().any(|l| l.contains("A complete")));
    }
}
