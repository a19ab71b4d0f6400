//! Scripted collaborators shared by the orchestrator tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::capture::CaptureError;
use crate::logging::{LogConfig, RunLogger};
use crate::models::{Artifact, BatchItem, ComplianceStatus};
use crate::queue::{BundleStore, ExtractedBundle};
use crate::recording::{Recorder, RecorderState, RecordingError, RecordingResult};

use super::host::{ComplianceReport, CreativeHost};
use super::pipeline::CancelHandle;
use super::progress::ProgressModel;
use super::types::{BatchTiming, ItemContext};

/// Host that records every call and answers from a script.
pub(crate) struct MockHost {
    calls: Mutex<Vec<String>>,
    compliance: Mutex<Option<ComplianceStatus>>,
    failing_markup: Mutex<Option<String>>,
    cancel_on_compliance: Mutex<Option<(usize, CancelHandle)>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            compliance: Mutex::new(Some(ComplianceStatus::Pass)),
            failing_markup: Mutex::new(None),
            cancel_on_compliance: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn set_compliance(&self, status: Option<ComplianceStatus>) {
        *self.compliance.lock() = status;
    }

    pub fn fail_load_of(&self, markup: &str) {
        *self.failing_markup.lock() = Some(markup.to_string());
    }

    /// Trip `handle` while the `nth` compliance check (1-based) is running.
    pub fn cancel_during_compliance(&self, nth: usize, handle: CancelHandle) {
        *self.cancel_on_compliance.lock() = Some((nth, handle));
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl CreativeHost for MockHost {
    async fn load_tag(&self, markup: &str, _width: u32, _height: u32) -> anyhow::Result<()> {
        self.record(format!("load_tag:{}", markup));
        if self.failing_markup.lock().as_deref() == Some(markup) {
            anyhow::bail!("Preview failed to load markup");
        }
        Ok(())
    }

    async fn load_bundle(
        &self,
        bundle: &ExtractedBundle,
        _width: u32,
        _height: u32,
    ) -> anyhow::Result<()> {
        self.record(format!(
            "load_bundle:{}:{}",
            bundle.entry_point,
            bundle.files.len()
        ));
        Ok(())
    }

    async fn wait_for_ad_ready(&self) -> anyhow::Result<()> {
        self.record("ready".to_string());
        Ok(())
    }

    async fn run_compliance(&self) -> anyhow::Result<()> {
        self.record("compliance".to_string());
        let checks = self.calls.lock().iter().filter(|c| *c == "compliance").count();
        if let Some((nth, handle)) = self.cancel_on_compliance.lock().as_ref() {
            if *nth == checks {
                handle.cancel();
            }
        }
        Ok(())
    }

    fn compliance_result(&self) -> Option<ComplianceReport> {
        self.compliance.lock().map(ComplianceReport::new)
    }

    async fn generate_proof_pack(
        &self,
        item: &BatchItem,
        recording: Option<&Artifact>,
    ) -> anyhow::Result<Option<Artifact>> {
        self.record(format!("proof_pack:{}:{}", item.name, recording.is_some()));
        Ok(Some(Artifact::new(
            "application/zip",
            item.name.as_bytes().to_vec(),
        )))
    }
}

/// Recorder that logs its lifecycle calls.
pub(crate) struct MockRecorder {
    log: Arc<Mutex<Vec<String>>>,
    prepared: bool,
    deny: bool,
    no_data: bool,
}

impl MockRecorder {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            prepared: false,
            deny: false,
            no_data: false,
        }
    }

    pub fn prepared() -> Self {
        Self {
            prepared: true,
            ..Self::new()
        }
    }

    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::new()
        }
    }

    pub fn without_data(mut self) -> Self {
        self.no_data = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }

    fn push(&self, entry: &str) {
        self.log.lock().push(entry.to_string());
    }
}

#[async_trait]
impl Recorder for MockRecorder {
    async fn prepare(&mut self) -> Result<(), CaptureError> {
        self.push("prepare");
        if self.deny {
            return Err(CaptureError::PermissionDenied);
        }
        self.prepared = true;
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.prepared
    }

    async fn start(&mut self) -> RecordingResult<()> {
        if !self.prepared {
            return Err(RecordingError::NotPrepared);
        }
        self.push("start");
        Ok(())
    }

    async fn stop(&mut self) -> RecordingResult<Artifact> {
        self.push("stop");
        if self.no_data {
            return Err(RecordingError::NoDataRecorded);
        }
        Ok(Artifact::new("video/x-motion-jpeg", vec![0xFF, 0xD8, 0xFF, 0xD9]))
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn state(&self) -> RecorderState {
        RecorderState::default()
    }

    fn release(&mut self) {
        self.push("release");
        self.prepared = false;
    }
}

/// Owns everything an `ItemContext` borrows.
pub(crate) struct Harness {
    pub index: usize,
    pub item: BatchItem,
    pub bundles: BundleStore,
    pub recorder: AsyncMutex<Box<dyn Recorder>>,
    pub timing: BatchTiming,
    pub logger: RunLogger,
    pub progress: ProgressModel,
    pub countdown: bool,
    pub capture_enabled: bool,
}

impl Harness {
    pub fn new(item: BatchItem) -> Self {
        Self::with_recorder(item, MockRecorder::prepared())
    }

    pub fn with_recorder(item: BatchItem, recorder: MockRecorder) -> Self {
        Self {
            index: 0,
            item,
            bundles: BundleStore::new(),
            recorder: AsyncMutex::new(Box::new(recorder) as Box<dyn Recorder>),
            timing: BatchTiming::default(),
            logger: RunLogger::in_memory("test", LogConfig::debug(), None),
            progress: ProgressModel::new(),
            countdown: false,
            capture_enabled: true,
        }
    }

    pub fn ctx<'a>(&'a self, host: &'a MockHost) -> ItemContext<'a> {
        ItemContext {
            index: self.index,
            item: &self.item,
            host,
            bundles: &self.bundles,
            recorder: &self.recorder,
            timing: &self.timing,
            logger: &self.logger,
            progress: &self.progress,
            countdown: self.countdown,
            capture_enabled: self.capture_enabled,
        }
    }
}
