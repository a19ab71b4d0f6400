//! Run-scoped recorder.
//!
//! Owns the one raw capture stream of a batch run and hands each item a
//! fresh recording session over a stream derived from it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capture::{
    compose, CaptureError, CaptureRequest, CaptureSource, CompositorHandle, CropConfig,
    MediaStream,
};
use crate::config::{CaptureMode, CaptureSettings};
use crate::models::Artifact;

use super::encoder::{EncoderFactory, MjpegEncoder};
use super::errors::{RecordingError, RecordingResult};
use super::session::{RecorderState, RecordingSession};

/// Recorder used by the batch orchestrator.
///
/// `prepare` acquires the capture permission and is called once per run;
/// `release` gives it back and must be called on every exit path.
#[async_trait]
pub trait Recorder: Send {
    async fn prepare(&mut self) -> Result<(), CaptureError>;

    fn is_prepared(&self) -> bool;

    async fn start(&mut self) -> RecordingResult<()>;

    /// Stop the active recording and return its artifact. The session is
    /// discarded whether or not this succeeds.
    async fn stop(&mut self) -> RecordingResult<Artifact>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn state(&self) -> RecorderState;

    fn release(&mut self);
}

/// What each recording is taken from.
#[derive(Debug, Clone)]
pub enum RecordMode {
    /// The full raw stream.
    Raw,
    /// The raw stream cropped to the creative.
    Clip(CropConfig),
}

struct ActiveRecording {
    session: RecordingSession,
    compositor: Option<CompositorHandle>,
}

impl ActiveRecording {
    fn discard(mut self) {
        self.session.cleanup();
        if let Some(mut compositor) = self.compositor.take() {
            compositor.release();
        }
    }
}

/// [`Recorder`] over a [`CaptureSource`].
pub struct CaptureController {
    source: Arc<dyn CaptureSource>,
    request: CaptureRequest,
    mode: RecordMode,
    encoder_factory: EncoderFactory,
    raw: Option<MediaStream>,
    active: Option<ActiveRecording>,
}

impl CaptureController {
    pub fn new(source: Arc<dyn CaptureSource>, request: CaptureRequest, mode: RecordMode) -> Self {
        Self {
            source,
            request,
            mode,
            encoder_factory: MjpegEncoder::factory(80),
            raw: None,
            active: None,
        }
    }

    /// Build from the `[capture]` settings. `crop` is used in clip mode.
    pub fn from_settings(
        source: Arc<dyn CaptureSource>,
        settings: &CaptureSettings,
        crop: CropConfig,
    ) -> Self {
        let mode = match settings.mode {
            CaptureMode::Raw => RecordMode::Raw,
            CaptureMode::Clip => RecordMode::Clip(crop),
        };
        Self::new(source, CaptureRequest::from(settings), mode)
            .with_encoder_factory(MjpegEncoder::factory(settings.jpeg_quality))
    }

    pub fn with_encoder_factory(mut self, factory: EncoderFactory) -> Self {
        self.encoder_factory = factory;
        self
    }

    pub fn mode(&self) -> &RecordMode {
        &self.mode
    }

    /// The shared raw stream, once acquired.
    pub fn raw_stream(&self) -> Option<&MediaStream> {
        self.raw.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    fn derive_stream(&self, raw: &MediaStream) -> (MediaStream, Option<CompositorHandle>) {
        match &self.mode {
            RecordMode::Raw => (raw.fork(), None),
            RecordMode::Clip(crop) => {
                let composed = compose(raw, crop.clone(), self.request.frame_rate);
                (composed.stream, Some(composed.handle))
            }
        }
    }
}

#[async_trait]
impl Recorder for CaptureController {
    async fn prepare(&mut self) -> Result<(), CaptureError> {
        if self.raw.is_some() {
            return Ok(());
        }
        let stream = self.source.acquire(&self.request).await?;
        tracing::info!("Capture stream '{}' acquired", stream.label());
        self.raw = Some(stream);
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.raw.is_some()
    }

    async fn start(&mut self) -> RecordingResult<()> {
        if self.active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }
        let raw = self.raw.as_ref().ok_or(RecordingError::NotPrepared)?;

        let (stream, compositor) = self.derive_stream(raw);
        let mut active = ActiveRecording {
            session: RecordingSession::create(stream, (self.encoder_factory)()),
            compositor,
        };
        if let Err(e) = active.session.start() {
            active.discard();
            return Err(e);
        }
        self.active = Some(active);
        Ok(())
    }

    async fn stop(&mut self) -> RecordingResult<Artifact> {
        let mut active = self.active.take().ok_or(RecordingError::NotRecording)?;
        let result = active.session.stop().await;
        active.discard();
        result
    }

    fn pause(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.session.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.session.resume();
        }
    }

    fn state(&self) -> RecorderState {
        self.active
            .as_ref()
            .map(|active| active.session.get_state())
            .unwrap_or_default()
    }

    fn release(&mut self) {
        if let Some(active) = self.active.take() {
            active.discard();
        }
        if let Some(raw) = self.raw.take() {
            raw.stop_tracks();
            tracing::info!("Capture stream '{}' released", raw.label());
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("request", &self.request)
            .field("mode", &self.mode)
            .field("prepared", &self.raw.is_some())
            .field("recording", &self.active.is_some())
            .finish()
    }
}
