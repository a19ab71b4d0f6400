//! Recording session over a single stream.
//!
//! State machine: idle → recording ⇄ paused → stopped. Frames are encoded
//! on a background task as they arrive; chunks are buffered there and
//! joined into one artifact only when the session stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::capture::{Frame, MediaStream};
use crate::models::Artifact;

use super::encoder::FrameEncoder;
use super::errors::{RecordingError, RecordingResult};

/// Snapshot of a recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecorderState {
    pub is_recording: bool,
    pub is_paused: bool,
    /// Wall-clock time since start minus paused intervals. Frozen at stop.
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Recording,
    Stopped,
}

type EncodeOutcome = (Box<dyn FrameEncoder>, RecordingResult<Vec<Vec<u8>>>);

struct RunningTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<EncodeOutcome>,
}

pub struct RecordingSession {
    stream: MediaStream,
    encoder: Option<Box<dyn FrameEncoder>>,
    mime_type: String,
    phase: Phase,
    paused: Arc<AtomicBool>,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
    frozen_duration: Duration,
    task: Option<RunningTask>,
    cleaned_up: bool,
}

impl RecordingSession {
    /// Wrap `stream`. The session owns the stream from here on.
    pub fn create(stream: MediaStream, encoder: Box<dyn FrameEncoder>) -> Self {
        Self {
            mime_type: encoder.mime_type().to_string(),
            stream,
            encoder: Some(encoder),
            phase: Phase::Idle,
            paused: Arc::new(AtomicBool::new(false)),
            started_at: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            frozen_duration: Duration::ZERO,
            task: None,
            cleaned_up: false,
        }
    }

    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    /// Begin recording. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> RecordingResult<()> {
        if self.phase == Phase::Recording {
            return Err(RecordingError::AlreadyRecording);
        }
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| RecordingError::encode("Encoder lost by a previous recording"))?;

        self.paused.store(false, Ordering::SeqCst);
        self.started_at = Some(Instant::now());
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self.frozen_duration = Duration::ZERO;

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(encode_frames(
            self.stream.subscribe(),
            encoder,
            Arc::clone(&self.paused),
            stop_rx,
        ));
        self.task = Some(RunningTask {
            stop: stop_tx,
            handle,
        });
        self.phase = Phase::Recording;
        tracing::debug!("Recording started on stream {}", self.stream.id());
        Ok(())
    }

    /// No-op unless recording and not already paused.
    pub fn pause(&mut self) {
        if self.phase != Phase::Recording || self.paused_at.is_some() {
            return;
        }
        self.paused.store(true, Ordering::SeqCst);
        self.paused_at = Some(Instant::now());
    }

    /// No-op unless paused.
    pub fn resume(&mut self) {
        if self.phase != Phase::Recording {
            return;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += paused_at.elapsed();
            self.paused.store(false, Ordering::SeqCst);
        }
    }

    /// Stop recording and join the buffered chunks.
    ///
    /// Waits for the encoder task to flush. Fails with `NoDataRecorded`
    /// when no non-empty chunk was produced.
    pub async fn stop(&mut self) -> RecordingResult<Artifact> {
        if self.phase != Phase::Recording {
            return Err(RecordingError::NotRecording);
        }
        self.frozen_duration = self.current_duration();
        self.phase = Phase::Stopped;
        self.paused_at = None;

        let Some(task) = self.task.take() else {
            return Err(RecordingError::NotRecording);
        };
        let _ = task.stop.send(());
        let (encoder, chunks) = task
            .handle
            .await
            .map_err(|e| RecordingError::encode(format!("Encoder task failed: {}", e)))?;
        self.encoder = Some(encoder);

        let chunks = chunks?;
        let size: usize = chunks.iter().map(Vec::len).sum();
        if size == 0 {
            return Err(RecordingError::NoDataRecorded);
        }

        let mut data = Vec::with_capacity(size);
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }
        tracing::debug!(
            "Recording stopped: {} chunks, {} bytes, {:?}",
            chunks.len(),
            size,
            self.frozen_duration
        );
        Ok(Artifact::new(self.mime_type.clone(), data))
    }

    pub fn get_state(&self) -> RecorderState {
        let is_recording = self.phase == Phase::Recording;
        RecorderState {
            is_recording,
            is_paused: is_recording && self.paused_at.is_some(),
            duration: if is_recording {
                self.current_duration()
            } else {
                self.frozen_duration
            },
        }
    }

    /// Release the stream's tracks. Safe after errors and on repeat calls.
    pub fn cleanup(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.stop.send(());
            task.handle.abort();
        }
        if self.phase == Phase::Recording {
            self.frozen_duration = self.current_duration();
            self.phase = Phase::Stopped;
        }
        self.stream.stop_tracks();
        self.cleaned_up = true;
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }

    fn current_duration(&self) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let mut paused = self.paused_total;
        if let Some(paused_at) = self.paused_at {
            paused += paused_at.elapsed();
        }
        started_at.elapsed().saturating_sub(paused)
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("stream", &self.stream.id())
            .field("mime_type", &self.mime_type)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

fn encode_into(
    encoder: &mut dyn FrameEncoder,
    frame: Option<Frame>,
    chunks: &mut Vec<Vec<u8>>,
) -> RecordingResult<()> {
    if let Some(frame) = frame {
        let chunk = encoder.encode(&frame)?;
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
    }
    Ok(())
}

async fn encode_frames(
    mut frames: watch::Receiver<Option<Frame>>,
    mut encoder: Box<dyn FrameEncoder>,
    paused: Arc<AtomicBool>,
    mut stop: oneshot::Receiver<()>,
) -> EncodeOutcome {
    let mut chunks = Vec::new();

    let current = frames.borrow_and_update().clone();
    if !paused.load(Ordering::SeqCst) {
        if let Err(e) = encode_into(encoder.as_mut(), current, &mut chunks) {
            return (encoder, Err(e));
        }
    }

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            changed = frames.changed() => {
                if changed.is_err() {
                    // Producer gone; wait for stop so the session decides the outcome.
                    let _ = (&mut stop).await;
                    break;
                }
            }
        }
        let frame = frames.borrow_and_update().clone();
        if paused.load(Ordering::SeqCst) {
            continue;
        }
        if let Err(e) = encode_into(encoder.as_mut(), frame, &mut chunks) {
            return (encoder, Err(e));
        }
    }

    // Final flush of a frame that arrived together with the stop request.
    if !paused.load(Ordering::SeqCst) && frames.has_changed().unwrap_or(false) {
        let frame = frames.borrow_and_update().clone();
        if let Err(e) = encode_into(encoder.as_mut(), frame, &mut chunks) {
            return (encoder, Err(e));
        }
    }

    match encoder.finish() {
        Ok(tail) => {
            if !tail.is_empty() {
                chunks.push(tail);
            }
            (encoder, Ok(chunks))
        }
        Err(e) => (encoder, Err(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameSink;
    use crate::recording::MjpegEncoder;
    use image::RgbaImage;

    fn frame(w: u32, h: u32) -> Frame {
        Arc::new(RgbaImage::new(w, h))
    }

    fn session() -> (FrameSink, RecordingSession) {
        let (sink, stream) = MediaStream::channel("test");
        let session = RecordingSession::create(stream, Box::new(MjpegEncoder::default()));
        (sink, session)
    }

    #[tokio::test(start_paused = true)]
    async fn records_frames_into_one_artifact() {
        let (sink, mut session) = session();
        sink.push(frame(8, 8));
        session.start().unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        sink.push(frame(8, 8));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let artifact = session.stop().await.unwrap();
        assert_eq!(artifact.mime_type, "video/x-motion-jpeg");
        let markers = artifact
            .data
            .windows(2)
            .filter(|w| *w == [0xFF, 0xD8])
            .count();
        assert!(markers >= 2, "expected two JPEG frames, found {}", markers);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_without_frames_is_no_data() {
        let (_sink, mut session) = session();
        session.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(
            session.stop().await,
            Err(RecordingError::NoDataRecorded)
        ));
        assert!(!session.get_state().is_recording);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_frames_do_not_count_as_data() {
        let (sink, mut session) = session();
        sink.push(frame(0, 0));
        session.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(
            session.stop().await,
            Err(RecordingError::NoDataRecorded)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn duration_excludes_paused_time_and_freezes_at_stop() {
        let (sink, mut session) = session();
        sink.push(frame(4, 4));

        session.pause();
        assert!(!session.get_state().is_paused);

        session.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        session.pause();
        assert!(session.get_state().is_paused);
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.resume();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let state = session.get_state();
        assert!(state.is_recording);
        assert!(!state.is_paused);
        assert_eq!(state.duration, Duration::from_millis(2000));

        session.stop().await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(session.get_state().duration, Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn frames_while_paused_are_discarded() {
        let (sink, mut session) = session();
        session.start().unwrap();
        session.pause();
        sink.push(frame(4, 4));
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.resume();
        assert!(matches!(
            session.stop().await,
            Err(RecordingError::NoDataRecorded)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_clears_previous_chunks() {
        let (sink, mut session) = session();
        sink.push(frame(4, 4));
        session.start().unwrap();
        let first = session.stop().await.unwrap();

        session.start().unwrap();
        let second = session.stop().await.unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[tokio::test]
    async fn stop_and_start_out_of_order() {
        let (_sink, mut session) = session();
        assert!(matches!(
            session.stop().await,
            Err(RecordingError::NotRecording)
        ));
        session.start().unwrap();
        assert!(matches!(
            session.start(),
            Err(RecordingError::AlreadyRecording)
        ));
        session.cleanup();
    }

    #[tokio::test]
    async fn cleanup_is_idempotent_and_stops_tracks() {
        let (sink, mut session) = session();
        session.start().unwrap();
        session.cleanup();
        session.cleanup();
        assert!(session.is_cleaned_up());
        assert!(!session.stream().is_active());
        assert!(sink.is_ended());
        assert!(!session.get_state().is_recording);
    }
}
