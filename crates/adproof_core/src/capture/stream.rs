//! Live frame streams.
//!
//! A stream is a latest-frame channel: producers overwrite the current
//! frame, consumers read whatever is newest. Each `MediaStream` handle has
//! its own track state, so stopping a fork never ends the stream it was
//! forked from.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use tokio::sync::watch;

/// One decoded video frame.
pub type Frame = Arc<RgbaImage>;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Producer side of a stream.
#[derive(Debug)]
pub struct FrameSink {
    tx: watch::Sender<Option<Frame>>,
    ended: Arc<AtomicBool>,
}

impl FrameSink {
    /// Publish a new frame. Returns false once the stream has ended.
    pub fn push(&self, frame: Frame) -> bool {
        if self.is_ended() {
            return false;
        }
        self.tx.send_replace(Some(frame));
        true
    }

    /// Whether the primary handle stopped its tracks or every consumer is gone.
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst) || self.tx.is_closed()
    }
}

/// Consumer handle onto a frame stream.
#[derive(Debug)]
pub struct MediaStream {
    id: u64,
    label: String,
    frames: watch::Receiver<Option<Frame>>,
    ended: Arc<AtomicBool>,
}

impl MediaStream {
    /// Create a stream and the sink that feeds it.
    pub fn channel(label: impl Into<String>) -> (FrameSink, MediaStream) {
        let (tx, rx) = watch::channel(None);
        let ended = Arc::new(AtomicBool::new(false));
        let sink = FrameSink {
            tx,
            ended: Arc::clone(&ended),
        };
        let stream = MediaStream {
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
            frames: rx,
            ended,
        };
        (sink, stream)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// A second handle onto the same frames with independent track state.
    pub fn fork(&self) -> MediaStream {
        MediaStream {
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            label: format!("{} (fork)", self.label),
            frames: self.frames.clone(),
            ended: Arc::new(AtomicBool::new(self.ended.load(Ordering::SeqCst))),
        }
    }

    /// Newest frame, or `None` when nothing has been decoded yet.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.frames.borrow().clone()
    }

    /// Dimensions of the newest frame.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frames
            .borrow()
            .as_ref()
            .map(|f| (f.width(), f.height()))
    }

    /// A raw receiver for consumers that wait on new frames.
    pub fn subscribe(&self) -> watch::Receiver<Option<Frame>> {
        self.frames.clone()
    }

    /// Stop this handle's tracks. Safe to call repeatedly.
    pub fn stop_tracks(&self) {
        if !self.ended.swap(true, Ordering::SeqCst) {
            tracing::debug!("Stopped tracks of stream {} ({})", self.id, self.label);
        }
    }

    /// Whether this handle's tracks are live.
    pub fn is_active(&self) -> bool {
        !self.ended.load(Ordering::SeqCst)
    }
}
