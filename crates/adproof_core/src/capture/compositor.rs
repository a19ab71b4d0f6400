//! Region compositor.
//!
//! Continuously copies the creative's rectangle out of the raw capture
//! stream into a raster surface and republishes that surface as a derived
//! stream at a fixed frame rate. Every tick re-reads the crop providers, so
//! the element and its size may change while recording is armed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::geometry::{map_crop, Rect, Size};
use super::provider::Provider;
use super::stream::{Frame, FrameSink, MediaStream};

/// Something on screen whose viewport-relative box can be queried.
pub trait ElementHandle: Send + Sync {
    /// Current bounding box, or `None` when the element is detached.
    fn bounding_rect(&self) -> Option<Rect>;
}

impl ElementHandle for Rect {
    fn bounding_rect(&self) -> Option<Rect> {
        Some(*self)
    }
}

/// Shared element reference as read by the compositor.
pub type ElementRef = Option<Arc<dyn ElementHandle>>;

/// Region descriptor resolved on every compositing tick.
#[derive(Clone)]
pub struct CropConfig {
    /// Element to crop to.
    pub element: Provider<ElementRef>,
    /// Requested crop width in CSS pixels.
    pub width: Provider<i32>,
    /// Requested crop height in CSS pixels.
    pub height: Provider<i32>,
    /// Viewport size the element box is relative to.
    pub viewport: Provider<Size>,
}

impl CropConfig {
    pub fn new(
        element: Provider<ElementRef>,
        width: Provider<i32>,
        height: Provider<i32>,
        viewport: Provider<Size>,
    ) -> Self {
        Self {
            element,
            width,
            height,
            viewport,
        }
    }

    /// Crop to a fixed rectangle of a fixed viewport.
    pub fn fixed(rect: Rect, viewport: Size) -> Self {
        let element: Arc<dyn ElementHandle> = Arc::new(rect);
        Self::new(
            Provider::Fixed(Some(element)),
            Provider::Fixed(rect.width.round() as i32),
            Provider::Fixed(rect.height.round() as i32),
            Provider::Fixed(viewport),
        )
    }
}

impl fmt::Debug for CropConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CropConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

/// Why a tick did not draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Width or height is zero or negative.
    InvalidSize,
    /// Element absent or detached.
    NoElement,
    /// Viewport has no area.
    NoViewport,
    /// Raw stream has not decoded a frame yet.
    NoFrame,
    /// Crop lies entirely outside the raw frame.
    OutsideFrame,
}

/// Result of one compositing tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Drawn { width: u32, height: u32 },
    Skipped(SkipReason),
}

/// Raster surface fed from a raw stream.
pub struct RegionCompositor {
    source: watch::Receiver<Option<Frame>>,
    crop: CropConfig,
    surface: RgbaImage,
    sink: FrameSink,
    draws: u64,
}

impl RegionCompositor {
    /// Attach to `raw` and create the derived stream.
    ///
    /// The surface starts at the crop's current size.
    pub fn new(raw: &MediaStream, crop: CropConfig) -> (Self, MediaStream) {
        let (sink, derived) = MediaStream::channel(format!("{} (cropped)", raw.label()));
        let width = crop.width.current().max(0) as u32;
        let height = crop.height.current().max(0) as u32;
        let compositor = Self {
            source: raw.subscribe(),
            crop,
            surface: RgbaImage::new(width, height),
            sink,
            draws: 0,
        };
        (compositor, derived)
    }

    /// Current raster surface dimensions.
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    /// Number of ticks that drew into the surface.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Run one compositing step.
    pub fn tick(&mut self) -> TickOutcome {
        let width = self.crop.width.current();
        let height = self.crop.height.current();
        if width <= 0 || height <= 0 {
            return TickOutcome::Skipped(SkipReason::InvalidSize);
        }

        let Some(element_box) = self
            .crop
            .element
            .current()
            .and_then(|element| element.bounding_rect())
        else {
            return TickOutcome::Skipped(SkipReason::NoElement);
        };

        let (width, height) = (width as u32, height as u32);
        if self.surface.dimensions() != (width, height) {
            tracing::trace!("Resizing crop surface to {}x{}", width, height);
            self.surface = RgbaImage::new(width, height);
        }

        let viewport = self.crop.viewport.current();
        if viewport.is_empty() {
            return TickOutcome::Skipped(SkipReason::NoViewport);
        }

        let Some(frame) = self.source.borrow().clone() else {
            return TickOutcome::Skipped(SkipReason::NoFrame);
        };

        let Some(placement) = map_crop(element_box, viewport, frame.dimensions(), width, height)
        else {
            return TickOutcome::Skipped(SkipReason::OutsideFrame);
        };

        let src = placement.source;
        let dest = placement.dest;
        let region = imageops::crop_imm(&*frame, src.x, src.y, src.width, src.height).to_image();
        if !placement.covers(width, height) {
            self.surface.fill(0);
        }
        if region.dimensions() == (dest.width, dest.height) {
            imageops::replace(&mut self.surface, &region, dest.x as i64, dest.y as i64);
        } else {
            let scaled = imageops::resize(&region, dest.width, dest.height, FilterType::Triangle);
            imageops::replace(&mut self.surface, &scaled, dest.x as i64, dest.y as i64);
        }

        self.draws += 1;
        self.sink.push(Arc::new(self.surface.clone()));
        TickOutcome::Drawn { width, height }
    }

    /// Drive `tick` from a timer at `frame_rate` until released or the
    /// derived stream ends. Must be called inside a tokio runtime.
    pub fn spawn(mut self, frame_rate: u32) -> CompositorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let period = Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_skip = None;

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = stop_rx.changed() => break,
                }
                if self.sink.is_ended() {
                    break;
                }
                match self.tick() {
                    TickOutcome::Skipped(reason) if last_skip != Some(reason) => {
                        tracing::debug!("Compositor skipping frames: {:?}", reason);
                        last_skip = Some(reason);
                    }
                    TickOutcome::Skipped(_) => {}
                    TickOutcome::Drawn { .. } => last_skip = None,
                }
            }
            tracing::debug!("Compositor stopped after {} draws", self.draws);
        });

        CompositorHandle {
            stop: stop_tx,
            task: Some(task),
        }
    }
}

/// Handle to a running compositor loop.
#[derive(Debug)]
pub struct CompositorHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl CompositorHandle {
    /// Stop the tick loop and detach from the raw stream.
    ///
    /// The raw stream itself keeps running. Safe to call repeatedly.
    pub fn release(&mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_released(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for CompositorHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Derived stream plus the handle that keeps it fed.
#[derive(Debug)]
pub struct ComposedStream {
    pub stream: MediaStream,
    pub handle: CompositorHandle,
}

/// Crop `raw` down to `crop` and expose the result as a frame-rate-capped stream.
pub fn compose(raw: &MediaStream, crop: CropConfig, frame_rate: u32) -> ComposedStream {
    let (compositor, stream) = RegionCompositor::new(raw, crop);
    let handle = compositor.spawn(frame_rate);
    ComposedStream { stream, handle }
}
