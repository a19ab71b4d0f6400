//! Capture subsystem.
//!
//! A raw display stream is acquired once per run through a
//! [`CaptureSource`]. In clip mode the [`RegionCompositor`] derives a stream
//! cropped to the creative's on-screen rectangle; the crop is described by
//! a [`CropConfig`] whose values are re-read on every tick.

mod compositor;
mod geometry;
mod provider;
#[cfg(feature = "screen-capture")]
mod screen;
mod source;
mod stream;

pub use compositor::{
    compose, ComposedStream, CompositorHandle, CropConfig, ElementHandle, ElementRef,
    RegionCompositor, SkipReason, TickOutcome,
};
pub use geometry::{map_crop, CropPlacement, PixelRect, Rect, Size};
pub use provider::Provider;
#[cfg(feature = "screen-capture")]
pub use screen::ScreenCaptureSource;
pub use source::{CaptureError, CaptureRequest, CaptureSource};
pub use stream::{Frame, FrameSink, MediaStream};
