//! Viewport-to-stream coordinate mapping.

use serde::{Deserialize, Serialize};

/// Rectangle in viewport (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Integer rectangle in raw-stream pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Where a crop is read from and where it lands on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlacement {
    /// Region of the raw frame, in frame pixels.
    pub source: PixelRect,
    /// Region of the crop surface it is drawn into, in surface pixels.
    pub dest: PixelRect,
}

impl CropPlacement {
    /// Whether `dest` covers a `width`x`height` surface entirely.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.dest.x == 0 && self.dest.y == 0 && self.dest.width == width && self.dest.height == height
    }
}

/// Map the crop for `element` into the pixel space of a `frame_size` frame.
///
/// The scale factor is frame pixels over viewport pixels on each axis.
/// When the element box is larger than the requested crop, the crop is
/// centred inside the box. The source is clamped to the frame and the
/// destination is clipped by the same proportion, so a crop running off
/// the frame edge leaves the uncovered part of the surface untouched.
/// `None` means nothing of the crop lies inside the frame.
pub fn map_crop(
    element: Rect,
    viewport: Size,
    frame_size: (u32, u32),
    crop_width: u32,
    crop_height: u32,
) -> Option<CropPlacement> {
    if viewport.is_empty() || crop_width == 0 || crop_height == 0 {
        return None;
    }
    let (frame_w, frame_h) = (frame_size.0 as f64, frame_size.1 as f64);
    let scale_x = frame_w / viewport.width;
    let scale_y = frame_h / viewport.height;

    let offset_x = ((element.width - crop_width as f64) / 2.0).max(0.0);
    let offset_y = ((element.height - crop_height as f64) / 2.0).max(0.0);

    let left = (element.x + offset_x) * scale_x;
    let top = (element.y + offset_y) * scale_y;
    let right = left + crop_width as f64 * scale_x;
    let bottom = top + crop_height as f64 * scale_y;

    let x0 = left.max(0.0).round();
    let y0 = top.max(0.0).round();
    let x1 = right.min(frame_w).round();
    let y1 = bottom.min(frame_h).round();

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let (dest_x, dest_width) = clip_span(x0 - left, x1 - x0, scale_x, crop_width)?;
    let (dest_y, dest_height) = clip_span(y0 - top, y1 - y0, scale_y, crop_height)?;

    Some(CropPlacement {
        source: PixelRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        },
        dest: PixelRect {
            x: dest_x,
            y: dest_y,
            width: dest_width,
            height: dest_height,
        },
    })
}

/// Scale a clamped frame span back to surface pixels, kept inside `extent`.
fn clip_span(start: f64, length: f64, scale: f64, extent: u32) -> Option<(u32, u32)> {
    let start = ((start / scale).round().max(0.0) as u32).min(extent);
    let length = ((length / scale).round() as u32).min(extent - start);
    (length > 0).then_some((start, length))
}
