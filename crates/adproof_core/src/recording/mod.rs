//! Recording subsystem.
//!
//! - [`RecordingSession`]: start/stop/pause/resume over one stream
//! - [`CaptureController`]: run-scoped [`Recorder`] that owns the raw stream
//! - [`FrameEncoder`]: pluggable chunk encoder, Motion-JPEG by default

mod controller;
mod encoder;
mod errors;
mod session;

pub use controller::{CaptureController, RecordMode, Recorder};
pub use encoder::{EncoderFactory, FrameEncoder, MjpegEncoder, MJPEG_MIME_TYPE};
pub use errors::{RecordingError, RecordingResult};
pub use session::{RecorderState, RecordingSession};
