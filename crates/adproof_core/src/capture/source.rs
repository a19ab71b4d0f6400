//! Capture stream acquisition.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::CaptureSettings;

use super::stream::MediaStream;

/// Failure to obtain the raw display stream. Both variants end the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The user or the platform refused access to the display.
    #[error("Screen capture permission denied")]
    PermissionDenied,

    /// No capture facility exists on this host.
    #[error("Screen capture unavailable: {0}")]
    CaptureUnavailable(String),
}

impl CaptureError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::CaptureUnavailable(message.into())
    }
}

/// Hints passed to the capture facility.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Target frames per second for the raw stream.
    pub frame_rate: u32,
    /// Prefer a window whose title contains this text over a whole monitor.
    pub prefer_window_title: Option<String>,
    /// Leave the tool's own surface out of the candidates where possible.
    pub exclude_own_surface: bool,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self::from(&CaptureSettings::default())
    }
}

impl From<&CaptureSettings> for CaptureRequest {
    fn from(settings: &CaptureSettings) -> Self {
        Self {
            frame_rate: settings.frame_rate.max(1),
            prefer_window_title: settings
                .prefer_window_title
                .clone()
                .filter(|title| !title.trim().is_empty()),
            exclude_own_surface: settings.exclude_own_surface,
        }
    }
}

/// Host display-capture facility.
///
/// `acquire` is called at most once per batch run; the returned stream is
/// shared by every item of that run.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn acquire(&self, request: &CaptureRequest) -> Result<MediaStream, CaptureError>;
}
