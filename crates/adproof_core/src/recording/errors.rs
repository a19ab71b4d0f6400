//! Recording error types.

use thiserror::Error;

use crate::capture::CaptureError;

/// Errors from recording sessions and the capture controller.
#[derive(Error, Debug)]
pub enum RecordingError {
    /// The stream never produced a non-empty chunk.
    #[error("No data recorded")]
    NoDataRecorded,

    /// `start` was called before a raw stream was acquired.
    #[error("Recorder is not prepared; capture permission has not been granted")]
    NotPrepared,

    #[error("Recording already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    /// A frame could not be encoded, or the encoder task died.
    #[error("Failed to encode recording: {0}")]
    Encode(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl RecordingError {
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }
}

/// Result type for recording operations.
pub type RecordingResult<T> = Result<T, RecordingError>;
