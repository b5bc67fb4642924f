//! Error types for request building, transport and job tracking

use thiserror::Error;

/// Request rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No audio source selected")]
    MissingAudioSource,

    #[error("No lyrics selected")]
    MissingLyrics,

    #[error("Lyrics identifier is empty")]
    EmptyLyricsId,

    #[error("Manual lyrics are empty")]
    EmptyManualLyrics,

    #[error("No time range selected")]
    MissingTimeRange,

    #[error("Time range {0} is empty")]
    EmptyTimeField(&'static str),
}

/// Failure talking to the render server
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

/// Outcome of a generation that did not produce a video
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Submission failed; the job was never tracked
    #[error("Failed to submit request: {0}")]
    SubmissionFailed(String),

    /// Server reported the job as failed
    #[error("Generation failed: {0}")]
    JobFailed(String),

    /// Polling gave up under a bounded poll policy
    #[error("Lost contact with server after {attempts} failed polls: {last_error}")]
    TrackingLost { attempts: u32, last_error: String },

    /// Tracking was canceled by the caller
    #[error("Job tracking canceled")]
    Canceled,
}

/// Log filter could not be switched to the configured level
#[derive(Debug, Error)]
pub enum LogFilterError {
    #[error("Invalid log level {0:?}: {1}")]
    InvalidLevel(String, String),

    #[error("Failed to reload log filter: {0}")]
    Reload(String),
}
