//! bratgen client library
//!
//! Builds lyric-video generation requests, submits them to the render server
//! and tracks each job until the server reports a result or a failure.

pub mod api;
pub mod error;
pub mod job;
pub mod logging;
pub mod request;
pub mod transport;

pub use error::{GenerationError, LogFilterError, TransportError, ValidationError};
pub use job::{terminal_outcome, GenerationJobClient, JobHandle, JobTracker, TrackingState};
pub use request::{GenerationRequest, GenerationRequestBuilder, LyricsSource};
pub use transport::{HttpJobTransport, JobTransport};
