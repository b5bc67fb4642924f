//! Generation job status and update events
//!
//! [`JobStatus`] is the closed set of status tags the render server reports.
//! [`JobUpdate`] is what a tracked job tells its owner; every tracked job ends
//! with exactly one terminal update.

use serde::{Deserialize, Serialize};

/// Server-side job status
///
/// Variants are declared in lifecycle order; a job only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting in the render queue
    Queued,
    /// Render in progress
    Processing,
    /// Render finished, result available
    Completed,
    /// Render failed, error available
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Lifecycle stage; `Completed` and `Failed` share the final stage
    pub fn stage(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Progress or outcome of a tracked job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobUpdate {
    /// Waiting in the queue
    Queued {
        /// 1-based position in the render queue
        position: u32,
    },

    /// Server started rendering
    Processing,

    /// Terminal: render finished
    Completed {
        /// Location of the rendered video (server-relative or absolute URL)
        result: String,
    },

    /// Terminal: server reported failure
    Failed {
        /// Server-provided error text, verbatim
        error: String,
    },

    /// Terminal: polling gave up under a bounded poll policy
    TrackingLost {
        /// Consecutive failed polls before giving up
        attempts: u32,
        /// Last transport error seen
        last_error: String,
    },
}

impl JobUpdate {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobUpdate::Completed { .. } | JobUpdate::Failed { .. } | JobUpdate::TrackingLost { .. }
        )
    }

    /// One-line status text for display
    pub fn status_message(&self) -> String {
        match self {
            JobUpdate::Queued { position } => format!("Queued (Position: {})", position),
            JobUpdate::Processing => "Processing Video... (This may take a minute)".to_string(),
            JobUpdate::Completed { .. } => "Done!".to_string(),
            JobUpdate::Failed { error } => format!("Failed: {}", error),
            JobUpdate::TrackingLost { attempts, last_error } => format!(
                "Lost contact with server after {} attempts: {}",
                attempts, last_error
            ),
        }
    }
}

/// Update stamped with its job and observation time, for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: String,
    #[serde(flatten)]
    pub update: JobUpdate,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl JobEvent {
    pub fn now(job_id: impl Into<String>, update: JobUpdate) -> Self {
        Self {
            job_id: job_id.into(),
            update,
            timestamp: chrono::Utc::now(),
        }
    }
}
