//! Render server request/response types
//!
//! Mirrors the two job endpoints of the render server:
//! - `POST /generate` takes a [`GenerateRequestBody`] and answers with a [`SubmitResponse`]
//! - `GET /status/{job_id}` answers with a [`JobSnapshot`]
//!
//! Unknown response fields are ignored so server-side additions (timestamps,
//! echoed payloads) do not break the client.

use bratgen_common::JobStatus;
use serde::{Deserialize, Serialize};

/// JSON body of `POST /generate`
///
/// Exactly one of `lyrics_id` and `manual_lrc` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequestBody {
    /// Song title for display and output naming
    pub song: String,
    /// Artist name for display
    pub artist: String,
    /// Audio source identifier
    pub video_id: String,
    /// Lyrics catalogue identifier
    pub lyrics_id: Option<String>,
    /// Raw synchronized lyrics typed or pasted by the user
    pub manual_lrc: Option<String>,
    /// Clip start, `M:SS`
    pub start_time: String,
    /// Clip end, `M:SS`
    pub end_time: String,
    /// Lo-fi intensity level
    pub lofi: u32,
    /// Maximum font size in pixels
    pub fontsize: u32,
    /// Background color
    pub bgcolor: String,
    /// Text color; server default applies when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textcolor: Option<String>,
}

/// Response of `POST /generate`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubmitResponse {
    /// Identifier for status polling; absent on a malformed response
    #[serde(default)]
    pub job_id: Option<String>,
    /// Initial status tag as reported by the server
    #[serde(default)]
    pub status: Option<String>,
}

/// Response of `GET /status/{job_id}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    pub status: JobStatus,
    /// 1-based queue position; meaningful only while queued
    #[serde(default)]
    pub position: Option<u32>,
    /// Rendered video location, present once completed
    #[serde(default)]
    pub result: Option<String>,
    /// Failure description, present once failed
    #[serde(default)]
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn new(status: JobStatus) -> Self {
        Self {
            id: None,
            status,
            position: None,
            result: None,
            error: None,
        }
    }

    pub fn queued(position: u32) -> Self {
        Self {
            position: Some(position),
            ..Self::new(JobStatus::Queued)
        }
    }

    pub fn processing() -> Self {
        Self::new(JobStatus::Processing)
    }

    pub fn completed(result: impl Into<String>) -> Self {
        Self {
            result: Some(result.into()),
            ..Self::new(JobStatus::Completed)
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(JobStatus::Failed)
        }
    }
}
