//! Generation job submission and status tracking
//!
//! Submitting a request hands back a [`JobHandle`]. Behind the handle a
//! single polling task reads the job's status on the configured interval and
//! forwards progress to the handle until the job reaches a terminal status.
//!
//! Guarantees:
//! - exactly one terminal update per tracked job
//! - snapshots that arrive after a terminal one, or that move the job back
//!   to an earlier status, are ignored
//! - transient poll errors never end tracking under the default policy
//! - once [`JobHandle::cancel`] returns, no further update is observable

use crate::api::JobSnapshot;
use crate::error::{GenerationError, TransportError};
use crate::request::GenerationRequest;
use crate::transport::{HttpJobTransport, JobTransport};
use bratgen_common::config::{ClientConfig, PollPolicy};
use bratgen_common::{JobStatus, JobUpdate};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Turns raw status snapshots into job updates
///
/// Applies the ordering rules: statuses only move forward, nothing is
/// reported after a terminal status, and repeated identical progress is
/// reported once.
#[derive(Debug, Default)]
pub struct JobTracker {
    last_status: Option<JobStatus>,
    last_progress: Option<JobUpdate>,
    finished: bool,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn last_status(&self) -> Option<JobStatus> {
        self.last_status
    }

    /// Fold one snapshot into the tracker; returns the update to report, if any
    pub fn observe(&mut self, snapshot: &JobSnapshot) -> Option<JobUpdate> {
        if self.finished {
            debug!(status = %snapshot.status, "Ignoring snapshot for finished job");
            return None;
        }

        if let Some(last) = self.last_status {
            if snapshot.status.stage() < last.stage() {
                debug!(last = %last, status = %snapshot.status, "Ignoring out-of-order snapshot");
                return None;
            }
        }
        self.last_status = Some(snapshot.status);

        let update = match snapshot.status {
            JobStatus::Queued => JobUpdate::Queued {
                position: snapshot.position.unwrap_or(0),
            },
            JobStatus::Processing => JobUpdate::Processing,
            JobStatus::Completed => match snapshot.result.as_deref().filter(|r| !r.is_empty()) {
                Some(result) => JobUpdate::Completed {
                    result: result.to_string(),
                },
                None => JobUpdate::Failed {
                    error: "job completed without a result".to_string(),
                },
            },
            JobStatus::Failed => JobUpdate::Failed {
                error: snapshot
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            },
        };

        if update.is_terminal() {
            self.finished = true;
            return Some(update);
        }

        if self.last_progress.as_ref() == Some(&update) {
            return None;
        }
        self.last_progress = Some(update.clone());
        Some(update)
    }
}

/// Client-side view of a tracked job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingState {
    /// Polling; `last_status` is the most recent status reported
    Tracking { last_status: Option<JobStatus> },
    /// Terminal: result delivered
    Completed,
    /// Terminal: failure delivered
    Failed,
    /// Terminal: bounded poll policy exhausted, or the poll task stopped
    TrackingLost,
    /// Caller stopped tracking
    Canceled,
}

impl TrackingState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, TrackingState::Tracking { .. })
    }
}

/// Submits generation requests and tracks them to completion
pub struct GenerationJobClient<T: ?Sized = HttpJobTransport> {
    transport: Arc<T>,
    policy: PollPolicy,
}

impl GenerationJobClient<HttpJobTransport> {
    /// HTTP client for the server and poll policy in `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = HttpJobTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport), config.poll.clone()))
    }
}

impl<T> GenerationJobClient<T>
where
    T: JobTransport + ?Sized + 'static,
{
    pub fn new(transport: Arc<T>, policy: PollPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Submit a request and start tracking it.
    ///
    /// Submission is attempted once. A transport failure or a response
    /// without a job id is reported as [`GenerationError::SubmissionFailed`]
    /// and nothing is polled.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, GenerationError> {
        let body = request.to_body();
        info!(
            song = %body.song,
            artist = %body.artist,
            video_id = %body.video_id,
            start = %body.start_time,
            end = %body.end_time,
            "Submitting generation request"
        );

        let response = self.transport.submit(&body).await.map_err(|e| {
            warn!(error = %e, "Generation request submission failed");
            GenerationError::SubmissionFailed(e.to_string())
        })?;

        let job_id = response
            .job_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                warn!("Submission response carried no job id");
                GenerationError::SubmissionFailed("No job ID received".to_string())
            })?;

        info!(job_id = %job_id, status = ?response.status, "Generation job accepted");
        Ok(self.track(job_id))
    }

    /// Start tracking an already-submitted job.
    ///
    /// Must be called from within a tokio runtime.
    pub fn track(&self, job_id: impl Into<String>) -> JobHandle {
        let job_id = job_id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let task = tokio::spawn(poll_until_terminal(
            Arc::clone(&self.transport),
            job_id.clone(),
            self.policy.clone(),
            tx,
            cancel_token.clone(),
        ));

        JobHandle {
            job_id,
            updates: rx,
            cancel_token,
            task: Some(task),
            state: TrackingState::Tracking { last_status: None },
        }
    }

    /// Read a job's status once, without tracking it
    pub async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, TransportError> {
        self.transport.fetch_status(job_id).await
    }
}

/// Handle to one tracked job
///
/// Updates are consumed through [`JobHandle::next_update`] or
/// [`JobHandle::wait_with`]. Dropping the handle stops polling.
pub struct JobHandle {
    job_id: String,
    updates: mpsc::UnboundedReceiver<JobUpdate>,
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
    state: TrackingState,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Next progress or terminal update.
    ///
    /// Returns `None` once the job has finished or tracking was canceled.
    pub async fn next_update(&mut self) -> Option<JobUpdate> {
        if self.is_finished() {
            return None;
        }

        match self.updates.recv().await {
            Some(update) => {
                self.record(&update);
                Some(update)
            }
            None => {
                warn!(job_id = %self.job_id, "Polling task stopped without a terminal status");
                self.state = TrackingState::TrackingLost;
                self.stop_polling();
                None
            }
        }
    }

    /// Drive the job to its end, passing every update to `on_update`.
    ///
    /// Resolves to the result location on completion.
    pub async fn wait_with<F>(mut self, mut on_update: F) -> Result<String, GenerationError>
    where
        F: FnMut(&JobUpdate),
    {
        while let Some(update) = self.next_update().await {
            on_update(&update);
            if let Some(outcome) = terminal_outcome(update) {
                return outcome;
            }
        }
        Err(self.stopped_error())
    }

    /// Error for a handle whose updates ran out without a terminal one
    pub fn stopped_error(&self) -> GenerationError {
        match self.state {
            TrackingState::Canceled => GenerationError::Canceled,
            _ => GenerationError::TrackingLost {
                attempts: 0,
                last_error: "polling stopped before the job finished".to_string(),
            },
        }
    }

    pub async fn wait(self) -> Result<String, GenerationError> {
        self.wait_with(|_| {}).await
    }

    /// Stop tracking. The server-side job is not informed.
    ///
    /// Any update not yet consumed is discarded; after this returns,
    /// [`JobHandle::next_update`] yields `None`. No effect on a finished job.
    pub fn cancel(&mut self) {
        if self.is_finished() {
            return;
        }
        self.stop_polling();
        self.state = TrackingState::Canceled;
        info!(job_id = %self.job_id, "Stopped tracking generation job");
    }

    fn record(&mut self, update: &JobUpdate) {
        self.state = match update {
            JobUpdate::Queued { .. } => TrackingState::Tracking {
                last_status: Some(JobStatus::Queued),
            },
            JobUpdate::Processing => TrackingState::Tracking {
                last_status: Some(JobStatus::Processing),
            },
            JobUpdate::Completed { result } => {
                info!(job_id = %self.job_id, result = %result, "Generation job completed");
                TrackingState::Completed
            }
            JobUpdate::Failed { error } => {
                warn!(job_id = %self.job_id, error = %error, "Generation job failed");
                TrackingState::Failed
            }
            JobUpdate::TrackingLost { attempts, .. } => {
                warn!(job_id = %self.job_id, attempts = attempts, "Gave up polling generation job");
                TrackingState::TrackingLost
            }
        };

        if self.is_finished() {
            self.stop_polling();
        }
    }

    fn stop_polling(&mut self) {
        self.cancel_token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.updates.close();
        while self.updates.try_recv().is_ok() {}
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if !self.is_finished() {
            debug!(job_id = %self.job_id, "Job handle dropped, stopping poll task");
        }
        self.stop_polling();
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("job_id", &self.job_id)
            .field("state", &self.state)
            .finish()
    }
}

/// Outcome carried by a terminal update; `None` for progress updates
pub fn terminal_outcome(update: JobUpdate) -> Option<Result<String, GenerationError>> {
    match update {
        JobUpdate::Completed { result } => Some(Ok(result)),
        JobUpdate::Failed { error } => Some(Err(GenerationError::JobFailed(error))),
        JobUpdate::TrackingLost {
            attempts,
            last_error,
        } => Some(Err(GenerationError::TrackingLost {
            attempts,
            last_error,
        })),
        JobUpdate::Queued { .. } | JobUpdate::Processing => None,
    }
}

/// Poll a job until it reaches a terminal status or tracking is canceled
async fn poll_until_terminal<T>(
    transport: Arc<T>,
    job_id: String,
    policy: PollPolicy,
    updates: mpsc::UnboundedSender<JobUpdate>,
    cancel_token: CancellationToken,
) where
    T: JobTransport + ?Sized,
{
    let mut tracker = JobTracker::new();
    let mut consecutive_failures: u32 = 0;

    debug!(job_id = %job_id, interval_ms = policy.interval_ms, "Started polling job status");

    loop {
        let delay = policy.delay_after_failures(consecutive_failures);
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                debug!(job_id = %job_id, "Polling canceled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let response = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                debug!(job_id = %job_id, "Polling canceled during status request");
                return;
            }
            response = transport.fetch_status(&job_id) => response,
        };

        match response {
            Ok(snapshot) => {
                consecutive_failures = 0;

                let Some(update) = tracker.observe(&snapshot) else {
                    continue;
                };
                debug!(job_id = %job_id, status = %snapshot.status, "Job status changed");

                let terminal = update.is_terminal();
                if updates.send(update).is_err() {
                    debug!(job_id = %job_id, "Job handle gone, stopping poll");
                    return;
                }
                if terminal {
                    return;
                }
            }
            Err(e) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                warn!(
                    job_id = %job_id,
                    attempt = consecutive_failures,
                    error = %e,
                    "Status poll failed, retrying"
                );

                if policy.gives_up_after(consecutive_failures) {
                    let _ = updates.send(JobUpdate::TrackingLost {
                        attempts: consecutive_failures,
                        last_error: e.to_string(),
                    });
                    return;
                }
            }
        }
    }
}
