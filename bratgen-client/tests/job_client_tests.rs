//! Tests for generation job submission and tracking
//!
//! Tests cover:
//! - Submission failures (transport error, missing job id) never poll
//! - Progress reporting and exactly one terminal update
//! - Poll cadence under the default 2 second policy
//! - Cancellation between polls
//! - Transient poll errors under unbounded and bounded policies
//! - Late and out-of-order snapshots
//!
//! Time is paused, so the poll interval elapses instantly.

use async_trait::async_trait;
use bratgen_client::api::{GenerateRequestBody, JobSnapshot, SubmitResponse};
use bratgen_client::{
    GenerationError, GenerationJobClient, GenerationRequest, JobTransport, TrackingState,
    TransportError,
};
use bratgen_common::config::PollPolicy;
use bratgen_common::{JobUpdate, TimeRange};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that answers from a fixed script
///
/// Once the status script runs out, every poll reports `processing`.
struct ScriptedTransport {
    submit_response: Mutex<Option<Result<SubmitResponse, TransportError>>>,
    statuses: Mutex<VecDeque<Result<JobSnapshot, TransportError>>>,
    submitted: Mutex<Vec<GenerateRequestBody>>,
    polls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(
        submit_response: Result<SubmitResponse, TransportError>,
        statuses: Vec<Result<JobSnapshot, TransportError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            submit_response: Mutex::new(Some(submit_response)),
            statuses: Mutex::new(statuses.into()),
            submitted: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        })
    }

    fn accepting(statuses: Vec<Result<JobSnapshot, TransportError>>) -> Arc<Self> {
        Self::new(
            Ok(SubmitResponse {
                job_id: Some("job-1".to_string()),
                status: Some("queued".to_string()),
            }),
            statuses,
        )
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobTransport for ScriptedTransport {
    async fn submit(&self, body: &GenerateRequestBody) -> Result<SubmitResponse, TransportError> {
        self.submitted.lock().unwrap().push(body.clone());
        self.submit_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(TransportError::Network("submitted twice".to_string())))
    }

    async fn fetch_status(&self, _job_id: &str) -> Result<JobSnapshot, TransportError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(JobSnapshot::processing()))
    }
}

fn request() -> GenerationRequest {
    GenerationRequest::builder()
        .video_id("dQw4w9WgXcQ")
        .lyrics_id("1234")
        .song("Von dutch")
        .artist("Charli xcx")
        .time_range(TimeRange::new("0:12", "0:31"))
        .build()
        .unwrap()
}

fn client(transport: &Arc<ScriptedTransport>) -> GenerationJobClient<ScriptedTransport> {
    GenerationJobClient::new(Arc::clone(transport), PollPolicy::default())
}

fn network_error() -> TransportError {
    TransportError::Network("connection refused".to_string())
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_missing_job_id_fails_without_polling() {
    let transport = ScriptedTransport::new(Ok(SubmitResponse::default()), vec![]);

    let result = client(&transport).submit(&request()).await;
    assert!(matches!(result, Err(GenerationError::SubmissionFailed(_))));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.polls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_blank_job_id_fails_without_polling() {
    let transport = ScriptedTransport::new(
        Ok(SubmitResponse {
            job_id: Some("  ".to_string()),
            status: None,
        }),
        vec![],
    );

    let result = client(&transport).submit(&request()).await;
    assert!(matches!(result, Err(GenerationError::SubmissionFailed(_))));
    assert_eq!(transport.polls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submit_transport_error_is_not_retried() {
    let transport = ScriptedTransport::new(Err(TransportError::Api(500, "boom".to_string())), vec![]);

    match client(&transport).submit(&request()).await {
        Err(GenerationError::SubmissionFailed(message)) => assert!(message.contains("boom")),
        other => panic!("Expected submission failure, got {:?}", other),
    }

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.submitted.lock().unwrap().len(), 1);
    assert_eq!(transport.polls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submit_sends_request_fields() {
    let transport = ScriptedTransport::accepting(vec![Ok(JobSnapshot::completed("/out.mp4"))]);

    let handle = client(&transport).submit(&request()).await.unwrap();
    assert_eq!(handle.job_id(), "job-1");
    handle.wait().await.unwrap();

    let submitted = transport.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].video_id, "dQw4w9WgXcQ");
    assert_eq!(submitted[0].lyrics_id.as_deref(), Some("1234"));
    assert_eq!(submitted[0].start_time, "0:12");
    assert_eq!(submitted[0].end_time, "0:31");
}

// =============================================================================
// Tracking
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_progress_then_single_terminal_update() {
    let transport = ScriptedTransport::accepting(vec![
        Ok(JobSnapshot::queued(1)),
        Ok(JobSnapshot::queued(1)),
        Ok(JobSnapshot::processing()),
        Ok(JobSnapshot::completed("/generated/brat_1.mp4")),
    ]);

    let handle = client(&transport).submit(&request()).await.unwrap();

    let mut seen = Vec::new();
    let result = handle.wait_with(|update| seen.push(update.clone())).await;

    assert_eq!(result.unwrap(), "/generated/brat_1.mp4");
    assert_eq!(
        seen,
        vec![
            JobUpdate::Queued { position: 1 },
            JobUpdate::Processing,
            JobUpdate::Completed {
                result: "/generated/brat_1.mp4".to_string()
            },
        ]
    );

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.polls(), 4, "no polls after the terminal status");
}

#[tokio::test(start_paused = true)]
async fn test_polls_every_two_seconds() {
    let transport = ScriptedTransport::accepting(vec![
        Ok(JobSnapshot::queued(2)),
        Ok(JobSnapshot::processing()),
        Ok(JobSnapshot::completed("/out.mp4")),
    ]);

    let started = tokio::time::Instant::now();
    client(&transport).submit(&request()).await.unwrap().wait().await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(6), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(7), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_reports_server_error_verbatim() {
    let transport = ScriptedTransport::accepting(vec![
        Ok(JobSnapshot::processing()),
        Ok(JobSnapshot::failed("No lyrics found in selected range")),
    ]);

    let result = client(&transport).submit(&request()).await.unwrap().wait().await;
    match result {
        Err(GenerationError::JobFailed(error)) => {
            assert_eq!(error, "No lyrics found in selected range")
        }
        other => panic!("Expected job failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_after_terminal_are_ignored() {
    let transport = ScriptedTransport::accepting(vec![
        Ok(JobSnapshot::completed("/first.mp4")),
        Ok(JobSnapshot::failed("late")),
    ]);

    let mut handle = client(&transport).submit(&request()).await.unwrap();
    assert_eq!(
        handle.next_update().await,
        Some(JobUpdate::Completed {
            result: "/first.mp4".to_string()
        })
    );
    assert_eq!(handle.state(), &TrackingState::Completed);
    assert_eq!(handle.next_update().await, None);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.polls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_snapshot_is_ignored() {
    let transport = ScriptedTransport::accepting(vec![
        Ok(JobSnapshot::processing()),
        Ok(JobSnapshot::queued(3)),
        Ok(JobSnapshot::completed("/out.mp4")),
    ]);

    let handle = client(&transport).submit(&request()).await.unwrap();
    let mut seen = Vec::new();
    handle.wait_with(|update| seen.push(update.clone())).await.unwrap();

    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], JobUpdate::Processing);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_between_polls_stops_updates() {
    let transport = ScriptedTransport::accepting(vec![Ok(JobSnapshot::queued(4))]);

    let mut handle = client(&transport).submit(&request()).await.unwrap();
    assert_eq!(handle.next_update().await, Some(JobUpdate::Queued { position: 4 }));

    handle.cancel();
    let polls_at_cancel = transport.polls();

    assert_eq!(handle.state(), &TrackingState::Canceled);
    assert_eq!(handle.next_update().await, None);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.polls(), polls_at_cancel);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_pending_updates() {
    let transport = ScriptedTransport::accepting(vec![
        Ok(JobSnapshot::queued(2)),
        Ok(JobSnapshot::queued(1)),
        Ok(JobSnapshot::completed("/out.mp4")),
    ]);

    let mut handle = client(&transport).submit(&request()).await.unwrap();
    // Let the poller run ahead without consuming anything
    tokio::time::sleep(Duration::from_secs(3)).await;

    handle.cancel();
    assert_eq!(handle.next_update().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_completion_keeps_outcome() {
    let transport = ScriptedTransport::accepting(vec![Ok(JobSnapshot::completed("/out.mp4"))]);

    let mut handle = client(&transport).submit(&request()).await.unwrap();
    handle.next_update().await;
    handle.cancel();

    assert_eq!(handle.state(), &TrackingState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_polling() {
    let transport = ScriptedTransport::accepting(vec![]);

    let handle = client(&transport).submit(&request()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    drop(handle);
    let polls_at_drop = transport.polls();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.polls(), polls_at_drop);
}

// =============================================================================
// Poll failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_transient_errors_keep_polling() {
    let transport = ScriptedTransport::accepting(vec![
        Err(network_error()),
        Err(TransportError::Api(502, "Bad Gateway".to_string())),
        Err(TransportError::Parse("unknown variant `paused`".to_string())),
        Ok(JobSnapshot::processing()),
        Ok(JobSnapshot::completed("/out.mp4")),
    ]);

    let result = client(&transport).submit(&request()).await.unwrap().wait().await;
    assert_eq!(result.unwrap(), "/out.mp4");
    assert_eq!(transport.polls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_policy_gives_up() {
    let transport = ScriptedTransport::accepting((0..10).map(|_| Err(network_error())).collect());
    let policy = PollPolicy {
        max_consecutive_failures: Some(3),
        ..PollPolicy::default()
    };
    let client = GenerationJobClient::new(Arc::clone(&transport), policy);

    let mut handle = client.submit(&request()).await.unwrap();
    let update = handle.next_update().await;
    assert!(matches!(update, Some(JobUpdate::TrackingLost { attempts: 3, .. })));
    assert_eq!(handle.state(), &TrackingState::TrackingLost);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_policy_resets_on_success() {
    let transport = ScriptedTransport::accepting(vec![
        Err(network_error()),
        Err(network_error()),
        Ok(JobSnapshot::queued(1)),
        Err(network_error()),
        Err(network_error()),
        Ok(JobSnapshot::completed("/out.mp4")),
    ]);
    let policy = PollPolicy {
        max_consecutive_failures: Some(3),
        ..PollPolicy::default()
    };
    let client = GenerationJobClient::new(Arc::clone(&transport), policy);

    let result = client.submit(&request()).await.unwrap().wait().await;
    assert_eq!(result.unwrap(), "/out.mp4");
}

#[tokio::test(start_paused = true)]
async fn test_track_existing_job() {
    let transport = ScriptedTransport::accepting(vec![Ok(JobSnapshot::completed("/resumed.mp4"))]);

    let handle = client(&transport).track("job-9");
    assert_eq!(handle.job_id(), "job-9");
    assert_eq!(handle.wait().await.unwrap(), "/resumed.mp4");
    assert!(transport.submitted.lock().unwrap().is_empty());
}
