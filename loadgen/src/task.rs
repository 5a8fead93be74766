//! The create-event task a simulated user executes.

use std::future::Future;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use bytes::Bytes;
use event_wire::{CreateEventRequest, EVENTS_PATH};
use hyper::StatusCode;

use crate::client::HttpClient;

/// Sequential requests issued by one task execution.
pub const REQUESTS_PER_TASK: usize = 10;

/// Prefix of the line written for every rejected request.
pub const FAILURE_PREFIX: &str = "Failed to create event:";

/// Name under which create-event requests are aggregated.
pub const CREATE_EVENT: &str = "POST /api/v1/events";

/// Where diagnostic lines go, stdout for the binary.
pub type DiagnosticSink = Arc<Mutex<dyn Write + Send>>;

#[must_use]
pub fn stdout_sink() -> DiagnosticSink {
    Arc::new(Mutex::new(io::stdout()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Status 200.
    Success,
    /// Any other status, with the response body text.
    Rejected { status: StatusCode, body: String },
    /// No response was received.
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub name: &'static str,
    pub rtt: Duration,
    pub outcome: Outcome,
}

impl RequestRecord {
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Writes a `Failed to create event: <body>` line if the request was rejected.
    ///
    /// Transport failures have no body and are only logged.
    pub fn write_diagnostic<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        if let Outcome::Rejected { body, .. } = &self.outcome {
            writeln!(out, "{FAILURE_PREFIX} {body}")?;
            out.flush()?;
        }
        Ok(())
    }
}

/// Every request outcome of one task execution, in issue order.
#[derive(Debug, Clone, Default)]
pub struct TaskReport {
    pub requests: Vec<RequestRecord>,
}

impl TaskReport {
    pub fn failures(&self) -> impl Iterator<Item = &RequestRecord> {
        self.requests.iter().filter(|r| !r.is_success())
    }
}

/// A unit of work a simulated user repeats between waits.
///
/// Diagnostics are written to `diagnostics` as responses arrive, so they survive a run
/// that stops before the task completes.
pub trait UserBehavior: Send + Sync + 'static {
    fn run(
        &self,
        client: &HttpClient,
        diagnostics: &DiagnosticSink,
    ) -> impl Future<Output = TaskReport> + Send;
}

/// Posts the fixed test event to `/api/v1/events`, [`REQUESTS_PER_TASK`] times in a row.
#[derive(Debug, Clone)]
pub struct CreateEventTask {
    body: Bytes,
    requests: usize,
}

impl CreateEventTask {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_payload(&CreateEventRequest::test_event())
    }

    pub fn with_payload(payload: &CreateEventRequest) -> anyhow::Result<Self> {
        let body = payload
            .to_body()
            .context("Failed to serialize create event request")?;
        Ok(Self {
            body: Bytes::from(body),
            requests: REQUESTS_PER_TASK,
        })
    }

    #[must_use]
    pub fn requests_per_task(mut self, requests: usize) -> Self {
        self.requests = requests;
        self
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    async fn create_event(
        &self,
        client: &HttpClient,
        diagnostics: &DiagnosticSink,
    ) -> RequestRecord {
        let (rtt, resp) = run_timed(client.post_json(EVENTS_PATH, self.body.clone())).await;
        let outcome = match resp {
            Ok(resp) if resp.status == StatusCode::OK => Outcome::Success,
            Ok(resp) => {
                tracing::debug!(status = %resp.status, "create event rejected");
                Outcome::Rejected {
                    status: resp.status,
                    body: resp.text(),
                }
            }
            Err(e) => {
                tracing::warn!("create event request failed: {e:#}");
                Outcome::Transport(format!("{e:#}"))
            }
        };
        let record = RequestRecord {
            name: CREATE_EVENT,
            rtt,
            outcome,
        };
        emit_diagnostic(diagnostics, &record);
        record
    }
}

impl UserBehavior for CreateEventTask {
    async fn run(&self, client: &HttpClient, diagnostics: &DiagnosticSink) -> TaskReport {
        let mut requests = Vec::with_capacity(self.requests);
        for _ in 0..self.requests {
            requests.push(self.create_event(client, diagnostics).await);
        }
        TaskReport { requests }
    }
}

fn emit_diagnostic(diagnostics: &DiagnosticSink, record: &RequestRecord) {
    let Ok(mut out) = diagnostics.lock() else {
        tracing::warn!("diagnostic sink poisoned");
        return;
    };
    if let Err(e) = record.write_diagnostic(&mut *out) {
        tracing::warn!("failed to write diagnostic: {e}");
    }
}

#[inline]
async fn run_timed<T, F: Future<Output = T>>(fut: F) -> (Duration, T) {
    let start = Instant::now();
    let res = fut.await;
    (start.elapsed(), res)
}
