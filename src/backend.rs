//! Backend trait and the HTTP-backed implementation.
//!
//! The [`ColdAtomBackend`] trait defines the lifecycle of a cold-atom
//! backend:
//!
//! ```text
//!   capabilities() ──→ translate() ──→ submit() ──→ status() / fetch_result() ──→ wait()
//!    (sync, &ref)        (sync)         (async)          (async)                  (provided)
//! ```
//!
//! ## Method table
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | provided | `&str` |
//! | `kind()` | sync | provided | `BackendKind` |
//! | `capabilities()` | sync | yes | `&BackendCapabilities` |
//! | `submit()` | async | yes | `ColdAtomResult<JobId>` |
//! | `status()` | async | yes | `JobState` |
//! | `fetch_result()` | async | yes | `ColdAtomResult<JobResult>` |
//! | `cancel()` | async | provided (no-op) | `ColdAtomResult<()>` |
//! | `translate()` | sync | provided | `ColdAtomResult<SubmissionPayload>` |
//! | `run_payload()` | async | provided | `ColdAtomResult<JobId>` |
//! | `wait()` | async | provided | `ColdAtomResult<JobResult>` |
//!
//! Capabilities are a constructor postcondition: a [`RemoteBackend`]
//! only exists once its configuration document has been fetched and
//! validated.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant, sleep};
use tracing::{info, instrument, warn};

use crate::capability::{BackendCapabilities, DEFAULT_SHOTS};
use crate::circuit::Circuit;
use crate::client::JobClient;
use crate::config::ClientConfig;
use crate::error::{ColdAtomError, ColdAtomResult};
use crate::job::{ColdAtomJob, JobId, JobState};
use crate::result::JobResult;
use crate::translator::{SubmissionPayload, translate};
use crate::transport::Transport;

/// Whether a backend is real hardware or a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Device,
    Simulator,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Device => write!(f, "device"),
            BackendKind::Simulator => write!(f, "simulator"),
        }
    }
}

/// Trait for cold-atom backends.
///
/// Devices and simulators share this interface; they differ only in
/// their capabilities.
#[async_trait]
pub trait ColdAtomBackend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str {
        self.capabilities().name()
    }

    /// Device or simulator.
    fn kind(&self) -> BackendKind {
        if self.capabilities().is_simulator() {
            BackendKind::Simulator
        } else {
            BackendKind::Device
        }
    }

    /// Get the capabilities of this backend.
    ///
    /// Synchronous and infallible: implementations fetch capabilities at
    /// construction time and return a reference.
    fn capabilities(&self) -> &BackendCapabilities;

    /// Upload a translated payload and return the remote job id.
    async fn submit(&self, payload: &SubmissionPayload) -> ColdAtomResult<JobId>;

    /// Query the current state of a job.
    ///
    /// Infallible: anything that is not a recognized remote status is
    /// reported as [`JobState::Error`].
    async fn status(&self, job_id: &JobId) -> JobState;

    /// Fetch the result document of a job, whatever its state.
    async fn fetch_result(&self, job_id: &JobId) -> ColdAtomResult<JobResult>;

    /// Cancel a job.
    ///
    /// The remote API exposes no cancellation endpoint; the default does
    /// nothing and returns `Ok(())`.
    async fn cancel(&self, _job_id: &JobId) -> ColdAtomResult<()> {
        Ok(())
    }

    /// Translate circuits against this backend's capabilities.
    fn translate(&self, circuits: &[Circuit], shots: u32) -> ColdAtomResult<SubmissionPayload> {
        translate(circuits, self.capabilities(), shots)
    }

    /// Translate and submit circuits.
    ///
    /// Validation errors are returned before any request is sent.
    async fn run_payload(&self, circuits: &[Circuit], shots: u32) -> ColdAtomResult<JobId> {
        let payload = self.translate(circuits, shots)?;
        self.submit(&payload).await
    }

    /// Poll the result endpoint until the job reaches a terminal state.
    ///
    /// - `Done`: returns the result document.
    /// - `Error`: [`ColdAtomError::Remote`].
    /// - `Cancelled`: [`ColdAtomError::JobCancelled`].
    /// - A failed poll request ends the loop with [`ColdAtomError::Remote`];
    ///   it is not retried.
    /// - With `timeout` set, no poll request outlives the deadline: an
    ///   in-flight request is abandoned and the wait between polls is cut
    ///   short once the deadline is reached, yielding
    ///   [`ColdAtomError::Timeout`]. Without it the loop polls indefinitely.
    async fn wait(
        &self,
        job_id: &JobId,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> ColdAtomResult<JobResult> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let timed_out = || ColdAtomError::Timeout(job_id.to_string());

        loop {
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if remaining.is_some_and(|r| r.is_zero()) {
                return Err(timed_out());
            }

            let fetched = match remaining {
                Some(remaining) => time::timeout(remaining, self.fetch_result(job_id))
                    .await
                    .map_err(|_| timed_out())?,
                None => self.fetch_result(job_id).await,
            };
            let result = match fetched {
                Ok(result) => result,
                Err(e) => {
                    warn!("Polling job {} failed: {}", job_id, e);
                    return Err(ColdAtomError::Remote(format!("job {job_id}: {e}")));
                }
            };

            match result.state {
                JobState::Done => {
                    info!("Cold-atom job {} finished", job_id);
                    return Ok(result);
                }
                JobState::Error => {
                    info!("Cold-atom job {} failed", job_id);
                    return Err(ColdAtomError::Remote(format!(
                        "job {job_id} reported an error status"
                    )));
                }
                JobState::Cancelled => {
                    info!("Cold-atom job {} was cancelled", job_id);
                    return Err(ColdAtomError::JobCancelled(job_id.to_string()));
                }
                JobState::Initializing
                | JobState::Queued
                | JobState::Validating
                | JobState::Running => {
                    let pause = match deadline {
                        Some(d) => poll_interval.min(d.saturating_duration_since(Instant::now())),
                        None => poll_interval,
                    };
                    sleep(pause).await;
                }
            }
        }
    }
}

impl dyn ColdAtomBackend + '_ {
    /// Translate and submit circuits, returning a job handle.
    ///
    /// `shots` defaults to [`DEFAULT_SHOTS`].
    pub async fn run(
        &self,
        circuits: &[Circuit],
        shots: Option<u32>,
    ) -> ColdAtomResult<ColdAtomJob<'_>> {
        let id = self
            .run_payload(circuits, shots.unwrap_or(DEFAULT_SHOTS))
            .await?;
        Ok(ColdAtomJob::new(id, self))
    }
}

/// A backend reached over the cold-atom HTTP protocol.
#[derive(Debug)]
pub struct RemoteBackend {
    client: JobClient,
    capabilities: BackendCapabilities,
}

impl RemoteBackend {
    /// Connect over HTTP and fetch the backend's capabilities.
    ///
    /// Fails if the configuration cannot be fetched or validated; no
    /// backend object exists without capabilities.
    pub async fn connect(config: ClientConfig) -> ColdAtomResult<Self> {
        Self::from_client(JobClient::new(config)?).await
    }

    /// Connect over a custom transport.
    pub async fn with_transport(
        config: ClientConfig,
        transport: impl Transport + 'static,
    ) -> ColdAtomResult<Self> {
        Self::from_client(JobClient::with_transport(config, transport)).await
    }

    #[instrument(skip(client), fields(base_url = %client.config().base_url))]
    async fn from_client(client: JobClient) -> ColdAtomResult<Self> {
        let capabilities = client.fetch_capabilities().await?;
        info!(
            "Connected to cold-atom backend {} ({} wires, {})",
            capabilities.name(),
            capabilities.wire_count(),
            if capabilities.is_simulator() {
                BackendKind::Simulator
            } else {
                BackendKind::Device
            }
        );
        Ok(Self {
            client,
            capabilities,
        })
    }

    /// Client this backend talks through.
    pub fn client(&self) -> &JobClient {
        &self.client
    }

    /// Translate and submit circuits, returning a job handle.
    ///
    /// `shots` defaults to [`DEFAULT_SHOTS`].
    pub async fn run(
        &self,
        circuits: &[Circuit],
        shots: Option<u32>,
    ) -> ColdAtomResult<ColdAtomJob<'_>> {
        let backend: &dyn ColdAtomBackend = self;
        backend.run(circuits, shots).await
    }

    /// Wait for a job using the configured poll interval and timeout.
    pub async fn wait_default(&self, job_id: &JobId) -> ColdAtomResult<JobResult> {
        let config = self.client.config();
        self.wait(job_id, config.timeout, config.poll_interval).await
    }
}

#[async_trait]
impl ColdAtomBackend for RemoteBackend {
    fn capabilities(&self) -> &BackendCapabilities {
        &self.capabilities
    }

    async fn submit(&self, payload: &SubmissionPayload) -> ColdAtomResult<JobId> {
        self.client.submit(payload).await
    }

    async fn status(&self, job_id: &JobId) -> JobState {
        self.client.poll_status(job_id).await
    }

    async fn fetch_result(&self, job_id: &JobId) -> ColdAtomResult<JobResult> {
        self.client.fetch_result(job_id).await
    }
}
