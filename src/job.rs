//! Job lifecycle types.
//!
//! The job state machine is driven entirely by the remote side:
//!
//! ```text
//!   submit() ──→ Initializing ──→ Queued ──→ Validating ──→ Running ──→ Done
//!                     │              │            │             │
//!                     └──────────────┴────────────┴─────────────┴──→ Error | Cancelled
//! ```
//!
//! - The remote status vocabulary is mapped into [`JobState`] at the
//!   boundary ([`JobState::from_remote`]); raw strings never travel
//!   further.
//! - `Done`, `Cancelled` and `Error` are terminal.
//! - A state is never cached: every query re-fetches it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::backend::ColdAtomBackend;
use crate::error::ColdAtomResult;
use crate::result::JobResult;

/// Unique identifier for a job, assigned by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// State of a job as last reported by the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Accepted, not yet queued.
    Initializing,
    /// Waiting in the remote queue.
    Queued,
    /// The remote side is checking the submission.
    Validating,
    /// Executing.
    Running,
    /// Cancelled on the remote side.
    Cancelled,
    /// Finished successfully.
    Done,
    /// Failed, unknown or unreachable.
    Error,
}

impl JobState {
    /// Map a remote status string.
    ///
    /// Matching is case-insensitive; `finished` is a synonym of `done`.
    /// Anything unrecognized maps to [`JobState::Error`].
    pub fn from_remote(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "initializing" => JobState::Initializing,
            "queued" => JobState::Queued,
            "validating" => JobState::Validating,
            "running" => JobState::Running,
            "cancelled" | "canceled" => JobState::Cancelled,
            "done" | "finished" => JobState::Done,
            _ => JobState::Error,
        }
    }

    /// Remote vocabulary name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Initializing => "initializing",
            JobState::Queued => "queued",
            JobState::Validating => "validating",
            JobState::Running => "running",
            JobState::Cancelled => "cancelled",
            JobState::Done => "done",
            JobState::Error => "error",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Cancelled | JobState::Error)
    }

    /// Check if the job is still pending.
    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let status = String::deserialize(deserializer)?;
        Ok(JobState::from_remote(&status))
    }
}

/// Handle to a submitted job.
///
/// Holds the id and a reference to the backend the job was submitted
/// to. Nothing else is cached: every query goes back to the remote side.
pub struct ColdAtomJob<'a> {
    id: JobId,
    backend: &'a dyn ColdAtomBackend,
    submitted_at: DateTime<Utc>,
}

impl<'a> ColdAtomJob<'a> {
    /// Wrap a job id returned by `backend`.
    pub fn new(id: JobId, backend: &'a dyn ColdAtomBackend) -> Self {
        Self {
            id,
            backend,
            submitted_at: Utc::now(),
        }
    }

    /// Job id.
    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Backend the job was submitted to.
    pub fn backend(&self) -> &'a dyn ColdAtomBackend {
        self.backend
    }

    /// When the submission was acknowledged.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Query the current state.
    pub async fn status(&self) -> JobState {
        self.backend.status(&self.id).await
    }

    /// Poll until the job reaches a terminal state and return its result.
    ///
    /// See [`ColdAtomBackend::wait`] for the loop semantics.
    pub async fn result(
        &self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> ColdAtomResult<JobResult> {
        self.backend.wait(&self.id, timeout, poll_interval).await
    }

    /// Cancel the job.
    ///
    /// The remote API has no cancellation endpoint, so this does nothing
    /// and returns `Ok(())`.
    pub async fn cancel(&self) -> ColdAtomResult<()> {
        self.backend.cancel(&self.id).await
    }
}

impl std::fmt::Debug for ColdAtomJob<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColdAtomJob")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .field("submitted_at", &self.submitted_at)
            .finish()
    }
}
