//! Application state for the mock server.

use std::net::SocketAddr;
use std::sync::Arc;

use cold_atom_client::{BackendCapabilities, JobState, SubmissionPayload};
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

/// Mock server configuration.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,
    /// Number of result polls after which a job reports `finished`.
    pub polls_until_finished: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            bind_address: ([127, 0, 0, 1], 5000).into(),
            polls_until_finished: 2,
        }
    }
}

/// One emulated backend, served below `prefix`.
#[derive(Debug)]
pub struct Site {
    /// URL prefix, e.g. `/mixtures`.
    pub prefix: String,
    /// Capabilities served by `{prefix}/config` and enforced on upload.
    pub capabilities: BackendCapabilities,
}

/// A job accepted by the mock.
#[derive(Debug, Clone)]
pub struct MockJob {
    /// Prefix of the site the job was uploaded to.
    pub site: String,
    /// Uploaded experiments.
    pub payload: SubmissionPayload,
    /// Result polls seen so far.
    pub polls: u32,
}

impl MockJob {
    /// State reported for this job.
    pub fn state(&self, polls_until_finished: u32) -> JobState {
        if self.polls >= polls_until_finished {
            JobState::Done
        } else if self.polls == 0 {
            JobState::Initializing
        } else {
            JobState::Running
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Mock configuration.
    pub config: MockConfig,
    /// Emulated backends.
    pub sites: Vec<Arc<Site>>,
    /// Accepted jobs (id -> job).
    pub jobs: RwLock<FxHashMap<String, MockJob>>,
}

impl AppState {
    /// State serving the mixtures device at `/mixtures` and its simulator
    /// at `/mixtures/simulator`.
    pub fn new(config: MockConfig) -> Self {
        Self::with_sites(
            config,
            [
                ("/mixtures", BackendCapabilities::mixtures()),
                ("/mixtures/simulator", BackendCapabilities::mixtures_simulator()),
            ],
        )
    }

    /// State serving arbitrary capabilities.
    pub fn with_sites<S: Into<String>>(
        config: MockConfig,
        sites: impl IntoIterator<Item = (S, BackendCapabilities)>,
    ) -> Self {
        Self {
            config,
            sites: sites
                .into_iter()
                .map(|(prefix, capabilities)| {
                    Arc::new(Site {
                        prefix: prefix.into(),
                        capabilities,
                    })
                })
                .collect(),
            jobs: RwLock::new(FxHashMap::default()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_progression() {
        let mut job = MockJob {
            site: "/mixtures".into(),
            payload: SubmissionPayload::default(),
            polls: 0,
        };
        assert_eq!(job.state(2), JobState::Initializing);
        job.polls = 1;
        assert_eq!(job.state(2), JobState::Running);
        job.polls = 2;
        assert_eq!(job.state(2), JobState::Done);
    }

    #[test]
    fn test_default_sites() {
        let state = AppState::default();
        let prefixes: Vec<_> = state.sites.iter().map(|s| s.prefix.as_str()).collect();
        assert_eq!(prefixes, ["/mixtures", "/mixtures/simulator"]);
        assert!(state.sites[1].capabilities.is_simulator());
    }
}
