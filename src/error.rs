//! Cold-atom client error types.
//!
//! Errors are categorized by when they can occur:
//!
//! - **Configuration**, raised during backend construction:
//!   `ConfigurationMissing`, `InvalidConfiguration`, `BackendNotFound`.
//! - **Validation**, raised before any network I/O: `InvalidCircuit`,
//!   `UnboundParameter`, `UnsupportedInstruction`, `IllegalCoupling`,
//!   `TooManyExperiments`, `TooManyShots`, `InvalidShots`, `EmptySubmission`.
//! - **Transport**, raised by fetch and submit: `Connection`, `Submission`.
//! - **Job-level**, raised while polling results: `Remote`, `JobCancelled`,
//!   `Timeout`.

use thiserror::Error;

/// Errors that can occur while translating, submitting or polling jobs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ColdAtomError {
    // ── Configuration errors ─────────────────────────────────────────
    /// The backend configuration document lacks a required field.
    #[error("Backend configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The backend configuration is present but inconsistent.
    #[error("Invalid backend configuration: {0}")]
    InvalidConfiguration(String),

    /// No backend matches the requested name.
    #[error("No backend matches '{0}'")]
    BackendNotFound(String),

    // ── Validation errors (no I/O performed) ─────────────────────────
    /// The circuit references registers or wires it does not declare.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// An instruction carries a parameter without a finite numeric value.
    #[error(
        "Cannot run circuit with unbound parameter '{parameter}' in instruction '{instruction}'"
    )]
    UnboundParameter {
        instruction: String,
        parameter: String,
    },

    /// The backend does not list the instruction as supported.
    #[error("{backend} does not support {name}")]
    UnsupportedInstruction { name: String, backend: String },

    /// The wires of a gate are not in its coupling map.
    #[error(
        "coupling {wires:?} not supported for gate {name} on {backend}; \
         possible couplings: {allowed:?}"
    )]
    IllegalCoupling {
        name: String,
        wires: Vec<u32>,
        backend: String,
        allowed: Vec<Vec<u32>>,
    },

    /// More circuits than the backend accepts in one submission.
    #[error("{requested} experiments requested but the backend allows at most {allowed}")]
    TooManyExperiments { requested: usize, allowed: usize },

    /// More shots per experiment than the backend accepts.
    #[error("{requested} shots requested but the backend allows at most {allowed}")]
    TooManyShots { requested: u32, allowed: u32 },

    /// Shot count outside the accepted range.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// A submission without any circuit.
    #[error("Submission contains no circuits")]
    EmptySubmission,

    // ── Transport errors ─────────────────────────────────────────────
    /// The remote side could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The remote side rejected the submission or answered without a job id.
    #[error("Job submission failed: {0}")]
    Submission(String),

    // ── Job-level errors ─────────────────────────────────────────────
    /// The remote side reported an error status.
    #[error("Remote error: {0}")]
    Remote(String),

    /// The remote side reported the job as cancelled.
    #[error("Job cancelled: {0}")]
    JobCancelled(String),

    /// No terminal state observed before the deadline.
    #[error("Timed out waiting for result of job {0}")]
    Timeout(String),
}

impl ColdAtomError {
    /// Returns `true` if the error was raised by local validation, before
    /// any request for the submission was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidCircuit(_)
                | Self::UnboundParameter { .. }
                | Self::UnsupportedInstruction { .. }
                | Self::IllegalCoupling { .. }
                | Self::TooManyExperiments { .. }
                | Self::TooManyShots { .. }
                | Self::InvalidShots(_)
                | Self::EmptySubmission
        )
    }

    /// Returns `true` if the error comes from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Submission(_))
    }
}

impl From<reqwest::Error> for ColdAtomError {
    fn from(e: reqwest::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

/// Result type for cold-atom client operations.
pub type ColdAtomResult<T> = Result<T, ColdAtomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors() {
        assert!(ColdAtomError::EmptySubmission.is_validation());
        assert!(
            ColdAtomError::TooManyShots {
                requested: 100,
                allowed: 60
            }
            .is_validation()
        );
        assert!(!ColdAtomError::Remote("boom".into()).is_validation());
        assert!(!ColdAtomError::Timeout("job-1".into()).is_validation());
    }

    #[test]
    fn test_transport_errors() {
        assert!(ColdAtomError::Connection("refused".into()).is_transport());
        assert!(ColdAtomError::Submission("no job_id".into()).is_transport());
        assert!(!ColdAtomError::EmptySubmission.is_transport());
    }

    #[test]
    fn test_illegal_coupling_display_names_alternatives() {
        let err = ColdAtomError::IllegalCoupling {
            name: "couple".into(),
            wires: vec![5, 4],
            backend: "atomic_mixtures_meanfield_simulator".into(),
            allowed: vec![vec![4, 5], vec![5, 6]],
        };
        let msg = err.to_string();
        assert!(msg.contains("[5, 4]"));
        assert!(msg.contains("couple"));
        assert!(msg.contains("[[4, 5], [5, 6]]"));
    }

    #[test]
    fn test_unsupported_instruction_display() {
        let err = ColdAtomError::UnsupportedInstruction {
            name: "cx".into(),
            backend: "cold_atom_mixtures".into(),
        };
        assert_eq!(err.to_string(), "cold_atom_mixtures does not support cx");
    }
}
