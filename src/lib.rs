//! Cold-atom backend client.
//!
//! This crate submits quantum circuits to remote cold-atom experiments
//! (hardware or simulators) over HTTP and retrieves their results.
//!
//! # Overview
//!
//! - [`BackendCapabilities`] describes what a backend accepts: wires,
//!   atomic species, supported instructions, per-gate coupling maps and
//!   the experiment/shot limits.
//! - [`translate`] turns [`Circuit`]s into a [`SubmissionPayload`],
//!   validating every instruction with the [`InstructionValidator`]
//!   before anything is sent.
//! - [`JobClient`] speaks the HTTP protocol; [`ColdAtomBackend`] wraps it
//!   into the job lifecycle (submit, poll, wait).
//! - [`ColdAtomProvider`] groups backends that share an access token.
//! - [`ColdAtomError`] covers validation, transport and job-level failures.
//!
//! # Lifecycle
//!
//! ```text
//!   connect() ──→ capabilities() ──→ run() ──→ status() ──→ result()
//!    (async)       (sync, &ref)      (async)    (async)      (async, polls)
//! ```
//!
//! ```ignore
//! use cold_atom_client::{ClientConfig, RemoteBackend, Wire, Parameter};
//!
//! let backend = RemoteBackend::connect(ClientConfig::from_env()?).await?;
//! let mut circuit = backend.capabilities().empty_circuit()?;
//! circuit
//!     .append("rx", [Wire::new("na", 0)], [Parameter::from(1.57)])
//!     .measure(Wire::new("na", 0));
//!
//! let job = backend.run(&[circuit], Some(10)).await?;
//! let result = job.result(None, std::time::Duration::from_secs(5)).await?;
//! ```

pub mod backend;
pub mod capability;
pub mod circuit;
pub mod client;
pub mod config;
pub mod error;
pub mod job;
pub mod provider;
pub mod result;
pub mod translator;
pub mod transport;
pub mod validator;

pub use backend::{BackendKind, ColdAtomBackend, RemoteBackend};
pub use capability::{
    BackendCapabilities, BackendConfiguration, DEFAULT_SHOTS, GateDefinition,
};
pub use circuit::{Circuit, Operation, Parameter, QuantumRegister, Wire};
pub use client::JobClient;
pub use config::{ClientConfig, Endpoints, SubmitMethod};
pub use error::{ColdAtomError, ColdAtomResult};
pub use job::{ColdAtomJob, JobId, JobState};
pub use provider::ColdAtomProvider;
pub use result::{ExperimentData, ExperimentHeader, ExperimentResult, JobResult};
pub use translator::{
    CircuitPayload, Instruction, SubmissionPayload, translate, translate_circuit,
};
pub use transport::{HttpTransport, Method, Transport, TransportRequest, TransportResponse};
pub use validator::{InstructionValidator, validate_instruction};
