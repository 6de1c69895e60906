//! Mock of the remote cold-atom API.
//!
//! Serves the mixtures device and its simulator with in-memory jobs that
//! finish after a configurable number of result polls. Capabilities are
//! injected through [`AppState`]; nothing is global.

pub mod error;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::create_router;
pub use state::{AppState, MockConfig, MockJob, Site};
