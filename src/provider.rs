//! Provider: the access token plus the backends it can reach.

use tracing::debug;

use crate::backend::{BackendKind, ColdAtomBackend, RemoteBackend};
use crate::config::ClientConfig;
use crate::error::{ColdAtomError, ColdAtomResult};

/// Set of cold-atom backends sharing one access token.
///
/// ```ignore
/// let provider = ColdAtomProvider::connect(
///     ClientConfig::from_env()?,
///     ["http://127.0.0.1:5000/mixtures", "http://127.0.0.1:5000/mixtures/simulator"],
/// )
/// .await?;
/// let backend = provider.get_backend("cold_atom_mixtures")?;
/// let job = backend.run(&[circuit], None).await?;
/// ```
pub struct ColdAtomProvider {
    token: String,
    backends: Vec<Box<dyn ColdAtomBackend>>,
}

impl std::fmt::Debug for ColdAtomProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColdAtomProvider")
            .field("token", &"[REDACTED]")
            .field(
                "backends",
                &self.backends.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ColdAtomProvider {
    /// Name of the provider.
    pub const NAME: &'static str = "cold_atom_provider";

    /// Create a provider without backends.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            backends: vec![],
        }
    }

    /// Connect to every backend URL, reusing `config` for each of them.
    ///
    /// Capabilities are fetched eagerly; the first backend that cannot be
    /// reached aborts construction.
    pub async fn connect<I, S>(config: ClientConfig, urls: I) -> ColdAtomResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut provider = Self::new(config.token.clone());
        for url in urls {
            let backend = RemoteBackend::connect(config.for_url(url)).await?;
            provider.backends.push(Box::new(backend));
        }
        debug!("Provider connected to {} backend(s)", provider.backends.len());
        Ok(provider)
    }

    /// Add a backend.
    pub fn with_backend(mut self, backend: impl ColdAtomBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Access token shared by the backends.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// All backends, optionally restricted to one kind.
    pub fn backends(&self, kind: Option<BackendKind>) -> Vec<&dyn ColdAtomBackend> {
        self.backends
            .iter()
            .map(|b| b.as_ref())
            .filter(|b| kind.is_none_or(|k| b.kind() == k))
            .collect()
    }

    /// The single backend called `name`.
    pub fn get_backend(&self, name: &str) -> ColdAtomResult<&dyn ColdAtomBackend> {
        let mut matches = self.backends.iter().filter(|b| b.name() == name);
        match (matches.next(), matches.next()) {
            (Some(backend), None) => Ok(backend.as_ref()),
            (Some(_), Some(_)) => Err(ColdAtomError::BackendNotFound(format!(
                "{name} (more than one backend matches)"
            ))),
            (None, _) => Err(ColdAtomError::BackendNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::capability::BackendCapabilities;
    use crate::job::{JobId, JobState};
    use crate::result::JobResult;
    use crate::translator::SubmissionPayload;

    struct Offline(BackendCapabilities);

    #[async_trait]
    impl ColdAtomBackend for Offline {
        fn capabilities(&self) -> &BackendCapabilities {
            &self.0
        }

        async fn submit(&self, _payload: &SubmissionPayload) -> ColdAtomResult<JobId> {
            Err(ColdAtomError::Connection("offline".into()))
        }

        async fn status(&self, _job_id: &JobId) -> JobState {
            JobState::Error
        }

        async fn fetch_result(&self, _job_id: &JobId) -> ColdAtomResult<JobResult> {
            Err(ColdAtomError::Connection("offline".into()))
        }
    }

    fn provider() -> ColdAtomProvider {
        ColdAtomProvider::new("tok")
            .with_backend(Offline(BackendCapabilities::mixtures()))
            .with_backend(Offline(BackendCapabilities::mixtures_simulator()))
            .with_backend(Offline(BackendCapabilities::coherent_spin_qubits()))
    }

    #[test]
    fn test_get_backend_by_name() {
        let provider = provider();
        let backend = provider
            .get_backend("atomic_mixtures_meanfield_simulator")
            .unwrap();
        assert_eq!(backend.kind(), BackendKind::Simulator);
        assert_eq!(provider.token(), "tok");
    }

    #[test]
    fn test_get_backend_missing() {
        let result = provider().get_backend("na_li").map(|b| b.name().to_string());
        assert!(matches!(result, Err(ColdAtomError::BackendNotFound(ref n)) if n == "na_li"));
    }

    #[test]
    fn test_get_backend_ambiguous() {
        let provider = provider().with_backend(Offline(BackendCapabilities::mixtures()));
        let Err(err) = provider.get_backend("cold_atom_mixtures") else {
            panic!("two backends share the name");
        };
        assert!(
            matches!(err, ColdAtomError::BackendNotFound(ref n) if n.contains("more than one"))
        );
    }

    #[test]
    fn test_backends_by_kind() {
        let provider = provider();
        assert_eq!(provider.backends(None).len(), 3);
        let simulators = provider.backends(Some(BackendKind::Simulator));
        assert_eq!(simulators.len(), 1);
        assert_eq!(simulators[0].name(), "atomic_mixtures_meanfield_simulator");
        assert_eq!(provider.backends(Some(BackendKind::Device)).len(), 2);
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("tok\""));
        assert!(debug.contains("cold_atom_mixtures"));
    }

    #[tokio::test]
    async fn test_run_through_provider_validates_first() {
        let provider = provider();
        let backend = provider.get_backend("cold_atom_mixtures").unwrap();
        let err = backend.run(&[], None).await.unwrap_err();
        assert!(matches!(err, ColdAtomError::EmptySubmission));
    }
}
