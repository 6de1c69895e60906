//! Job lifecycle client.
//!
//! [`JobClient`] speaks the cold-atom HTTP protocol:
//!
//! - [`fetch_capabilities`](JobClient::fetch_capabilities): `GET {base}/config`,
//!   answered by the configuration document.
//! - [`submit`](JobClient::submit): `PUT {base}` with the submission payload,
//!   answered by `{"job_id": ...}`.
//! - [`poll_status`](JobClient::poll_status): `PUT {base}/get_job_status` with
//!   `{job_id, access_token}`, answered by `{"status": ...}`.
//! - [`fetch_result`](JobClient::fetch_result):
//!   `GET {base}/get_job_result?job_id=..&access_token=..`, answered by the
//!   result document.
//!
//! Paths and the submit method come from [`Endpoints`](crate::config::Endpoints).
//! Every request carries the `access_token` and `SDK` headers.

use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::capability::{BackendCapabilities, BackendConfiguration};
use crate::config::{ClientConfig, SubmitMethod};
use crate::error::{ColdAtomError, ColdAtomResult};
use crate::job::{JobId, JobState};
use crate::result::JobResult;
use crate::translator::SubmissionPayload;
use crate::transport::{HttpTransport, Method, Transport, TransportRequest};

/// HTTP client for one cold-atom backend.
pub struct JobClient {
    config: ClientConfig,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for JobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JobClient {
    /// Create a client that talks HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> ColdAtomResult<Self> {
        let transport = HttpTransport::new(
            config.base_url.clone(),
            config.request_timeout,
            config.connect_timeout,
        )?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> TransportRequest {
        TransportRequest::new(method, path)
            .header("access_token", self.config.token.as_str())
            .header("SDK", self.config.sdk.as_str())
    }

    /// Fetch and validate the backend configuration document.
    ///
    /// Fails with [`ColdAtomError::Connection`] if the backend is
    /// unreachable or answers with a non-2xx status, and with
    /// [`ColdAtomError::ConfigurationMissing`] or
    /// [`ColdAtomError::InvalidConfiguration`] if the document is unusable.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn fetch_capabilities(&self) -> ColdAtomResult<BackendCapabilities> {
        debug!("Fetching backend configuration");
        let response = self
            .transport
            .send(self.request(Method::Get, &self.config.endpoints.config))
            .await?;

        if !response.is_success() {
            return Err(ColdAtomError::Connection(format!(
                "configuration endpoint returned HTTP {}",
                response.status
            )));
        }

        let config = BackendConfiguration::from_value(response.body)?;
        BackendCapabilities::try_from(config)
    }

    /// Upload a submission and return the job id assigned by the remote side.
    ///
    /// A non-2xx answer or a body without a non-empty `job_id` is a
    /// [`ColdAtomError::Submission`]. Nothing is retried.
    #[instrument(skip(self, payload), fields(experiments = payload.len()))]
    pub async fn submit(&self, payload: &SubmissionPayload) -> ColdAtomResult<JobId> {
        let body = serde_json::to_value(payload)
            .map_err(|e| ColdAtomError::Submission(format!("cannot encode payload: {e}")))?;
        let method = match self.config.endpoints.submit_method {
            SubmitMethod::Put => Method::Put,
            SubmitMethod::Post => Method::Post,
        };

        let response = self
            .transport
            .send(self.request(method, &self.config.endpoints.submit).json(body))
            .await?;

        if !response.is_success() {
            return Err(ColdAtomError::Submission(format!(
                "HTTP {}: {}",
                response.status, response.body
            )));
        }

        let job_id = response
            .body
            .get("job_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ColdAtomError::Submission(format!("response carries no job_id: {}", response.body))
            })?;

        info!("Cold-atom job submitted: {}", job_id);
        Ok(JobId::new(job_id))
    }

    /// Query the state of a job.
    ///
    /// Never fails: transport failures, non-2xx answers, missing or
    /// unknown status strings all map to [`JobState::Error`].
    #[instrument(skip(self))]
    pub async fn poll_status(&self, job_id: &JobId) -> JobState {
        let body = json!({
            "job_id": job_id.as_str(),
            "access_token": self.config.token,
        });
        let request = self
            .request(Method::Put, &self.config.endpoints.status)
            .json(body);

        match self.transport.send(request).await {
            Ok(response) if response.is_success() => response
                .body
                .get("status")
                .and_then(Value::as_str)
                .map_or(JobState::Error, JobState::from_remote),
            Ok(response) => {
                debug!("Status endpoint returned HTTP {}", response.status);
                JobState::Error
            }
            Err(e) => {
                warn!("Status poll for job {} failed: {}", job_id, e);
                JobState::Error
            }
        }
    }

    /// Fetch the result document of a job, in whatever state it is.
    ///
    /// Transport failures are returned as [`ColdAtomError::Connection`];
    /// a non-2xx answer or an undecodable document as
    /// [`ColdAtomError::Remote`].
    #[instrument(skip(self))]
    pub async fn fetch_result(&self, job_id: &JobId) -> ColdAtomResult<JobResult> {
        let request = self
            .request(Method::Get, &self.config.endpoints.result)
            .query("job_id", job_id.as_str())
            .query("access_token", self.config.token.as_str());

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ColdAtomError::Remote(format!(
                "HTTP {}: {}",
                response.status, response.body
            )));
        }

        serde_json::from_value(response.body)
            .map_err(|e| ColdAtomError::Remote(format!("malformed result document: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::capability::BackendCapabilities;
    use crate::translator::{CircuitPayload, Instruction};
    use crate::transport::mock::ScriptedTransport;

    fn config() -> ClientConfig {
        ClientConfig::new("http://mock/mixtures").with_token("tok")
    }

    fn client(transport: &Arc<ScriptedTransport>) -> JobClient {
        JobClient::with_transport(config(), Arc::clone(transport))
    }

    fn payload() -> SubmissionPayload {
        SubmissionPayload::new(vec![CircuitPayload {
            instructions: vec![Instruction::new("rx", vec![0], vec![1.57])],
            shots: 10,
            num_wires: 2,
        }])
    }

    #[tokio::test]
    async fn test_fetch_capabilities() {
        let doc = serde_json::to_value(BackendCapabilities::mixtures().to_configuration()).unwrap();
        let transport = Arc::new(ScriptedTransport::new().respond("config", 200, doc));

        let caps = client(&transport).fetch_capabilities().await.unwrap();
        assert_eq!(caps.name(), "cold_atom_mixtures");
        assert_eq!(caps.max_experiments(), 3);

        let req = &transport.requests()[0];
        assert_eq!(req.method, Method::Get);
        assert!(req.headers.contains(&("access_token".into(), "tok".into())));
        assert!(req.headers.contains(&("SDK".into(), "rust".into())));
    }

    #[tokio::test]
    async fn test_fetch_capabilities_incomplete_document() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "config",
            200,
            json!({"backend_name": "x", "n_qubits": 2}),
        ));
        let err = client(&transport).fetch_capabilities().await.unwrap_err();
        assert!(matches!(err, ColdAtomError::ConfigurationMissing(_)));
    }

    #[tokio::test]
    async fn test_fetch_capabilities_unreachable() {
        let transport = Arc::new(ScriptedTransport::new().fail("config"));
        let err = client(&transport).fetch_capabilities().await.unwrap_err();
        assert!(matches!(err, ColdAtomError::Connection(_)));
    }

    #[tokio::test]
    async fn test_submit_returns_job_id() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "",
            200,
            json!({"job_id": "job-1", "status": "initializing"}),
        ));
        let id = client(&transport).submit(&payload()).await.unwrap();
        assert_eq!(id, JobId::new("job-1"));

        let req = &transport.requests()[0];
        assert_eq!(req.method, Method::Put);
        let body = req.body.as_ref().unwrap();
        assert_eq!(body["experiment_0"]["shots"], 10);
    }

    #[tokio::test]
    async fn test_submit_without_job_id() {
        for body in [
            json!({"job_id": ""}),
            json!({"status": "initializing"}),
            json!({"job_id": 42}),
            json!({"job_id": null}),
        ] {
            let transport = Arc::new(ScriptedTransport::new().respond("", 200, body.clone()));
            let err = client(&transport).submit(&payload()).await.unwrap_err();
            assert!(matches!(err, ColdAtomError::Submission(_)), "{body}: {err}");
        }
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let transport =
            Arc::new(ScriptedTransport::new().respond("", 400, json!({"detail": "bad"})));
        let err = client(&transport).submit(&payload()).await.unwrap_err();
        assert!(matches!(err, ColdAtomError::Submission(ref msg) if msg.contains("400")));
    }

    #[tokio::test]
    async fn test_submit_uses_configured_method() {
        let mut endpoints = crate::config::Endpoints::default();
        endpoints.submit = "upload".into();
        endpoints.submit_method = SubmitMethod::Post;
        let transport =
            Arc::new(ScriptedTransport::new().respond("upload", 201, json!({"job_id": "j"})));
        let client =
            JobClient::with_transport(config().with_endpoints(endpoints), Arc::clone(&transport));

        client.submit(&payload()).await.unwrap();
        assert_eq!(transport.requests()[0].method, Method::Post);
    }

    #[tokio::test]
    async fn test_poll_status_mapping() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("get_job_status", 200, json!({"status": "queued"}))
                .respond("get_job_status", 200, json!({"status": "finished"}))
                .respond("get_job_status", 200, json!({"status": "weird"}))
                .respond("get_job_status", 500, json!({"status": "done"})),
        );
        let client = client(&transport);
        let id = JobId::new("j");
        assert_eq!(client.poll_status(&id).await, JobState::Queued);
        assert_eq!(client.poll_status(&id).await, JobState::Done);
        assert_eq!(client.poll_status(&id).await, JobState::Error);
        assert_eq!(client.poll_status(&id).await, JobState::Error);

        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body, json!({"job_id": "j", "access_token": "tok"}));
    }

    #[tokio::test]
    async fn test_poll_status_transport_failure_is_error() {
        let transport = Arc::new(ScriptedTransport::new().fail("get_job_status"));
        let state = client(&transport).poll_status(&JobId::new("j")).await;
        assert_eq!(state, JobState::Error);
    }

    #[tokio::test]
    async fn test_poll_status_is_idempotent() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "get_job_status",
            200,
            json!({"status": "running"}),
        ));
        let client = client(&transport);
        let id = JobId::new("j");
        for _ in 0..3 {
            assert_eq!(client.poll_status(&id).await, JobState::Running);
        }
        assert_eq!(transport.requests_to("get_job_status"), 3);
    }

    #[tokio::test]
    async fn test_fetch_result_query() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "get_job_result",
            200,
            json!({"status": "running", "job_id": "j"}),
        ));
        let result = client(&transport).fetch_result(&JobId::new("j")).await.unwrap();
        assert_eq!(result.state, JobState::Running);

        let req = &transport.requests()[0];
        assert_eq!(req.method, Method::Get);
        assert_eq!(
            req.query,
            vec![
                ("job_id".to_string(), "j".to_string()),
                ("access_token".to_string(), "tok".to_string())
            ]
        );
    }
}
