//! Client configuration.
//!
//! [`ClientConfig`] carries everything a backend connection needs: the
//! base URL, the access token, the endpoint paths and the poll policy.
//! Values come from code (`with_*` setters), from a serde document, or
//! from the environment via [`ClientConfig::from_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ColdAtomError, ColdAtomResult};

/// Base URL used when `COLD_ATOM_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/mixtures";

/// Value of the `SDK` header.
pub const DEFAULT_SDK: &str = "rust";

/// Default spacing between two polls of a job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// HTTP method used to upload a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMethod {
    #[default]
    Put,
    Post,
}

/// Endpoint paths relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Configuration document (`GET`).
    pub config: String,
    /// Job upload; empty means the base URL itself.
    pub submit: String,
    /// Method of the job upload.
    pub submit_method: SubmitMethod,
    /// Job result (`GET`).
    pub result: String,
    /// Job status (`PUT`).
    pub status: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            config: "config".into(),
            submit: String::new(),
            submit_method: SubmitMethod::Put,
            result: "get_job_result".into(),
            status: "get_job_status".into(),
        }
    }
}

/// Configuration of one backend connection.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:5000/mixtures`.
    pub base_url: String,
    /// Access token sent with every request.
    pub token: String,
    /// SDK identifier sent in the `SDK` header.
    pub sdk: String,
    /// Endpoint paths.
    pub endpoints: Endpoints,
    /// Timeout of a single HTTP request.
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
    /// Timeout for establishing a connection.
    #[serde(with = "duration_ms")]
    pub connect_timeout: Duration,
    /// Spacing between polls while waiting for a result.
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,
    /// Overall deadline of a wait; `None` polls indefinitely.
    #[serde(with = "opt_duration_ms")]
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("sdk", &self.sdk)
            .field("endpoints", &self.endpoints)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: String::new(),
            sdk: DEFAULT_SDK.into(),
            endpoints: Endpoints::default(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `base_url` with defaults elsewhere.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `COLD_ATOM_URL`: base URL (default [`DEFAULT_BASE_URL`])
    /// - `COLD_ATOM_TOKEN`: access token (default empty)
    /// - `COLD_ATOM_POLL_INTERVAL_MS`: poll interval in milliseconds
    /// - `COLD_ATOM_TIMEOUT_SECS`: wait deadline in seconds
    pub fn from_env() -> ColdAtomResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ColdAtomResult<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("COLD_ATOM_URL") {
            config.base_url = url;
        }
        if let Some(token) = lookup("COLD_ATOM_TOKEN") {
            config.token = token;
        }
        if let Some(ms) = lookup("COLD_ATOM_POLL_INTERVAL_MS") {
            let ms = parse_number("COLD_ATOM_POLL_INTERVAL_MS", &ms)?;
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = lookup("COLD_ATOM_TIMEOUT_SECS") {
            let secs = parse_number("COLD_ATOM_TIMEOUT_SECS", &secs)?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Set the access token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the SDK identifier.
    pub fn with_sdk(mut self, sdk: impl Into<String>) -> Self {
        self.sdk = sdk.into();
        self
    }

    /// Set the endpoint paths.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the wait deadline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Same configuration pointed at `base_url`.
    pub fn for_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self.clone()
        }
    }
}

fn parse_number(key: &str, value: &str) -> ColdAtomResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            ColdAtomError::InvalidConfiguration(format!(
                "{key} must be an integer, got '{value}'"
            ))
        })
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.sdk, "rust");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.timeout, None);
        assert_eq!(config.endpoints.submit, "");
        assert_eq!(config.endpoints.submit_method, SubmitMethod::Put);
        assert_eq!(config.endpoints.result, "get_job_result");
    }

    #[test]
    fn test_token_redacted_in_debug() {
        let config = ClientConfig::new("http://localhost").with_token("secret-token");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(|key| match key {
            "COLD_ATOM_URL" => Some("http://example.org/mixtures/simulator".into()),
            "COLD_ATOM_TOKEN" => Some("tok".into()),
            "COLD_ATOM_POLL_INTERVAL_MS" => Some("250".into()),
            "COLD_ATOM_TIMEOUT_SECS" => Some("30".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "http://example.org/mixtures/simulator");
        assert_eq!(config.token, "tok");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = ClientConfig::from_lookup(|key| {
            (key == "COLD_ATOM_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ColdAtomError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_deserialize_partial_document() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "http://localhost:8080/mixtures",
            "poll_interval": 100,
            "timeout": 2000,
            "endpoints": { "submit": "upload", "submit_method": "post" }
        }))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.endpoints.submit, "upload");
        assert_eq!(config.endpoints.submit_method, SubmitMethod::Post);
        assert_eq!(config.endpoints.config, "config");
        assert_eq!(config.sdk, "rust");
    }
}
