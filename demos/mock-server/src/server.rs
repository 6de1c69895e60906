//! Axum routing and handlers.
//!
//! Every site gets four routes:
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET  {prefix}/config` | configuration document |
//! | `PUT  {prefix}` | job upload |
//! | `GET  {prefix}/get_job_result` | result document (advances the job) |
//! | `PUT  {prefix}/get_job_status` | current status |

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Query, State},
    http::request::Parts,
    routing::{get, put},
};
use cold_atom_client::{
    BackendCapabilities, BackendConfiguration, ColdAtomError, ExperimentResult, JobState,
    SubmissionPayload, validate_instruction,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, MockJob, Site};

/// Create the Axum router with the routes of every site.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new();
    for site in &state.sites {
        let prefix = site.prefix.trim_end_matches('/');
        let site_routes = Router::new()
            .route(&format!("{prefix}/config"), get(get_config))
            .route(prefix, put(submit_job))
            .route(&format!("{prefix}/get_job_result"), get(get_job_result))
            .route(&format!("{prefix}/get_job_status"), put(get_job_status))
            .with_state(SiteState {
                app: Arc::clone(&state),
                site: Arc::clone(site),
            });
        router = router.merge(site_routes);
    }
    router.layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
struct SiteState {
    app: Arc<AppState>,
    site: Arc<Site>,
}

/// Guard for the `access_token` header; requests without one are rejected.
struct AccessToken;

impl<S: Send + Sync> FromRequestParts<S> for AccessToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("access_token")
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
            .map(|_| AccessToken)
            .ok_or_else(|| ApiError::Unauthorized("access_token header required".into()))
    }
}

#[derive(Deserialize)]
struct JobQuery {
    job_id: String,
}

async fn get_config(
    _token: AccessToken,
    State(state): State<SiteState>,
) -> Json<BackendConfiguration> {
    Json(state.site.capabilities.to_configuration())
}

async fn submit_job(
    _token: AccessToken,
    State(state): State<SiteState>,
    Json(payload): Json<SubmissionPayload>,
) -> Result<Json<Value>, ApiError> {
    check_payload(&payload, &state.site.capabilities)?;

    let job_id = Uuid::new_v4().to_string();
    info!(
        "Accepted job {} with {} experiment(s) on {}",
        job_id,
        payload.len(),
        state.site.capabilities.name()
    );
    state.app.jobs.write().await.insert(
        job_id.clone(),
        MockJob {
            site: state.site.prefix.clone(),
            payload,
            polls: 0,
        },
    );

    Ok(Json(json!({
        "job_id": job_id,
        "status": JobState::Initializing.as_str(),
    })))
}

async fn get_job_result(
    _token: AccessToken,
    State(state): State<SiteState>,
    Query(query): Query<JobQuery>,
) -> Result<Json<Value>, ApiError> {
    let threshold = state.app.config.polls_until_finished;
    let mut jobs = state.app.jobs.write().await;
    let job = jobs
        .get_mut(&query.job_id)
        .filter(|j| j.site == state.site.prefix)
        .ok_or_else(|| ApiError::NotFound(format!("job {}", query.job_id)))?;

    job.polls = job.polls.saturating_add(1);
    let caps = &state.site.capabilities;

    let body = match job.state(threshold) {
        JobState::Done => json!({
            "backend_name": caps.name(),
            "backend_version": caps.version(),
            "job_id": query.job_id,
            "qobj_id": query.job_id,
            "success": true,
            "header": {},
            "status": "finished",
            "results": synthesize_results(&job.payload, caps),
        }),
        pending => json!({
            "job_id": query.job_id,
            "status": pending.as_str(),
        }),
    };
    Ok(Json(body))
}

async fn get_job_status(
    _token: AccessToken,
    State(state): State<SiteState>,
    Json(query): Json<JobQuery>,
) -> Result<Json<Value>, ApiError> {
    let jobs = state.app.jobs.read().await;
    let job = jobs
        .get(&query.job_id)
        .filter(|j| j.site == state.site.prefix)
        .ok_or_else(|| ApiError::NotFound(format!("job {}", query.job_id)))?;

    let status = match job.state(state.app.config.polls_until_finished) {
        JobState::Done => "finished",
        other => other.as_str(),
    };
    Ok(Json(json!({ "job_id": query.job_id, "status": status })))
}

fn check_payload(payload: &SubmissionPayload, caps: &BackendCapabilities) -> Result<(), ApiError> {
    if payload.is_empty() {
        return Err(ColdAtomError::EmptySubmission.into());
    }
    if payload.len() > caps.max_experiments() {
        return Err(ColdAtomError::TooManyExperiments {
            requested: payload.len(),
            allowed: caps.max_experiments(),
        }
        .into());
    }
    for experiment in payload.experiments() {
        if experiment.shots > caps.max_shots() {
            return Err(ColdAtomError::TooManyShots {
                requested: experiment.shots,
                allowed: caps.max_shots(),
            }
            .into());
        }
        for instruction in &experiment.instructions {
            validate_instruction(instruction, caps)?;
        }
    }
    Ok(())
}

/// Per-shot atom counts, one frame per species slot.
fn synthesize_results(
    payload: &SubmissionPayload,
    caps: &BackendCapabilities,
) -> Vec<ExperimentResult> {
    let slots = caps.atomic_species().len().max(1);
    payload
        .iter()
        .map(|(label, experiment)| {
            let memory = (0..experiment.shots)
                .map(|shot| {
                    let jitter = f64::from(shot % 3) * 50.0;
                    (0..slots)
                        .map(|slot| {
                            let total = if slot == 0 { 100_000.0 } else { 10_000.0 };
                            vec![total * 0.9 + jitter, total * 0.1 - jitter]
                        })
                        .collect()
                })
                .collect();
            ExperimentResult::new(label, memory)
        })
        .collect()
}
