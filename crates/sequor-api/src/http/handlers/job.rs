//! Job control handlers for the REST API: start, list, status, cancel,
//! retry, evict.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use sequor_core::sequence::find_sequence;
use sequor_types::sequence::SequenceDefinition;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for POST /api/v1/jobs.
///
/// Either names a sequence to resolve from the sequences directory or
/// carries an inline definition. Exactly one of the two must be present.
#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub definition: Option<SequenceDefinition>,
}

async fn resolve_definition(
    state: &AppState,
    body: StartJobRequest,
) -> Result<SequenceDefinition, AppError> {
    match (body.sequence, body.definition) {
        (Some(name), None) => {
            let dir = state.sequences_dir.clone();
            let lookup = name.clone();
            let found = tokio::task::spawn_blocking(move || find_sequence(&dir, &lookup))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
            found.ok_or(AppError::SequenceNotFound(name))
        }
        (None, Some(definition)) => Ok(definition),
        (Some(_), Some(_)) => Err(AppError::BadRequest(
            "provide either 'sequence' or 'definition', not both".to_string(),
        )),
        (None, None) => Err(AppError::BadRequest(
            "request must name a 'sequence' or carry an inline 'definition'".to_string(),
        )),
    }
}

/// POST /api/v1/jobs - Start a sequence as a new job. Returns 202; the job
/// runs in the background and is queried through the other endpoints.
pub async fn start_job(
    State(state): State<AppState>,
    Json(body): Json<StartJobRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let definition = resolve_definition(&state, body).await?;
    let job_id = state.registry.start_sequence(definition)?;
    let job = state.registry.get_status(job_id)?;
    let elapsed = start.elapsed().as_millis() as u64;

    let job_json = serde_json::to_value(&job).unwrap();
    let resp = ApiResponse::success(job_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/jobs/{job_id}"))
        .with_link("cancel", &format!("/api/v1/jobs/{job_id}/cancel"));

    Ok((StatusCode::ACCEPTED, Json(resp)))
}

/// GET /api/v1/jobs - List all tracked jobs, most recently started first.
pub async fn list_jobs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let jobs = state.registry.list_jobs();
    let elapsed = start.elapsed().as_millis() as u64;

    let jobs_json: Vec<serde_json::Value> = jobs
        .iter()
        .map(|j| serde_json::to_value(j).unwrap())
        .collect();

    let resp =
        ApiResponse::success(jobs_json, request_id, elapsed).with_link("self", "/api/v1/jobs");

    Ok(Json(resp))
}

/// GET /api/v1/jobs/:id - Current snapshot of one job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let job = state.registry.get_status(id)?;
    let elapsed = start.elapsed().as_millis() as u64;

    let job_json = serde_json::to_value(&job).unwrap();
    let resp = ApiResponse::success(job_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/jobs/{id}"))
        .with_link("cancel", &format!("/api/v1/jobs/{id}/cancel"))
        .with_link("retry", &format!("/api/v1/jobs/{id}/retry"));

    Ok(Json(resp))
}

/// POST /api/v1/jobs/:id/cancel - Request cancellation. Idempotent: a job
/// that already reached a terminal state is returned unchanged.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let job = state.registry.cancel_job(id)?;
    let elapsed = start.elapsed().as_millis() as u64;

    let job_json = serde_json::to_value(&job).unwrap();
    let resp = ApiResponse::success(job_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/jobs/{id}"));

    Ok(Json(resp))
}

/// POST /api/v1/jobs/:id/retry - Create a new job resuming a failed one
/// from its first failed step. Returns 202 with the new job.
pub async fn retry_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let new_id = state.registry.retry_job(id)?;
    let job = state.registry.get_status(new_id)?;
    let elapsed = start.elapsed().as_millis() as u64;

    let job_json = serde_json::to_value(&job).unwrap();
    let resp = ApiResponse::success(job_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/jobs/{new_id}"))
        .with_link("retry_of", &format!("/api/v1/jobs/{id}"));

    Ok((StatusCode::ACCEPTED, Json(resp)))
}

/// DELETE /api/v1/jobs/:id - Evict a terminal job from the registry.
pub async fn evict_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let job = state.registry.evict_job(id)?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(
        serde_json::json!({"evicted": true, "id": id, "state": job.state}),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}
