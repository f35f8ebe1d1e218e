//! Sequence catalog handler: list the definitions available on disk.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use uuid::Uuid;

use sequor_core::sequence::discover_sequences;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/sequences - List sequence definitions discovered in the
/// sequences directory.
pub async fn list_sequences(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    // Directory scanning is sync fs work; keep it off the runtime threads.
    let dir = state.sequences_dir.clone();
    let discovered = tokio::task::spawn_blocking(move || discover_sequences(&dir))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    let elapsed = start.elapsed().as_millis() as u64;

    let entries: Vec<serde_json::Value> = discovered
        .iter()
        .map(|(path, def)| {
            serde_json::json!({
                "name": def.name,
                "description": def.description,
                "steps": def.steps.len(),
                "path": path,
            })
        })
        .collect();

    let resp = ApiResponse::success(entries, request_id, elapsed)
        .with_link("self", "/api/v1/sequences")
        .with_link("jobs", "/api/v1/jobs");

    Ok(Json(resp))
}
