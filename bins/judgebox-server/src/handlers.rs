// HTTP route handlers. Thin by design: deserialize, guard payload
// sizes, hand off to the pipeline, serialize whatever comes back.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use judgebox_common::types::ExecutionRequest;
use std::sync::Arc;
use tracing::info;

use crate::pipeline;
use crate::AppState;

/// Safety limits to keep pathological payloads away from the sandbox.
const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024; // 1MB
const MAX_TEST_INPUT_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Request-body cap installed on the router. Must sit above the per-field
/// guards, otherwise axum's default 2 MB body limit rejects payloads
/// these guards declare acceptable before the handler ever runs.
pub const MAX_REQUEST_BODY_BYTES: usize = 32 * 1024 * 1024; // 32MB

/// POST /execute - Run a submission against its test-case inputs.
pub async fn execute_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecutionRequest>,
) -> impl IntoResponse {
    if request.source_code.len() > MAX_SOURCE_CODE_BYTES {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("source code exceeds maximum size of {} bytes", MAX_SOURCE_CODE_BYTES)
            })),
        )
            .into_response();
    }
    if let Some(oversized) = request
        .inputs
        .iter()
        .position(|input| input.len() > MAX_TEST_INPUT_BYTES)
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("input {} exceeds maximum size of {} bytes", oversized, MAX_TEST_INPUT_BYTES)
            })),
        )
            .into_response();
    }

    info!(
        language = %request.language,
        inputs = request.inputs.len(),
        source_size = request.source_code.len(),
        "Execution request accepted"
    );

    let response = pipeline::execute(&request, state.executor.as_ref(), &state.workspaces).await;
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /health - Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
