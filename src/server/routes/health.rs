//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::error::ApiResult;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine: String,
    pub version: String,
}

/// Health check endpoint.
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        engine: state.converter.engine_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
