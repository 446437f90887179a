//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cases_stored: usize,
    pub version: &'static str,
}

/// `GET /api/health` — liveness probe.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cases_stored: ctx.store.len(),
        version: crate::config::APP_VERSION,
    })
}
