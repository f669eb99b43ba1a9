use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::refresh::RefreshState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether the data source connection has been established
    pub connected: bool,
    pub refresh_state: RefreshState,
}

/// Health check endpoint
///
/// Returns 200 OK while the process is serving; a failed refresh cycle is
/// reported in the body, not the status code. Not rate-limited.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connected: state.controller.is_connected(),
        refresh_state: state.controller.state().await,
    })
}
