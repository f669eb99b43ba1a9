use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::config::RefreshMode;
use crate::error::{AppError, AppResult};
use crate::refresh::{ControllerStatus, DashboardSettings, DashboardView};

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub status: ControllerStatus,
    pub settings: DashboardSettings,
    /// `false` in fixed-delay mode, where refreshes are not user-controlled
    pub manual_refresh_enabled: bool,
}

/// Current dashboard state
///
/// Returns the latest rendered view, the refresh state and, after a failed
/// pass, the error to display. Never contacts the data source.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard state", body = DashboardResponse),
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        status: state.controller.status().await,
        settings: state.current_settings(),
        manual_refresh_enabled: state.config.refresh_mode == RefreshMode::Interactive,
    })
}

/// Refresh now
///
/// Clears the snapshot cache, reads the worksheet and re-renders. The
/// scheduler restarts its auto-refresh timer afterwards.
#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 200, description = "Fresh render", body = DashboardView),
        (status = 400, description = "Manual refresh disabled in fixed-delay mode"),
        (status = 403, description = "Service account lacks access"),
        (status = 404, description = "Document or worksheet not found, or no data"),
        (status = 422, description = "Sheet lacks the candidate or Votes column"),
        (status = 502, description = "Authentication failed"),
        (status = 503, description = "Data source unavailable"),
    ),
    tag = "dashboard"
)]
pub async fn refresh_now(State(state): State<AppState>) -> AppResult<Json<DashboardView>> {
    if state.config.refresh_mode == RefreshMode::Fixed {
        return Err(AppError::BadRequest(
            "Manual refresh is disabled in fixed-delay mode".to_string(),
        ));
    }

    let settings = state.current_settings();
    let view = state.controller.manual_refresh(&settings).await?;
    Ok(Json((*view).clone()))
}
