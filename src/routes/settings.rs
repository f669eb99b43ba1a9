use axum::{extract::State, Json};

use crate::common::AppState;
use crate::error::AppResult;
use crate::refresh::DashboardSettings;

/// Current sidebar settings
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Current settings", body = DashboardSettings),
    ),
    tag = "settings"
)]
pub async fn get_settings(State(state): State<AppState>) -> Json<DashboardSettings> {
    Json(state.current_settings())
}

/// Replace sidebar settings
///
/// Any accepted change triggers a render pass (served from the cache when
/// the document and worksheet are unchanged and the entry is fresh).
#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = DashboardSettings,
    responses(
        (status = 200, description = "Settings stored", body = DashboardSettings),
        (status = 400, description = "Invalid settings"),
    ),
    tag = "settings"
)]
pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<DashboardSettings>,
) -> AppResult<Json<DashboardSettings>> {
    settings.validate()?;

    let previous = state.settings.send_replace(settings.clone());
    if previous != settings {
        tracing::info!(
            sheet_url = %settings.sheet_url,
            sheet = %settings.worksheet_name,
            interval_secs = settings.refresh_interval_secs,
            auto_refresh = settings.auto_refresh,
            "Dashboard settings updated"
        );
    }

    Ok(Json(settings))
}
