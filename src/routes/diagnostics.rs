use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::common::AppState;
use crate::diagnostics::{run_diagnostics, DiagnosticReport};
use crate::sheets::credentials::ServiceAccountKey;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DiagnosticsQuery {
    /// Document to test; defaults to the dashboard's current sheet URL
    pub sheet_url: Option<String>,
}

/// Connection diagnostics
///
/// Walks credentials, authentication, document, first worksheet and record
/// read, reporting each step. Always 200; failures are in the report.
#[utoipa::path(
    get,
    path = "/api/diagnostics",
    params(DiagnosticsQuery),
    responses(
        (status = 200, description = "Diagnostic report", body = DiagnosticReport),
    ),
    tag = "diagnostics"
)]
pub async fn get_diagnostics(
    State(state): State<AppState>,
    Query(query): Query<DiagnosticsQuery>,
) -> Json<DiagnosticReport> {
    let locator = query
        .sheet_url
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.current_settings().sheet_url);

    let credentials = ServiceAccountKey::load(&state.config).map(|key| key.client_email);

    Json(run_diagnostics(credentials, state.controller.connections(), &locator).await)
}
