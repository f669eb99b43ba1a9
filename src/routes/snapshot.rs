use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::routes::cache::cached_response;

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SnapshotQuery {
    /// Output format: json or csv
    #[serde(default = "default_format")]
    pub format: String,
}

/// Raw worksheet records
///
/// Reads the configured worksheet through the snapshot cache. The `X-Cache`
/// header tells whether a remote read happened.
#[utoipa::path(
    get,
    path = "/api/snapshot",
    params(SnapshotQuery),
    responses(
        (status = 200, description = "Records as JSON or CSV"),
        (status = 400, description = "Unknown format"),
    ),
    tag = "dashboard"
)]
pub async fn get_snapshot(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> AppResult<Response> {
    let format = query.format.to_lowercase();
    if format != "json" && format != "csv" {
        return Err(AppError::BadRequest(format!(
            "Unknown format '{}', expected json or csv",
            query.format
        )));
    }

    let settings = state.current_settings();
    let lookup = state.controller.current_snapshot(&settings).await?;
    let snapshot = &lookup.entry.snapshot;

    if format == "csv" {
        cached_response(
            snapshot.to_csv()?,
            "text/csv; charset=utf-8",
            lookup.hit,
            lookup.entry.fetched_at,
        )
    } else {
        let body = serde_json::to_vec(snapshot.as_ref())
            .map_err(|e| AppError::Internal(e.to_string()))?;
        cached_response(body, "application/json", lookup.hit, lookup.entry.fetched_at)
    }
}
