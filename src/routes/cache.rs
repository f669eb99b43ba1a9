use axum::{
    http::{header, HeaderValue},
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};

/// Build a response carrying cache metadata headers.
///
/// # Headers
///
/// - `Content-Type`: as given
/// - `X-Cache: HIT` or `X-Cache: MISS`
/// - `X-Fetched-At`: RFC 3339 time the snapshot was read from the source
pub fn cached_response(
    data: Vec<u8>,
    content_type: &'static str,
    cache_hit: bool,
    fetched_at: DateTime<Utc>,
) -> AppResult<Response> {
    let cache_header = if cache_hit { "HIT" } else { "MISS" };
    let fetched_at = HeaderValue::from_str(&fetched_at.to_rfc3339())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
        .header("X-Cache", HeaderValue::from_static(cache_header))
        .header("X-Fetched-At", fetched_at)
        .body(axum::body::Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}
