use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors surfaced by the refresh cycle and the HTTP layer.
///
/// Variants carry rendered messages only so the type stays `Clone`: the
/// snapshot cache shares one failure between every caller waiting on the
/// same fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Data source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Unexpected sheet layout: {0}")]
    Schema(String),

    #[error("No data available")]
    EmptyData,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Stable machine-readable name, used in API bodies and log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::NotFound(_) => "not_found",
            Self::Permission(_) => "permission",
            Self::Schema(_) => "schema",
            Self::EmptyData => "empty_data",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
            Self::Config(_) => "config",
        }
    }

    /// Whether a later attempt could succeed without any change on our side.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_))
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::BAD_GATEWAY,
            Self::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) | Self::EmptyData => StatusCode::NOT_FOUND,
            Self::Permission(_) => StatusCode::FORBIDDEN,
            Self::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                "Configuration error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
