pub mod cache;
pub mod dashboard;
pub mod diagnostics;
pub mod health;
pub mod settings;
pub mod snapshot;
pub mod view;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::services::rate_limit::ClientIpKeyExtractor;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        view::get_dashboard,
        view::refresh_now,
        settings::get_settings,
        settings::put_settings,
        snapshot::get_snapshot,
        diagnostics::get_diagnostics,
    ),
    components(
        schemas(
            health::HealthResponse,
            view::DashboardResponse,
            crate::refresh::DashboardView,
            crate::refresh::DashboardSettings,
            crate::refresh::ControllerStatus,
            crate::refresh::ErrorReport,
            crate::refresh::RefreshState,
            crate::refresh::WaitMode,
            crate::chart::ChartSpec,
            crate::chart::Bar,
            crate::diagnostics::DiagnosticReport,
            crate::diagnostics::DiagnosticStep,
            crate::diagnostics::StepStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "dashboard", description = "Rendered chart, manual refresh and raw records"),
        (name = "settings", description = "Sidebar configuration"),
        (name = "diagnostics", description = "Connection diagnostics"),
    ),
    info(
        title = "Vote Board API",
        description = "Live vote tally dashboard backed by a Google Sheets worksheet",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
    } else {
        tracing::info!(
            rate = %format!("{}/s burst {}", config.rate_limit_per_second, config.rate_limit_burst),
            "Rate limiting configured for source-reading routes"
        );
    }

    // Routes that never contact the data source
    let state_routes = Router::new()
        .route("/dashboard", get(view::get_dashboard))
        .route(
            "/settings",
            get(settings::get_settings).put(settings::put_settings),
        );

    // Routes that may trigger a remote read
    let source_routes_base = Router::new()
        .route("/refresh", post(view::refresh_now))
        .route("/snapshot", get(snapshot::get_snapshot))
        .route("/diagnostics", get(diagnostics::get_diagnostics));

    let source_routes = if config.disable_rate_limiting {
        source_routes_base
    } else {
        match GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish()
        {
            Some(limiter) => source_routes_base.layer(GovernorLayer {
                config: Arc::new(limiter),
            }),
            None => {
                tracing::error!("Invalid rate limit settings, serving without rate limiting");
                source_routes_base
            }
        }
    };

    let api_routes = Router::new()
        .merge(state_routes)
        .merge(source_routes)
        .layer(RequestBodyLimitLayer::new(64 * 1024));

    let page_routes = Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/healthz", get(health::healthz));

    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(page_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
