use axum::{
    extract::Query,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::app::ResolveArtistsUseCase;
use crate::config::SearchConfig;
use crate::observability::metrics as finder_metrics;

/// The finder, or the configuration error that prevented building it
pub enum FinderState {
    Ready(Arc<ResolveArtistsUseCase>),
    Misconfigured(String),
}

pub struct AppState {
    pub finder: FinderState,
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "artist_finder",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Prometheus text exposition of the process-wide recorder
async fn metrics_text() -> Response {
    match finder_metrics::render() {
        Some(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        None => error_json(StatusCode::SERVICE_UNAVAILABLE, "Metrics recorder is not installed"),
    }
}

async fn search(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = match params.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return error_json(StatusCode::BAD_REQUEST, "Query parameter 'q' is required"),
    };
    // Unparseable limits fall back to the default, like a missing one
    let requested = params.limit.as_deref().and_then(|l| l.trim().parse::<usize>().ok());
    let limit = state.search.clamp_max_results(requested);

    let finder = match &state.finder {
        FinderState::Ready(finder) => finder.clone(),
        FinderState::Misconfigured(message) => {
            error!("Search rejected: {}", message);
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, message.clone());
        }
    };

    let results = finder.resolve_artists(&query, limit).await;
    if results.is_empty() {
        return error_json(StatusCode::NOT_FOUND, "No results found");
    }
    Json(results).into_response()
}

/// Create the HTTP router with all routes
pub fn create_server(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/search", get(search))
        .route("/metrics", get(metrics_text))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Bind and serve until the process is stopped
pub async fn start_server(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_server(state);

    info!("HTTP server listening on {}", addr);
    println!("🚀 HTTP server running on http://{addr}");
    println!("💚 Health check: http://{addr}/health");
    println!("🔎 Search:       http://{addr}/api/search?q=...");
    println!("📊 Metrics:      http://{addr}/metrics");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
