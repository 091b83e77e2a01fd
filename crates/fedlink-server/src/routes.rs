//! HTTP routes for the link resolver

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::error::{Result, ServerError};
use crate::state::{ServerStats, SharedState};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(flatten)]
    pub stats: ServerStats,
}

/// 301 with an empty body. A target that cannot be sent as a header goes
/// to `fallback` instead.
fn moved_permanently(target: &str, fallback: &str) -> Response {
    let location = HeaderValue::try_from(target).unwrap_or_else(|e| {
        tracing::warn!(redirect = target, error = %e, "Redirect target is not a valid header value");
        HeaderValue::try_from(fallback).unwrap_or_else(|_| HeaderValue::from_static("/"))
    });
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Carry the request's query string over to the redirect target
fn with_query(mut target: String, uri: &Uri) -> String {
    if let Some(query) = uri.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Raw tail of a `/collections/...` or `/projects/...` path, still
/// percent-encoded and starting with `/`
fn object_tail(path: &str) -> &str {
    path.strip_prefix("/collections")
        .or_else(|| path.strip_prefix("/projects"))
        .unwrap_or(path)
}

/// Plan on `path` and answer with the redirect
async fn redirect(state: &SharedState, path: &str, uri: &Uri) -> Response {
    let target = with_query(state.planner.plan_redirect(path).await, uri);
    moved_permanently(&target, state.planner.default_redirect())
}

/// `/` -> home page
async fn home(State(state): State<SharedState>) -> Response {
    moved_permanently(&state.home_redirect, state.planner.default_redirect())
}

/// `/about` -> about page
async fn about(State(state): State<SharedState>) -> Response {
    moved_permanently(&state.about_redirect, state.planner.default_redirect())
}

/// Static help page
async fn help(State(state): State<SharedState>) -> Result<Html<axum::body::Bytes>> {
    state
        .help_page
        .clone()
        .map(Html)
        .ok_or_else(|| ServerError::NotFound("help page not configured".to_string()))
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        stats: state.stats(),
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<SharedState>) -> Result<String> {
    state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| ServerError::NotFound("metrics exporter disabled".to_string()))
}

/// `/collections/<path>` and `/projects/<path>`: plan on the raw tail only
async fn object_redirect(State(state): State<SharedState>, uri: Uri) -> Response {
    redirect(&state, object_tail(uri.path()), &uri).await
}

/// Anything else: plan on the full raw request path
async fn fallback_redirect(State(state): State<SharedState>, uri: Uri) -> Response {
    redirect(&state, uri.path(), &uri).await
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let static_dir = state.static_dir.clone();

    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/help", get(help))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/collections/{*path}", get(object_redirect))
        .route("/projects/{*path}", get(object_redirect))
        .route_service("/favicon.ico", ServeFile::new(static_dir.join("favicon.ico")))
        .nest_service("/images", ServeDir::new(static_dir.join("images")))
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .fallback(fallback_redirect)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
