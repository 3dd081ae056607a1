use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::Cache;
use crate::middleware::request_id::request_id_middleware;
use crate::services::engine::RecommendationEngine;
use crate::stores::RecommendationStore;

pub mod recommendations;

/// Shared application state
///
/// The engine and store handles are constructed once at startup and passed
/// in explicitly; the cache is optional so the service runs (uncached) when
/// Redis is not configured.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub recommendations: Arc<dyn RecommendationStore>,
    pub cache: Option<Cache>,
    pub cache_ttl: u64,
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/recommendations/popular",
            get(recommendations::popular),
        )
        .route(
            "/recommendations/trending",
            get(recommendations::trending),
        )
        .route(
            "/recommendations/:user_id",
            get(recommendations::for_user),
        )
        .route(
            "/recommendations/:user_id/generate",
            post(recommendations::generate_and_save),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
