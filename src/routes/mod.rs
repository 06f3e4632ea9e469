use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

pub mod recommendations;
pub mod restaurants;
pub mod sessions;
pub mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/restaurants", get(restaurants::list))
        .route("/restaurants/facets", get(restaurants::facets))
        .route("/restaurants/filter", post(restaurants::filter_restaurants))
        .route("/restaurants/:place_id", get(restaurants::get_restaurant))
        .route("/categories", get(restaurants::categories))
        .route("/sessions", post(sessions::create))
        .route("/sessions/:id", get(sessions::get).delete(sessions::delete))
        .route("/sessions/:id/ratings", put(sessions::stage_ratings))
        .route("/sessions/:id/submit", post(sessions::submit))
        .route("/sessions/:id/recommendations", post(sessions::recommendations))
        .route("/recommendations", post(recommendations::recommend))
        .route("/catalog/reload", post(recommendations::reload_catalog))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
