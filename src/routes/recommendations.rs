use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Recommendation, RecommendationRequest},
    routes::AppState,
    services::RefreshRequest,
};

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub version: u64,
    pub restaurants: usize,
    pub ratings: usize,
}

/// Handler for the stateless recommendation refresh
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<Recommendation>>> {
    tracing::info!(
        request_id = %request_id,
        ratings = request.ratings.len(),
        restricted = request.candidate_ids.is_some(),
        "Processing recommendation request"
    );

    let catalog = state.catalog().await;
    let recommendations = state
        .engine
        .recommend(
            catalog,
            RefreshRequest {
                reviewer_id: format!("anon:{}", Uuid::new_v4()),
                ratings: request.ratings,
                count: request.count,
                candidate_ids: request.candidate_ids,
            },
        )
        .await?;

    Ok(Json(recommendations))
}

/// Reloads the catalog and review corpus from the data source
pub async fn reload_catalog(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<ReloadResponse>> {
    let catalog = state.reload_catalog().await?;

    tracing::info!(
        request_id = %request_id,
        version = catalog.version(),
        "Catalog reloaded"
    );

    Ok(Json(ReloadResponse {
        version: catalog.version(),
        restaurants: catalog.restaurants().len(),
        ratings: catalog.ratings().len(),
    }))
}
