use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Facets, FilterCriteria, FilterOutcome, PlaceId, Restaurant, RestaurantSummary},
    routes::AppState,
    services::filter,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    /// Comma separated category names; empty means all
    #[serde(default)]
    categories: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: BTreeMap<String, Vec<String>>,
}

/// Lists restaurants, optionally narrowed by a case-insensitive title search
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<RestaurantSummary>>> {
    let catalog = state.catalog().await;
    let needle = params
        .q
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let rows = catalog
        .restaurants()
        .iter()
        .filter(|r| {
            needle
                .as_ref()
                .map_or(true, |n| r.title.to_lowercase().contains(n.as_str()))
        })
        .map(RestaurantSummary::from)
        .collect();

    Ok(Json(rows))
}

pub async fn facets(State(state): State<Arc<AppState>>) -> Json<Facets> {
    Json(state.catalog().await.facets())
}

pub async fn get_restaurant(
    State(state): State<Arc<AppState>>,
    Path(place_id): Path<String>,
) -> AppResult<Json<Restaurant>> {
    let catalog = state.catalog().await;
    catalog
        .restaurant(&PlaceId(place_id.clone()))
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Restaurant {}", place_id)))
}

/// Applies an attribute filter to the catalog
pub async fn filter_restaurants(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(criteria): Json<FilterCriteria>,
) -> AppResult<Json<FilterOutcome>> {
    let catalog = state.catalog().await;
    let outcome = filter::filter_restaurants(&catalog, &criteria)?;

    tracing::info!(
        request_id = %request_id,
        categories = criteria.categories.len(),
        cities = criteria.cities.len(),
        amenities = criteria.amenities.len(),
        matched = outcome.count,
        "Filter applied"
    );

    Ok(Json(outcome))
}

/// Groups restaurant titles under the selected categories
pub async fn categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategoriesQuery>,
) -> Json<CategoriesResponse> {
    let selected: Vec<String> = params
        .categories
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    let catalog = state.catalog().await;
    Json(CategoriesResponse {
        categories: catalog.categories_index(&selected),
    })
}
