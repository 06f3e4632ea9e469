use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{FilterCriteria, FilterOutcome, Restaurant, RestaurantSummary},
    services::catalog::Catalog,
};

/// Whether a single restaurant satisfies every criterion
pub fn matches(restaurant: &Restaurant, criteria: &FilterCriteria) -> bool {
    let in_list = |value: &Option<String>, list: &[String]| {
        list.is_empty() || value.as_ref().is_some_and(|v| list.contains(v))
    };

    in_list(&restaurant.category, &criteria.categories)
        && in_list(&restaurant.city, &criteria.cities)
        && in_list(&restaurant.price, &criteria.prices)
        && restaurant
            .total_score
            .is_some_and(|s| s >= criteria.min_rating && s <= criteria.max_rating)
        && criteria
            .amenities
            .iter()
            .all(|&amenity| restaurant.amenities.has(amenity))
}

/// Narrows the catalog to restaurants matching the criteria
pub fn filter_restaurants(catalog: &Catalog, criteria: &FilterCriteria) -> AppResult<FilterOutcome> {
    criteria.validate()?;

    let matched: Vec<&Restaurant> = catalog
        .restaurants()
        .iter()
        .filter(|r| matches(r, criteria))
        .collect();

    let mut seen_ids = HashSet::new();
    let place_ids: Vec<_> = matched
        .iter()
        .filter(|r| seen_ids.insert(&r.place_id))
        .map(|r| r.place_id.clone())
        .collect();

    // Same restaurant scraped twice shows up once in the table
    let mut seen_rows = HashSet::new();
    let rows: Vec<RestaurantSummary> = matched
        .iter()
        .filter(|r| {
            seen_rows.insert((
                r.title.as_str(),
                r.category.as_deref(),
                r.city.as_deref(),
                r.price.as_deref(),
                r.total_score.map(f64::to_bits),
            ))
        })
        .map(|r| RestaurantSummary::from(*r))
        .collect();

    tracing::debug!(
        matched = place_ids.len(),
        rows = rows.len(),
        "Filter applied"
    );

    Ok(FilterOutcome {
        count: place_ids.len(),
        place_ids,
        rows,
    })
}
