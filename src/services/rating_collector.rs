use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{
    error::{AppError, AppResult},
    models::PlaceId,
    services::catalog::Catalog,
};

/// Default number of restaurants offered for rating
pub const DEFAULT_SAMPLE_SIZE: usize = 5;
const MIN_SAMPLE_SIZE: usize = 3;
const MAX_SAMPLE_SIZE: usize = 10;

/// Restaurants picked for the user to rate
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSample {
    pub place_ids: Vec<PlaceId>,
    /// Fewer unique titles were available than requested
    pub truncated: bool,
}

/// Clamps a requested sample size against the number of unique titles
///
/// Small pools are rated in full; larger pools allow between 3 and 10.
pub fn clamp_sample_size(requested: Option<usize>, available: usize) -> usize {
    if available < DEFAULT_SAMPLE_SIZE {
        return available;
    }
    let lower = MIN_SAMPLE_SIZE.min(available);
    let upper = MAX_SAMPLE_SIZE.min(available);
    requested.unwrap_or(DEFAULT_SAMPLE_SIZE).clamp(lower, upper)
}

/// Draws restaurants with distinct titles from the pool, uniformly without replacement
pub fn sample_to_rate<R: Rng + ?Sized>(
    catalog: &Catalog,
    pool: &[PlaceId],
    requested: Option<usize>,
    rng: &mut R,
) -> AppResult<RatingSample> {
    let unique = catalog.unique_by_title(pool);
    if unique.is_empty() {
        return Err(AppError::InvalidInput(
            "No restaurants available to rate; try different filters".to_string(),
        ));
    }

    let count = clamp_sample_size(requested, unique.len());
    let truncated = requested.is_some_and(|n| n > unique.len());

    let place_ids: Vec<PlaceId> = unique
        .choose_multiple(rng, count)
        .map(|r| r.place_id.clone())
        .collect();

    if truncated {
        tracing::warn!(
            requested = requested.unwrap_or_default(),
            available = unique.len(),
            "Fewer unique restaurants than requested, offering all of them"
        );
    }

    Ok(RatingSample {
        place_ids,
        truncated,
    })
}

/// Validates an explicit selection made from the chosen categories
///
/// Duplicate ids are dropped, order is preserved.
pub fn select_from_categories(
    catalog: &Catalog,
    categories: &[String],
    selection: &[PlaceId],
) -> AppResult<Vec<PlaceId>> {
    if selection.is_empty() {
        return Err(AppError::InvalidInput(
            "Please select at least one restaurant".to_string(),
        ));
    }

    let all = Catalog::selects_all_categories(categories);
    let mut seen = HashSet::new();
    let mut selected = Vec::with_capacity(selection.len());

    for place_id in selection {
        let restaurant = catalog
            .restaurant(place_id)
            .ok_or_else(|| AppError::NotFound(format!("Restaurant {}", place_id)))?;

        let in_category = restaurant
            .category
            .as_ref()
            .is_some_and(|c| categories.contains(c));
        if !all && !in_category {
            return Err(AppError::InvalidInput(format!(
                "Restaurant {} is not in the selected categories",
                place_id
            )));
        }

        if seen.insert(place_id.clone()) {
            selected.push(place_id.clone());
        }
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::tests::restaurant;
    use crate::services::catalog::ALL_CATEGORIES;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog(n: usize) -> Catalog {
        let restaurants = (0..n)
            .map(|i| {
                let category = if i % 2 == 0 { "Thai restaurant" } else { "Cafe" };
                restaurant(&format!("p{}", i), &format!("Place {}", i), category, "Bangkok", 4.0)
            })
            .collect();
        Catalog::new(restaurants, Vec::new(), 1)
    }

    #[test]
    fn test_clamp_sample_size() {
        assert_eq!(clamp_sample_size(None, 2), 2);
        assert_eq!(clamp_sample_size(Some(8), 4), 4);
        assert_eq!(clamp_sample_size(None, 20), 5);
        assert_eq!(clamp_sample_size(Some(1), 20), 3);
        assert_eq!(clamp_sample_size(Some(50), 20), 10);
        assert_eq!(clamp_sample_size(Some(8), 6), 6);
    }

    #[test]
    fn test_sample_has_distinct_titles() {
        let mut restaurants = catalog(12).restaurants().to_vec();
        // Chain branch sharing a title with p0
        restaurants.push(restaurant("p0-b", "Place 0", "Thai restaurant", "Phuket", 4.0));
        let catalog = Catalog::new(restaurants, Vec::new(), 1);

        let mut rng = StdRng::seed_from_u64(7);
        let sample = sample_to_rate(&catalog, &catalog.place_ids(), Some(10), &mut rng).unwrap();

        assert_eq!(sample.place_ids.len(), 10);
        assert!(!sample.truncated);
        let titles: HashSet<&str> = sample
            .place_ids
            .iter()
            .map(|id| catalog.restaurant(id).unwrap().title.as_str())
            .collect();
        assert_eq!(titles.len(), 10);
    }

    #[test]
    fn test_sample_truncates_small_pool() {
        let catalog = catalog(3);
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_to_rate(&catalog, &catalog.place_ids(), Some(5), &mut rng).unwrap();
        assert_eq!(sample.place_ids.len(), 3);
        assert!(sample.truncated);
    }

    #[test]
    fn test_sample_empty_pool_fails() {
        let catalog = catalog(3);
        let mut rng = StdRng::seed_from_u64(1);
        let result = sample_to_rate(&catalog, &[], None, &mut rng);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_select_from_categories() {
        let catalog = catalog(6);
        let categories = vec!["Cafe".to_string()];
        let selection = vec![PlaceId::new("p1"), PlaceId::new("p3"), PlaceId::new("p1")];

        let selected = select_from_categories(&catalog, &categories, &selection).unwrap();
        assert_eq!(selected, vec![PlaceId::new("p1"), PlaceId::new("p3")]);
    }

    #[test]
    fn test_select_outside_category_rejected() {
        let catalog = catalog(6);
        let categories = vec!["Cafe".to_string()];
        let result = select_from_categories(&catalog, &categories, &[PlaceId::new("p0")]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_select_all_categories_accepts_anything() {
        let catalog = catalog(6);
        let categories = vec![ALL_CATEGORIES.to_string()];
        let selected =
            select_from_categories(&catalog, &categories, &[PlaceId::new("p0"), PlaceId::new("p1")])
                .unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_select_unknown_or_empty() {
        let catalog = catalog(2);
        assert!(matches!(
            select_from_categories(&catalog, &[], &[PlaceId::new("missing")]),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            select_from_categories(&catalog, &[], &[]),
            Err(AppError::InvalidInput(_))
        ));
    }
}
