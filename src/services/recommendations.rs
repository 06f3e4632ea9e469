use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{PlaceId, Recommendation, RestaurantSummary, Stars, DEFAULT_RECOMMENDATION_COUNT},
    services::{
        catalog::Catalog,
        svd::{Svd, SvdParams},
    },
};

/// A rating batch to fold into the corpus
#[derive(Debug, Clone)]
pub struct RefreshRequest {
    /// Reviewer id the new ratings are merged under; must not exist in the corpus
    pub reviewer_id: String,
    pub ratings: BTreeMap<PlaceId, Stars>,
    pub count: Option<usize>,
    /// Restrict scoring to these restaurants
    pub candidate_ids: Option<Vec<PlaceId>>,
}

/// Retrains the factorization model with a user's ratings and ranks unrated restaurants
#[derive(Clone)]
pub struct RecommendationEngine {
    params: SvdParams,
    max_recommendations: usize,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl RecommendationEngine {
    pub fn new(params: SvdParams, max_recommendations: usize) -> Self {
        Self {
            params,
            max_recommendations,
            cache: None,
            cache_ttl: 0,
        }
    }

    /// Enables Redis caching of recommendation lists
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn params(&self) -> &SvdParams {
        &self.params
    }

    /// Produces recommendations, serving a cached list for an identical batch
    pub async fn recommend(
        &self,
        catalog: Arc<Catalog>,
        request: RefreshRequest,
    ) -> AppResult<Vec<Recommendation>> {
        let count = self.validate(&catalog, &request)?;

        let key = CacheKey::Recommendations {
            catalog_version: catalog.version(),
            fingerprint: fingerprint(&request.ratings, count, request.candidate_ids.as_deref()),
        };

        let params = self.params.clone();
        cached!(self.cache.as_ref(), key, self.cache_ttl, async move {
            tracing::info!(
                reviewer = %request.reviewer_id,
                new_ratings = request.ratings.len(),
                corpus = catalog.ratings().len(),
                count,
                "Retraining model with new ratings"
            );

            let started = std::time::Instant::now();
            let recommendations = tokio::task::spawn_blocking(move || {
                refresh(
                    &catalog,
                    &params,
                    &request.reviewer_id,
                    &request.ratings,
                    count,
                    request.candidate_ids.as_deref(),
                )
            })
            .await
            .map_err(|e| AppError::Internal(format!("Training task failed: {}", e)))??;

            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                returned = recommendations.len(),
                "Recommendations generated"
            );

            Ok::<_, AppError>(recommendations)
        })
    }

    fn validate(&self, catalog: &Catalog, request: &RefreshRequest) -> AppResult<usize> {
        if request.ratings.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one rating is required".to_string(),
            ));
        }

        if let Some(unknown) = request.ratings.keys().find(|id| !catalog.contains(id)) {
            return Err(AppError::NotFound(format!("Restaurant {}", unknown)));
        }

        let count = request.count.unwrap_or(DEFAULT_RECOMMENDATION_COUNT);
        if count == 0 || count > self.max_recommendations {
            return Err(AppError::InvalidInput(format!(
                "Recommendation count must be between 1 and {}",
                self.max_recommendations
            )));
        }

        Ok(count)
    }
}

/// Stable cache fingerprint of a rating batch
fn fingerprint(
    ratings: &BTreeMap<PlaceId, Stars>,
    count: usize,
    candidates: Option<&[PlaceId]>,
) -> String {
    let ratings = ratings
        .iter()
        .map(|(id, stars)| format!("{}={}", id, stars.value()))
        .collect::<Vec<_>>()
        .join(",");

    let scope = match candidates {
        Some(ids) => {
            let mut ids: Vec<&str> = ids.iter().map(PlaceId::as_str).collect();
            ids.sort_unstable();
            ids.dedup();
            ids.join(",")
        }
        None => "all".to_string(),
    };

    format!("{}|n={}|{}", ratings, count, scope)
}

/// Merges the new ratings into the corpus, retrains and ranks unrated restaurants
///
/// Restaurants the user rated, and other branches sharing a rated title, are
/// never recommended. Results are unique by title.
pub fn refresh(
    catalog: &Catalog,
    params: &SvdParams,
    reviewer_id: &str,
    ratings: &BTreeMap<PlaceId, Stars>,
    count: usize,
    candidates: Option<&[PlaceId]>,
) -> AppResult<Vec<Recommendation>> {
    let merged = catalog
        .ratings()
        .iter()
        .map(|r| (r.reviewer_id.as_str(), r.place_id.as_str(), r.rating))
        .chain(
            ratings
                .iter()
                .map(|(id, stars)| (reviewer_id, id.as_str(), stars.as_f64())),
        );

    let model = Svd::fit(params.clone(), merged)?;

    let rated_titles: HashSet<&str> = ratings
        .keys()
        .filter_map(|id| catalog.restaurant(id))
        .map(|r| r.title.as_str())
        .collect();

    let pool = match candidates {
        Some(ids) => ids.to_vec(),
        None => catalog.place_ids(),
    };

    let mut seen = HashSet::new();
    let mut scored: Vec<(&PlaceId, f64)> = pool
        .iter()
        .filter(|id| seen.insert(*id))
        .filter(|id| !ratings.contains_key(*id))
        .filter_map(|id| catalog.restaurant(id))
        .filter(|r| !rated_titles.contains(r.title.as_str()))
        .map(|r| (&r.place_id, model.predict(reviewer_id, r.place_id.as_str()).estimate))
        .collect();

    scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(b.0),
        other => other,
    });

    let mut seen_titles = HashSet::new();
    let recommendations = scored
        .into_iter()
        .filter_map(|(id, estimate)| catalog.restaurant(id).map(|r| (r, estimate)))
        .filter(|(r, _)| seen_titles.insert(r.title.as_str()))
        .take(count)
        .map(|(r, estimate)| Recommendation {
            restaurant: RestaurantSummary::from(r),
            predicted_rating: estimate,
            average_score: r.total_score,
        })
        .collect();

    Ok(recommendations)
}
