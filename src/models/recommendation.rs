use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{PlaceId, RestaurantSummary, Stars};

/// Number of recommendations returned when the caller does not ask for a count
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

/// A restaurant recommended to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub restaurant: RestaurantSummary,
    /// Score estimated by the factorization model, clipped to 1.0-5.0
    pub predicted_rating: f64,
    /// The restaurant's public average score
    pub average_score: Option<f64>,
}

/// Stateless recommendation refresh request
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub ratings: BTreeMap<PlaceId, Stars>,
    #[serde(default)]
    pub count: Option<usize>,
    /// Restrict scoring to these restaurants; the whole catalog otherwise
    #[serde(default)]
    pub candidate_ids: Option<Vec<PlaceId>>,
}
