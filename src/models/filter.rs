use serde::{Deserialize, Serialize};

use super::{Amenity, PlaceId, RestaurantSummary};
use crate::error::{AppError, AppResult};

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;

/// Restaurant attribute filter. Empty lists mean "no restriction".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub prices: Vec<String>,
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
    #[serde(default = "default_max_rating")]
    pub max_rating: f64,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
}

fn default_min_rating() -> f64 {
    3.0
}

fn default_max_rating() -> f64 {
    MAX_SCORE
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            cities: Vec::new(),
            prices: Vec::new(),
            min_rating: default_min_rating(),
            max_rating: default_max_rating(),
            amenities: Vec::new(),
        }
    }
}

impl FilterCriteria {
    /// Checks the rating range lies within the score scale and is ordered
    pub fn validate(&self) -> AppResult<()> {
        let in_scale = |v: f64| (MIN_SCORE..=MAX_SCORE).contains(&v);
        if !in_scale(self.min_rating) || !in_scale(self.max_rating) {
            return Err(AppError::InvalidInput(format!(
                "Rating range must lie within {:.1}-{:.1}",
                MIN_SCORE, MAX_SCORE
            )));
        }
        if self.min_rating > self.max_rating {
            return Err(AppError::InvalidInput(format!(
                "min_rating {} exceeds max_rating {}",
                self.min_rating, self.max_rating
            )));
        }
        Ok(())
    }
}

/// Result of applying a [`FilterCriteria`] to the catalog
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    /// Number of unique restaurants matched
    pub count: usize,
    /// Unique place ids in catalog order
    pub place_ids: Vec<PlaceId>,
    /// Display rows, deduplicated on title, category, city, price and score
    pub rows: Vec<RestaurantSummary>,
}

/// Available filter values derived from the catalog
#[derive(Debug, Clone, Serialize)]
pub struct Facets {
    pub categories: Vec<String>,
    pub cities: Vec<String>,
    pub prices: Vec<String>,
    pub amenities: Vec<AmenityFacet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AmenityFacet {
    pub amenity: Amenity,
    pub label: &'static str,
}
