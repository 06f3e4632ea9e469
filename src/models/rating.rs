use serde::{Deserialize, Serialize};

use super::PlaceId;
use crate::error::{AppError, AppResult};

/// A single row of the review corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub reviewer_id: String,
    pub place_id: PlaceId,
    pub rating: f64,
}

impl Rating {
    pub fn new(reviewer_id: impl Into<String>, place_id: PlaceId, rating: f64) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            place_id,
            rating,
        }
    }
}

/// A star rating given by a user, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> AppResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {} stars, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }
}

impl TryFrom<u8> for Stars {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stars::new(value)
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}
