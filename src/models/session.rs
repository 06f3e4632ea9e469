use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{FilterCriteria, PlaceId, Recommendation, Stars};
use crate::error::{AppError, AppResult};

/// How the list of restaurants to rate was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum SessionFlow {
    /// Random sample from the whole catalog
    General {
        /// Sample size the user asked for
        #[serde(default)]
        count: Option<usize>,
    },
    /// Random sample from restaurants matching an attribute filter
    Filtered {
        criteria: FilterCriteria,
        #[serde(default)]
        count: Option<usize>,
    },
    /// Explicit selection from chosen categories
    Category { categories: Vec<String> },
}

/// Rating progress of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub rated: usize,
    pub target: usize,
    pub completed: bool,
}

/// A user's pass through the rate-then-recommend wizard
#[derive(Debug, Clone, Serialize)]
pub struct RatingSession {
    pub id: Uuid,
    #[serde(flatten)]
    pub flow: SessionFlow,
    /// Restaurants still waiting for a submitted rating
    pub to_rate: Vec<PlaceId>,
    /// Ratings given but not yet submitted
    pub staged: BTreeMap<PlaceId, Stars>,
    /// Submitted ratings
    pub rated: BTreeMap<PlaceId, Stars>,
    /// Number of restaurants the user was asked to rate
    pub target: usize,
    /// Fewer unique restaurants were available than requested
    pub truncated: bool,
    pub completed: bool,
    pub recommendations: Option<Vec<Recommendation>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RatingSession {
    pub fn new(flow: SessionFlow, to_rate: Vec<PlaceId>, truncated: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            flow,
            target: to_rate.len(),
            to_rate,
            staged: BTreeMap::new(),
            rated: BTreeMap::new(),
            truncated,
            completed: false,
            recommendations: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reviewer id used for this session's ratings when merged into the corpus
    pub fn reviewer_id(&self) -> String {
        format!("session:{}", self.id)
    }

    /// Stages ratings for restaurants on the to-rate list, replacing earlier values
    pub fn stage(&mut self, ratings: BTreeMap<PlaceId, Stars>) -> AppResult<()> {
        if self.completed {
            return Err(AppError::Conflict(
                "All restaurants in this session are already rated".to_string(),
            ));
        }

        if let Some(unknown) = ratings.keys().find(|id| !self.to_rate.contains(id)) {
            return Err(AppError::InvalidInput(format!(
                "Restaurant {} is not waiting for a rating in this session",
                unknown
            )));
        }

        self.staged.extend(ratings);
        self.touch();
        Ok(())
    }

    /// Moves staged ratings into the submitted set
    pub fn submit(&mut self) -> AppResult<Progress> {
        if self.staged.is_empty() {
            return Err(AppError::InvalidInput(
                "Please rate at least one restaurant before submitting".to_string(),
            ));
        }

        let staged = std::mem::take(&mut self.staged);
        self.rated.extend(staged);
        self.to_rate.retain(|id| !self.rated.contains_key(id));

        if self.rated.len() >= self.target {
            self.completed = true;
        }
        self.recommendations = None;
        self.touch();

        Ok(self.progress())
    }

    pub fn progress(&self) -> Progress {
        Progress {
            rated: self.rated.len(),
            target: self.target,
            completed: self.completed,
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.updated_at > ttl
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
