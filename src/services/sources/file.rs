use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{Rating, Restaurant, RestaurantRow, ReviewRow},
    services::sources::RestaurantSource,
};

const RESTAURANTS_FILE: &str = "restaurants.json";
const REVIEWS_FILE: &str = "reviews.json";

/// Source reading JSON table dumps from a directory
///
/// Expects `restaurants.json` and `reviews.json`, each holding an array of rows
/// with the same columns as the database tables.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_rows<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::Internal(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Internal(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

#[async_trait::async_trait]
impl RestaurantSource for FileSource {
    async fn fetch_restaurants(&self) -> AppResult<Vec<Restaurant>> {
        let rows: Vec<RestaurantRow> = Self::read_rows(&self.dir.join(RESTAURANTS_FILE)).await?;
        Ok(rows.into_iter().map(Restaurant::from).collect())
    }

    async fn fetch_ratings(&self) -> AppResult<Vec<Rating>> {
        let rows: Vec<ReviewRow> = Self::read_rows(&self.dir.join(REVIEWS_FILE)).await?;
        Ok(rows.into_iter().map(Rating::from).collect())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
