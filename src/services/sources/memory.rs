use crate::{
    error::AppResult,
    models::{Rating, Restaurant},
    services::sources::RestaurantSource,
};

/// Source backed by vectors held in memory, used for seeding and tests
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    restaurants: Vec<Restaurant>,
    ratings: Vec<Rating>,
}

impl InMemorySource {
    pub fn new(restaurants: Vec<Restaurant>, ratings: Vec<Rating>) -> Self {
        Self {
            restaurants,
            ratings,
        }
    }
}

#[async_trait::async_trait]
impl RestaurantSource for InMemorySource {
    async fn fetch_restaurants(&self) -> AppResult<Vec<Restaurant>> {
        Ok(self.restaurants.clone())
    }

    async fn fetch_ratings(&self) -> AppResult<Vec<Rating>> {
        Ok(self.ratings.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
