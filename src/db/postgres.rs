use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::AppResult,
    models::{Rating, Restaurant, RestaurantRow, ReviewRow},
    services::sources::RestaurantSource,
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Source reading the `restaurants` and `reviews` tables
#[derive(Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RestaurantSource for PostgresSource {
    async fn fetch_restaurants(&self) -> AppResult<Vec<Restaurant>> {
        let rows = sqlx::query_as::<_, RestaurantRow>(
            r#"
            SELECT placeid, title, categoryname, city, price,
                   CAST(totalscore AS DOUBLE PRECISION) AS totalscore,
                   address,
                   CAST(lat AS DOUBLE PRECISION) AS lat,
                   CAST(lng AS DOUBLE PRECISION) AS lng,
                   url,
                   CAST(imageurls AS TEXT) AS imageurls,
                   delivery, dining_in, group_friendly, kid_friendly, free_parking,
                   beer, alcohol, desserts, wheelchair_accessible, free_wifi,
                   credit_cards, halal_food, vegetarian_options,
                   live_performances, live_music, dog_friendly
            FROM restaurants
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Restaurant::from).collect())
    }

    async fn fetch_ratings(&self) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT reviewerid, placeid,
                   CAST(reviewerrated AS DOUBLE PRECISION) AS reviewerrated
            FROM reviews
            WHERE reviewerrated IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Rating::from).collect())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
