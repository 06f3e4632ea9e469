/// Restaurant data source abstraction
///
/// The catalog and review corpus can live in PostgreSQL, in JSON dumps on disk,
/// or in memory. Each source returns the full tables; the catalog snapshot is
/// built on top of whatever the source hands back.
use crate::{
    error::AppResult,
    models::{Rating, Restaurant},
};

pub mod file;
pub mod memory;

pub use file::FileSource;
pub use memory::InMemorySource;

/// Trait for restaurant data backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RestaurantSource: Send + Sync {
    /// Fetch every restaurant row
    async fn fetch_restaurants(&self) -> AppResult<Vec<Restaurant>>;

    /// Fetch every review as `(reviewer, place, rating)`
    async fn fetch_ratings(&self) -> AppResult<Vec<Rating>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}
