pub mod catalog;
pub mod filter;
pub mod model_store;
pub mod rating_collector;
pub mod recommendations;
pub mod sources;
pub mod svd;

pub use catalog::Catalog;
pub use model_store::ModelStore;
pub use recommendations::{RecommendationEngine, RefreshRequest};
pub use svd::{Svd, SvdParams};
