pub mod filter;
pub mod rating;
pub mod recommendation;
pub mod restaurant;
pub mod rows;
pub mod session;

pub use filter::{AmenityFacet, Facets, FilterCriteria, FilterOutcome};
pub use rating::{Rating, Stars};
pub use recommendation::{Recommendation, RecommendationRequest, DEFAULT_RECOMMENDATION_COUNT};
pub use restaurant::{parse_image_urls, Amenity, AmenityFlags, PlaceId, Restaurant, RestaurantSummary};
pub use rows::{RestaurantRow, ReviewRow};
pub use session::{Progress, RatingSession, SessionFlow};
