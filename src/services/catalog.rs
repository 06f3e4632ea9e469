use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::instrument;

use crate::{
    error::AppResult,
    models::{Amenity, AmenityFacet, Facets, PlaceId, Rating, Restaurant},
    services::sources::RestaurantSource,
};

/// Sentinel category meaning "every category"
pub const ALL_CATEGORIES: &str = "All Categories";

/// Immutable snapshot of the restaurant table and the review corpus
#[derive(Debug, Clone)]
pub struct Catalog {
    version: u64,
    restaurants: Vec<Restaurant>,
    ratings: Vec<Rating>,
    /// place id -> index of its first row
    by_place: HashMap<PlaceId, usize>,
}

impl Catalog {
    pub fn new(restaurants: Vec<Restaurant>, ratings: Vec<Rating>, version: u64) -> Self {
        let mut by_place = HashMap::with_capacity(restaurants.len());
        for (idx, restaurant) in restaurants.iter().enumerate() {
            by_place.entry(restaurant.place_id.clone()).or_insert(idx);
        }

        Self {
            version,
            restaurants,
            ratings,
            by_place,
        }
    }

    /// Loads a fresh snapshot from the given source
    #[instrument(skip(source), fields(source = source.name()))]
    pub async fn load(source: &dyn RestaurantSource, version: u64) -> AppResult<Self> {
        let restaurants = source.fetch_restaurants().await?;
        let ratings: Vec<Rating> = source
            .fetch_ratings()
            .await?
            .into_iter()
            .filter(|r| r.rating.is_finite())
            .collect();

        let catalog = Self::new(restaurants, ratings, version);

        let orphaned = catalog
            .ratings
            .iter()
            .filter(|r| !catalog.by_place.contains_key(&r.place_id))
            .count();

        tracing::info!(
            version,
            restaurants = catalog.restaurants.len(),
            unique_places = catalog.by_place.len(),
            ratings = catalog.ratings.len(),
            orphaned_ratings = orphaned,
            "Catalog loaded"
        );

        Ok(catalog)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn restaurant(&self, place_id: &PlaceId) -> Option<&Restaurant> {
        self.by_place.get(place_id).map(|&idx| &self.restaurants[idx])
    }

    pub fn contains(&self, place_id: &PlaceId) -> bool {
        self.by_place.contains_key(place_id)
    }

    /// First restaurant row carrying the given title
    pub fn first_by_title(&self, title: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.title == title)
    }

    /// Unique place ids in catalog order
    pub fn place_ids(&self) -> Vec<PlaceId> {
        let mut seen = HashSet::new();
        self.restaurants
            .iter()
            .filter(|r| seen.insert(&r.place_id))
            .map(|r| r.place_id.clone())
            .collect()
    }

    /// First restaurant per title among the given ids, in the order given
    pub fn unique_by_title<'a>(&'a self, ids: &[PlaceId]) -> Vec<&'a Restaurant> {
        let mut seen_titles = HashSet::new();
        ids.iter()
            .filter_map(|id| self.restaurant(id))
            .filter(|r| seen_titles.insert(r.title.as_str()))
            .collect()
    }

    /// Distinct filter values present in the catalog
    pub fn facets(&self) -> Facets {
        let collect = |f: fn(&Restaurant) -> Option<&String>| -> Vec<String> {
            self.restaurants
                .iter()
                .filter_map(f)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        Facets {
            categories: collect(|r| r.category.as_ref()),
            cities: collect(|r| r.city.as_ref()),
            prices: collect(|r| r.price.as_ref()),
            amenities: Amenity::ALL
                .iter()
                .map(|&amenity| AmenityFacet {
                    amenity,
                    label: amenity.label(),
                })
                .collect(),
        }
    }

    /// Whether a category selection means "everything"
    pub fn selects_all_categories(categories: &[String]) -> bool {
        categories.is_empty() || categories.iter().any(|c| c == ALL_CATEGORIES)
    }

    /// Maps each selected category to its unique titles
    ///
    /// Categories with no restaurants are left out.
    pub fn categories_index(&self, categories: &[String]) -> BTreeMap<String, Vec<String>> {
        let all = Self::selects_all_categories(categories);
        let wanted: HashSet<&str> = categories.iter().map(String::as_str).collect();

        let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for restaurant in &self.restaurants {
            let Some(category) = restaurant.category.as_ref() else {
                continue;
            };
            if !all && !wanted.contains(category.as_str()) {
                continue;
            }
            let titles = index.entry(category.clone()).or_default();
            if !titles.contains(&restaurant.title) {
                titles.push(restaurant.title.clone());
            }
        }
        index
    }
}
