use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier of a restaurant (the `placeid` column of the catalog)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub String);

impl PlaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Boolean attributes a restaurant can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    Delivery,
    DiningIn,
    GroupFriendly,
    KidFriendly,
    FreeParking,
    Beer,
    Alcohol,
    Desserts,
    WheelchairAccessible,
    FreeWifi,
    CreditCards,
    HalalFood,
    VegetarianOptions,
    LivePerformances,
    LiveMusic,
    DogFriendly,
}

impl Amenity {
    pub const ALL: [Amenity; 16] = [
        Amenity::Delivery,
        Amenity::DiningIn,
        Amenity::GroupFriendly,
        Amenity::KidFriendly,
        Amenity::FreeParking,
        Amenity::Beer,
        Amenity::Alcohol,
        Amenity::Desserts,
        Amenity::WheelchairAccessible,
        Amenity::FreeWifi,
        Amenity::CreditCards,
        Amenity::HalalFood,
        Amenity::VegetarianOptions,
        Amenity::LivePerformances,
        Amenity::LiveMusic,
        Amenity::DogFriendly,
    ];

    /// Human readable label shown next to the filter checkbox
    pub fn label(&self) -> &'static str {
        match self {
            Amenity::Delivery => "Delivery",
            Amenity::DiningIn => "Dine-in",
            Amenity::GroupFriendly => "Good for groups",
            Amenity::KidFriendly => "Good for kids",
            Amenity::FreeParking => "Free parking",
            Amenity::Beer => "Beer",
            Amenity::Alcohol => "Alcohol",
            Amenity::Desserts => "Desserts",
            Amenity::WheelchairAccessible => "Wheelchair accessible entrance",
            Amenity::FreeWifi => "Free Wi-Fi",
            Amenity::CreditCards => "Credit cards",
            Amenity::HalalFood => "Halal food",
            Amenity::VegetarianOptions => "Vegetarian options",
            Amenity::LivePerformances => "Live performances",
            Amenity::LiveMusic => "Live music",
            Amenity::DogFriendly => "Dogs allowed",
        }
    }
}

/// Per-restaurant amenity flags; `None` means the attribute is unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmenityFlags {
    pub delivery: Option<bool>,
    pub dining_in: Option<bool>,
    pub group_friendly: Option<bool>,
    pub kid_friendly: Option<bool>,
    pub free_parking: Option<bool>,
    pub beer: Option<bool>,
    pub alcohol: Option<bool>,
    pub desserts: Option<bool>,
    pub wheelchair_accessible: Option<bool>,
    pub free_wifi: Option<bool>,
    pub credit_cards: Option<bool>,
    pub halal_food: Option<bool>,
    pub vegetarian_options: Option<bool>,
    pub live_performances: Option<bool>,
    pub live_music: Option<bool>,
    pub dog_friendly: Option<bool>,
}

impl AmenityFlags {
    pub fn get(&self, amenity: Amenity) -> Option<bool> {
        match amenity {
            Amenity::Delivery => self.delivery,
            Amenity::DiningIn => self.dining_in,
            Amenity::GroupFriendly => self.group_friendly,
            Amenity::KidFriendly => self.kid_friendly,
            Amenity::FreeParking => self.free_parking,
            Amenity::Beer => self.beer,
            Amenity::Alcohol => self.alcohol,
            Amenity::Desserts => self.desserts,
            Amenity::WheelchairAccessible => self.wheelchair_accessible,
            Amenity::FreeWifi => self.free_wifi,
            Amenity::CreditCards => self.credit_cards,
            Amenity::HalalFood => self.halal_food,
            Amenity::VegetarianOptions => self.vegetarian_options,
            Amenity::LivePerformances => self.live_performances,
            Amenity::LiveMusic => self.live_music,
            Amenity::DogFriendly => self.dog_friendly,
        }
    }

    /// True only when the flag is known and set
    pub fn has(&self, amenity: Amenity) -> bool {
        self.get(amenity) == Some(true)
    }
}

/// A restaurant in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub place_id: PlaceId,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub total_score: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub amenities: AmenityFlags,
}

/// Display row returned by listing and filtering endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSummary {
    pub place_id: PlaceId,
    pub title: String,
    pub category: Option<String>,
    pub city: Option<String>,
    pub price: Option<String>,
    pub total_score: Option<f64>,
    pub address: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Restaurant> for RestaurantSummary {
    fn from(restaurant: &Restaurant) -> Self {
        Self {
            place_id: restaurant.place_id.clone(),
            title: restaurant.title.clone(),
            category: restaurant.category.clone(),
            city: restaurant.city.clone(),
            price: restaurant.price.clone(),
            total_score: restaurant.total_score,
            address: restaurant.address.clone(),
            url: restaurant.url.clone(),
            image_url: restaurant.image_urls.first().cloned(),
        }
    }
}

/// Parses the raw image url column.
///
/// Accepts a JSON array or a single-quoted list literal (`['a', 'b']`).
/// Anything else yields no images.
pub fn parse_image_urls(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(urls) = serde_json::from_str::<Vec<String>>(raw) {
        return urls;
    }

    match raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        Some(inner) => quoted_items(inner),
        None => Vec::new(),
    }
}

/// Collects the quoted strings of a list literal body; commas inside quotes are kept
fn quoted_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            continue;
        }
        let item: String = chars.by_ref().take_while(|&next| next != c).collect();
        let item = item.trim();
        if !item.is_empty() {
            items.push(item.to_string());
        }
    }

    items
}
