// ============================================================================
// Raw table rows
// ============================================================================
//
// Column names follow the `restaurants` and `reviews` tables as exported by the
// scraping pipeline (all lowercase, no separators).

use serde::{Deserialize, Deserializer};

use super::{parse_image_urls, AmenityFlags, PlaceId, Rating, Restaurant};

/// One row of the `restaurants` table
#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct RestaurantRow {
    pub placeid: String,
    pub title: String,
    #[serde(default)]
    pub categoryname: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub totalscore: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub imageurls: Option<String>,
    #[serde(default)]
    pub delivery: Option<bool>,
    #[serde(default)]
    pub dining_in: Option<bool>,
    #[serde(default)]
    pub group_friendly: Option<bool>,
    #[serde(default)]
    pub kid_friendly: Option<bool>,
    #[serde(default)]
    pub free_parking: Option<bool>,
    #[serde(default)]
    pub beer: Option<bool>,
    #[serde(default)]
    pub alcohol: Option<bool>,
    #[serde(default)]
    pub desserts: Option<bool>,
    #[serde(default)]
    pub wheelchair_accessible: Option<bool>,
    #[serde(default)]
    pub free_wifi: Option<bool>,
    #[serde(default)]
    pub credit_cards: Option<bool>,
    #[serde(default)]
    pub halal_food: Option<bool>,
    #[serde(default)]
    pub vegetarian_options: Option<bool>,
    #[serde(default)]
    pub live_performances: Option<bool>,
    #[serde(default)]
    pub live_music: Option<bool>,
    #[serde(default)]
    pub dog_friendly: Option<bool>,
}

/// One row of the `reviews` table
#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct ReviewRow {
    pub reviewerid: String,
    pub placeid: String,
    pub reviewerrated: f64,
}

/// Dumps store image urls either as a JSON array or as a stringified list
fn string_or_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => Some(text),
        Some(Raw::List(list)) => serde_json::to_string(&list).ok(),
        None => None,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        let image_urls = row
            .imageurls
            .as_deref()
            .map(parse_image_urls)
            .unwrap_or_default();

        Restaurant {
            place_id: PlaceId(row.placeid),
            title: row.title,
            category: non_blank(row.categoryname),
            city: non_blank(row.city),
            price: non_blank(row.price),
            total_score: row.totalscore.filter(|s| s.is_finite()),
            address: row.address,
            lat: row.lat,
            lng: row.lng,
            url: row.url,
            image_urls,
            amenities: AmenityFlags {
                delivery: row.delivery,
                dining_in: row.dining_in,
                group_friendly: row.group_friendly,
                kid_friendly: row.kid_friendly,
                free_parking: row.free_parking,
                beer: row.beer,
                alcohol: row.alcohol,
                desserts: row.desserts,
                wheelchair_accessible: row.wheelchair_accessible,
                free_wifi: row.free_wifi,
                credit_cards: row.credit_cards,
                halal_food: row.halal_food,
                vegetarian_options: row.vegetarian_options,
                live_performances: row.live_performances,
                live_music: row.live_music,
                dog_friendly: row.dog_friendly,
            },
        }
    }
}

impl From<ReviewRow> for Rating {
    fn from(row: ReviewRow) -> Self {
        Rating {
            reviewer_id: row.reviewerid,
            place_id: PlaceId(row.placeid),
            rating: row.reviewerrated,
        }
    }
}
