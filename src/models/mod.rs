use serde::{Deserialize, Serialize};

pub mod view;

pub use view::{
    ErrorSlot, ItemCard, ItemDetail, Notification, NotificationKind, Phase, ViewSnapshot,
};

/// Catalog identifier of a movie or show
pub type ItemId = u64;

/// A movie or show record as received from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub poster_path: Option<String>,
    /// Average rating on a 0-10 scale
    pub vote_average: f64,
    pub overview: String,
    /// ISO-like date, possibly empty when the catalog has none
    pub release_date: String,
}

impl Item {
    /// Year part of the release date, if the date starts with one
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.get(..4).and_then(|y| y.parse().ok())
    }

    /// Full poster URL under the given image base, if the item has a poster
    pub fn poster_url(&self, image_base_url: &str) -> Option<String> {
        self.poster_path.as_ref().map(|path| {
            format!(
                "{}/{}",
                image_base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        })
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw TMDB list entry. Movies carry `title`/`release_date`, shows carry
/// `name`/`first_air_date`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbItem {
    pub id: ItemId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

impl From<TmdbItem> for Item {
    fn from(raw: TmdbItem) -> Self {
        Item {
            id: raw.id,
            title: raw.title.or(raw.name).unwrap_or_default(),
            poster_path: raw.poster_path,
            vote_average: raw.vote_average,
            overview: raw.overview.unwrap_or_default(),
            release_date: raw.release_date.or(raw.first_air_date).unwrap_or_default(),
        }
    }
}

/// Envelope shared by the trending and search endpoints
#[derive(Debug, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<TmdbItem>,
}
