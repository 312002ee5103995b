use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Item, ItemId};

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "TMDB API key is missing. Set TMDB_API_KEY in the environment or a .env file and restart.";
pub const TRANSPORT_ERROR_MESSAGE: &str = "Failed to fetch movies. Please try again later.";
pub const NO_RESULTS_MESSAGE: &str = "No movies found.";

/// Where the main view is in its request cycle
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Empty,
    Error,
}

/// The error slot of the main view
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorSlot {
    #[default]
    None,
    /// No API key configured; fixing it requires a restart
    MissingCredential,
    /// Non-success status or network failure
    Transport { detail: String },
    /// The catalog answered with an empty list
    NoResults,
}

impl ErrorSlot {
    /// User-facing text for the slot, `None` when nothing should be shown
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ErrorSlot::None => None,
            ErrorSlot::MissingCredential => Some(MISSING_CREDENTIAL_MESSAGE),
            ErrorSlot::Transport { .. } => Some(TRANSPORT_ERROR_MESSAGE),
            ErrorSlot::NoResults => Some(NO_RESULTS_MESSAGE),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failure,
}

/// Transient toast shown once by the client
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Failure,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

/// One card in the results grid
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemCard {
    pub id: ItemId,
    pub title: String,
    pub poster_url: Option<String>,
    pub rating: f64,
    pub release_year: Option<i32>,
    pub bookmarked: bool,
}

impl ItemCard {
    pub fn new(item: &Item, image_base_url: &str, bookmarked: bool) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            poster_url: item.poster_url(image_base_url),
            rating: item.vote_average,
            release_year: item.release_year(),
            bookmarked,
        }
    }
}

/// Everything the detail overlay shows. Built only from list data; the
/// catalog's cast and trailer endpoints are not consulted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub poster_url: Option<String>,
    pub release_year: Option<i32>,
    pub bookmarked: bool,
}

impl ItemDetail {
    pub fn new(item: &Item, image_base_url: &str, bookmarked: bool) -> Self {
        Self {
            item: item.clone(),
            poster_url: item.poster_url(image_base_url),
            release_year: item.release_year(),
            bookmarked,
        }
    }
}

/// Rendered state of the whole page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViewSnapshot {
    pub phase: Phase,
    pub loading: bool,
    pub error: ErrorSlot,
    pub error_message: Option<&'static str>,
    pub search_text: String,
    pub bookmarks_only: bool,
    pub items: Vec<ItemCard>,
    pub fetched_count: usize,
    pub bookmark_count: usize,
    pub selected: Option<ItemDetail>,
}
