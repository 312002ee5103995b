use std::sync::Arc;

use crate::{
    config::Config,
    services::{providers::TmdbProvider, Fetcher, ResolutionPolicy, Store},
    storage::FileSlot,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Wires the TMDB provider and the on-disk bookmark file from config
    pub fn from_config(config: &Config) -> Self {
        let provider = TmdbProvider::new(config.tmdb_api_key.clone(), config.tmdb_api_url.clone());
        let slot = FileSlot::new(&config.bookmarks_path);

        tracing::info!(
            credential = config.tmdb_api_key.is_some(),
            bookmarks_path = %slot.path().display(),
            discard_stale = config.discard_stale_responses,
            "Initializing store"
        );

        Self::new(Store::new(
            Fetcher::new(Arc::new(provider)),
            Arc::new(slot),
            config.tmdb_image_base_url.clone(),
            ResolutionPolicy::from_discard_stale(config.discard_stale_responses),
        ))
    }
}
