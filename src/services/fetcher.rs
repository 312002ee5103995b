use std::sync::Arc;

use crate::{models::Item, services::providers::CatalogProvider};

/// What to ask the catalog for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Trending,
    Search(String),
}

impl FetchRequest {
    /// Maps search-box text to a request; blank text means trending
    pub fn from_query(text: &str) -> Self {
        if text.trim().is_empty() {
            FetchRequest::Trending
        } else {
            FetchRequest::Search(text.to_string())
        }
    }
}

/// How a single fetch resolved
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Non-empty list in catalog order
    Items(Vec<Item>),
    Empty,
    /// Transport error or non-success status
    Failed(String),
    MissingCredential,
}

/// Issues exactly one catalog read per call. No retries, no timeout.
#[derive(Clone)]
pub struct Fetcher {
    provider: Arc<dyn CatalogProvider>,
}

impl Fetcher {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self { provider }
    }

    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        if !self.provider.has_credential() {
            tracing::warn!("No API key configured, skipping fetch");
            return FetchOutcome::MissingCredential;
        }

        let result = match request {
            FetchRequest::Trending => self.provider.trending().await,
            FetchRequest::Search(query) => self.provider.search(query).await,
        };

        match result {
            Ok(items) if items.is_empty() => FetchOutcome::Empty,
            Ok(items) => FetchOutcome::Items(items),
            Err(e) => {
                tracing::error!(error = %e, request = ?request, "Catalog fetch failed");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }
}
