//! The Movie Database (TMDB) v3 provider
//!
//! Both endpoints take the API key as an `api_key` query parameter and answer
//! with `{ "results": [...] }`. Any non-2xx status is a failure; the error
//! body is logged but never parsed.

use crate::{
    error::{AppError, AppResult},
    models::{Item, TmdbPage},
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;

const TRENDING_PATH: &str = "/trending/movie/week";
const SEARCH_PATH: &str = "/search/movie";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Performs one GET against `path` and converts the result list
    async fn get_results(&self, path: &str, params: &[(&str, &str)]) -> AppResult<Vec<Item>> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingCredential)?;
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", api_key)])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, path = %path, "TMDB request failed");
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}",
                status
            )));
        }

        let page: TmdbPage = response.json().await?;
        Ok(page.results.into_iter().map(Item::from).collect())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn trending(&self) -> AppResult<Vec<Item>> {
        let items = self.get_results(TRENDING_PATH, &[]).await?;

        tracing::info!(results = items.len(), provider = "tmdb", "Trending fetch completed");

        Ok(items)
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Item>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let items = self
            .get_results(SEARCH_PATH, &[("query", query), ("page", "1")])
            .await?;

        tracing::info!(
            query = %query,
            results = items.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(items)
    }
}
