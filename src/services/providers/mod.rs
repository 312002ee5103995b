//! Catalog data provider abstraction
//!
//! The rest of the app only sees `Item`s. A provider owns the transport and
//! wire format of one remote catalog.

use crate::{error::AppResult, models::Item};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for remote movie catalogs
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Whether an access credential is configured at all
    ///
    /// Checked before any request is made; a provider without one must not
    /// be asked to fetch.
    fn has_credential(&self) -> bool;

    /// Items trending this week, page 1
    async fn trending(&self) -> AppResult<Vec<Item>>;

    /// Items matching a free-text query, page 1
    async fn search(&self, query: &str) -> AppResult<Vec<Item>>;
}
