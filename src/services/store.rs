use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{
        view::TRANSPORT_ERROR_MESSAGE, ErrorSlot, Item, ItemCard, ItemDetail, ItemId,
        Notification, Phase, ViewSnapshot,
    },
    services::{
        display::displayed_items,
        fetcher::{FetchOutcome, FetchRequest, Fetcher},
    },
    storage::{BookmarkAction, BookmarkSet, BookmarkSlot},
};

/// Pending notifications kept for a client that has not drained them yet
pub const MAX_PENDING_NOTIFICATIONS: usize = 8;

/// Which fetch resolution gets to update the view when several overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// Every resolution is applied; whichever lands last wins
    #[default]
    LastResolved,
    /// Only the most recently issued request is applied
    LatestIssued,
}

impl ResolutionPolicy {
    pub fn from_discard_stale(discard_stale: bool) -> Self {
        if discard_stale {
            ResolutionPolicy::LatestIssued
        } else {
            ResolutionPolicy::LastResolved
        }
    }
}

/// In-memory view state, reset on restart
#[derive(Debug, Default)]
pub struct ViewState {
    pub items: Vec<Item>,
    pub phase: Phase,
    pub error: ErrorSlot,
    pub search_text: String,
    pub selected: Option<Item>,
    pub bookmarks_only: bool,
    notifications: VecDeque<Notification>,
}

impl ViewState {
    /// Queues a notification, dropping the oldest past the limit
    fn push_notification(&mut self, notification: Notification) {
        if self.notifications.len() == MAX_PENDING_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(notification);
    }
}

/// Result of a bookmark toggle
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToggleOutcome {
    pub id: ItemId,
    pub action: BookmarkAction,
    pub bookmarked: bool,
    pub notification: Notification,
}

struct StoreInner {
    view: ViewState,
    bookmarks: BookmarkSet,
    latest_issued: u64,
}

/// The page's state container
///
/// View state and bookmarks live behind one lock. A fetch is begun under the
/// lock, awaited without it, then applied under it again.
pub struct Store {
    fetcher: Fetcher,
    slot: Arc<dyn BookmarkSlot>,
    image_base_url: String,
    policy: ResolutionPolicy,
    inner: RwLock<StoreInner>,
}

impl Store {
    /// Creates the store, loading bookmarks from the slot once
    pub fn new(
        fetcher: Fetcher,
        slot: Arc<dyn BookmarkSlot>,
        image_base_url: String,
        policy: ResolutionPolicy,
    ) -> Self {
        let bookmarks = BookmarkSet::load(slot.as_ref());

        Self {
            fetcher,
            slot,
            image_base_url,
            policy,
            inner: RwLock::new(StoreInner {
                view: ViewState::default(),
                bookmarks,
                latest_issued: 0,
            }),
        }
    }

    /// Initial page load
    pub async fn mount(&self) {
        let seq = self.begin_fetch(|_| {}).await;
        self.complete_fetch(seq, FetchRequest::Trending).await;
    }

    /// Home action: clears search text and the bookmarks-only filter, then
    /// loads trending items
    pub async fn show_trending(&self) {
        let seq = self
            .begin_fetch(|view| {
                view.search_text.clear();
                view.bookmarks_only = false;
            })
            .await;
        self.complete_fetch(seq, FetchRequest::Trending).await;
    }

    /// Search-box keystroke. Fetches right away; blank text loads trending.
    pub async fn set_search_text(&self, text: &str) {
        let seq = self
            .begin_fetch(|view| view.search_text = text.to_string())
            .await;
        self.complete_fetch(seq, FetchRequest::from_query(text)).await;
    }

    async fn begin_fetch(&self, prepare: impl FnOnce(&mut ViewState)) -> u64 {
        let mut inner = self.inner.write().await;
        prepare(&mut inner.view);
        inner.latest_issued += 1;
        inner.view.phase = Phase::Loading;
        inner.view.error = ErrorSlot::None;
        inner.latest_issued
    }

    async fn complete_fetch(&self, seq: u64, request: FetchRequest) {
        let outcome = self.fetcher.fetch(&request).await;
        self.apply_outcome(seq, outcome).await;
    }

    async fn apply_outcome(&self, seq: u64, outcome: FetchOutcome) {
        let mut inner = self.inner.write().await;

        if self.policy == ResolutionPolicy::LatestIssued && seq != inner.latest_issued {
            tracing::debug!(
                seq,
                latest = inner.latest_issued,
                "Discarding stale fetch resolution"
            );
            return;
        }

        let view = &mut inner.view;
        match outcome {
            FetchOutcome::Items(items) => {
                tracing::info!(seq, count = items.len(), "Fetch applied");
                view.items = items;
                view.phase = Phase::Success;
                view.error = ErrorSlot::None;
            }
            FetchOutcome::Empty => {
                tracing::info!(seq, "Fetch returned no results");
                view.items.clear();
                view.phase = Phase::Empty;
                view.error = ErrorSlot::NoResults;
            }
            FetchOutcome::Failed(detail) => {
                view.items.clear();
                view.phase = Phase::Error;
                view.error = ErrorSlot::Transport { detail };
                view.push_notification(Notification::failure(TRANSPORT_ERROR_MESSAGE));
            }
            FetchOutcome::MissingCredential => {
                view.items.clear();
                view.phase = Phase::Error;
                view.error = ErrorSlot::MissingCredential;
            }
        }
    }

    /// Adds or removes a bookmark and rewrites the slot. If the write fails
    /// the toggle is undone so memory and slot stay equal.
    pub async fn toggle_bookmark(&self, id: ItemId) -> AppResult<ToggleOutcome> {
        let mut inner = self.inner.write().await;

        let action = inner.bookmarks.toggle(id);
        // Blocking write; the slot matches memory before the lock is released
        if let Err(e) = inner.bookmarks.persist(self.slot.as_ref()) {
            inner.bookmarks.toggle(id);
            tracing::error!(error = %e, item_id = id, "Failed to persist bookmarks");
            return Err(e);
        }

        let title = inner
            .view
            .items
            .iter()
            .chain(inner.view.selected.iter())
            .find(|item| item.id == id)
            .map(|item| item.title.clone());

        let message = match (action, title) {
            (BookmarkAction::Added, Some(title)) => format!("Added \"{}\" to bookmarks", title),
            (BookmarkAction::Removed, Some(title)) => {
                format!("Removed \"{}\" from bookmarks", title)
            }
            (BookmarkAction::Added, None) => "Added to bookmarks".to_string(),
            (BookmarkAction::Removed, None) => "Removed from bookmarks".to_string(),
        };

        tracing::info!(item_id = id, action = ?action, total = inner.bookmarks.len(), "Bookmark toggled");

        Ok(ToggleOutcome {
            id,
            action,
            bookmarked: action == BookmarkAction::Added,
            notification: Notification::success(message),
        })
    }

    pub async fn set_bookmarks_only(&self, enabled: bool) {
        self.inner.write().await.view.bookmarks_only = enabled;
    }

    /// Flips the bookmarks-only filter and returns the new value
    pub async fn toggle_bookmarks_only(&self) -> bool {
        let mut inner = self.inner.write().await;
        inner.view.bookmarks_only = !inner.view.bookmarks_only;
        inner.view.bookmarks_only
    }

    /// Opens the detail view for an item in the current list
    pub async fn select_item(&self, id: ItemId) -> AppResult<ItemDetail> {
        let mut inner = self.inner.write().await;

        let item = inner
            .view
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Item {} is not in the current list", id)))?;

        let detail = ItemDetail::new(&item, &self.image_base_url, inner.bookmarks.contains(id));
        inner.view.selected = Some(item);
        Ok(detail)
    }

    pub async fn close_detail(&self) {
        self.inner.write().await.view.selected = None;
    }

    pub async fn bookmarked_ids(&self) -> Vec<ItemId> {
        self.inner.read().await.bookmarks.ids()
    }

    /// Returns pending notifications and clears them
    pub async fn take_notifications(&self) -> Vec<Notification> {
        self.inner.write().await.view.notifications.drain(..).collect()
    }

    /// Renders the current state
    pub async fn snapshot(&self) -> ViewSnapshot {
        let inner = self.inner.read().await;
        let view = &inner.view;
        let bookmarks = &inner.bookmarks;

        let items = displayed_items(&view.items, bookmarks, view.bookmarks_only)
            .into_iter()
            .map(|item| ItemCard::new(item, &self.image_base_url, bookmarks.contains(item.id)))
            .collect();

        let selected = view.selected.as_ref().map(|item| {
            ItemDetail::new(item, &self.image_base_url, bookmarks.contains(item.id))
        });

        ViewSnapshot {
            phase: view.phase,
            loading: view.phase == Phase::Loading,
            error: view.error.clone(),
            error_message: view.error.message(),
            search_text: view.search_text.clone(),
            bookmarks_only: view.bookmarks_only,
            items,
            fetched_count: view.items.len(),
            bookmark_count: bookmarks.len(),
            selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{CatalogProvider, MockCatalogProvider};
    use crate::storage::MemorySlot;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn movie(id: u64, title: &str) -> Item {
        Item {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/{}.jpg", id)),
            vote_average: 7.5,
            overview: format!("About {}", title),
            release_date: "2023-10-20".to_string(),
        }
    }

    fn trending_list() -> Vec<Item> {
        vec![movie(1, "A"), movie(2, "B"), movie(3, "C")]
    }

    fn store_with(provider: impl CatalogProvider + 'static, slot: MemorySlot) -> Store {
        Store::new(
            Fetcher::new(Arc::new(provider)),
            Arc::new(slot),
            "https://img".to_string(),
            ResolutionPolicy::LastResolved,
        )
    }

    fn trending_provider() -> MockCatalogProvider {
        let mut provider = MockCatalogProvider::new();
        provider.expect_has_credential().return_const(true);
        provider.expect_trending().returning(|| Ok(trending_list()));
        provider
    }

    fn ids(snapshot: &ViewSnapshot) -> Vec<ItemId> {
        snapshot.items.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let store = store_with(trending_provider(), MemorySlot::new());
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.error, ErrorSlot::None);
    }

    #[tokio::test]
    async fn test_mount_loads_trending() {
        let store = store_with(trending_provider(), MemorySlot::new());
        store.mount().await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Success);
        assert!(!snapshot.loading);
        assert_eq!(ids(&snapshot), vec![1, 2, 3]);
        assert_eq!(snapshot.items[0].poster_url, Some("https://img/1.jpg".to_string()));
        assert_eq!(snapshot.items[0].release_year, Some(2023));
    }

    #[tokio::test]
    async fn test_missing_credential_issues_no_fetch() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_has_credential().return_const(false);
        provider.expect_trending().never();
        provider.expect_search().never();

        let store = store_with(provider, MemorySlot::new());
        store.mount().await;
        store.set_search_text("dune").await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Error);
        assert_eq!(snapshot.error, ErrorSlot::MissingCredential);
        assert!(snapshot.error_message.unwrap().contains("TMDB_API_KEY"));
        assert!(store.take_notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_search_matches_trending() {
        let mut provider = trending_provider();
        provider.expect_search().never();

        let store = store_with(provider, MemorySlot::new());
        store.mount().await;
        let trending = store.snapshot().await;

        store.set_search_text("   ").await;
        let blank = store.snapshot().await;

        assert_eq!(blank.items, trending.items);
        assert_eq!(blank.search_text, "   ");
    }

    #[tokio::test]
    async fn test_zero_results_is_distinct_from_failure() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_has_credential().return_const(true);
        provider
            .expect_search()
            .withf(|q| q == "qwzx")
            .returning(|_| Ok(vec![]));
        provider
            .expect_search()
            .withf(|q| q == "boom")
            .returning(|_| Err(AppError::ExternalApi("TMDB API returned status 503".to_string())));

        let store = store_with(provider, MemorySlot::new());

        store.set_search_text("qwzx").await;
        let empty = store.snapshot().await;
        assert_eq!(empty.phase, Phase::Empty);
        assert_eq!(empty.error, ErrorSlot::NoResults);
        assert!(empty.items.is_empty());
        assert!(store.take_notifications().await.is_empty());

        store.set_search_text("boom").await;
        let failed = store.snapshot().await;
        assert_eq!(failed.phase, Phase::Error);
        assert!(matches!(failed.error, ErrorSlot::Transport { .. }));
        assert_ne!(failed.error_message, empty.error_message);

        let notifications = store.take_notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, crate::models::NotificationKind::Failure);
        assert!(store.take_notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_clears_previous_list() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_has_credential().return_const(true);
        provider.expect_trending().returning(|| Ok(trending_list()));
        provider
            .expect_search()
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));

        let store = store_with(provider, MemorySlot::new());
        store.mount().await;
        store.set_search_text("x").await;

        let snapshot = store.snapshot().await;
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.fetched_count, 0);
    }

    #[tokio::test]
    async fn test_trending_resets_search_and_filter() {
        let mut provider = trending_provider();
        provider
            .expect_search()
            .returning(|_| Ok(vec![movie(9, "Z")]));

        let store = store_with(provider, MemorySlot::new());
        store.set_search_text("zed").await;
        store.set_bookmarks_only(true).await;

        store.show_trending().await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.search_text, "");
        assert!(!snapshot.bookmarks_only);
        assert_eq!(ids(&snapshot), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_toggle_notification_uses_previous_membership() {
        let slot = MemorySlot::new();
        let store = store_with(trending_provider(), slot.clone());
        store.mount().await;

        let added = store.toggle_bookmark(2).await.unwrap();
        assert_eq!(added.action, BookmarkAction::Added);
        assert!(added.bookmarked);
        assert_eq!(added.notification.message, "Added \"B\" to bookmarks");
        assert_eq!(slot.contents(), Some("[2]".to_string()));

        let removed = store.toggle_bookmark(2).await.unwrap();
        assert_eq!(removed.action, BookmarkAction::Removed);
        assert_eq!(removed.notification.message, "Removed \"B\" from bookmarks");
        assert_eq!(slot.contents(), Some("[]".to_string()));
    }

    #[tokio::test]
    async fn test_toggle_unknown_item_still_persists() {
        let slot = MemorySlot::new();
        let store = store_with(trending_provider(), slot.clone());

        let outcome = store.toggle_bookmark(777).await.unwrap();
        assert_eq!(outcome.notification.message, "Added to bookmarks");
        assert_eq!(store.bookmarked_ids().await, vec![777]);
        assert_eq!(slot.contents(), Some("[777]".to_string()));
    }

    #[tokio::test]
    async fn test_bookmarks_loaded_from_slot() {
        let store = store_with(trending_provider(), MemorySlot::with_contents("[3,1]"));
        store.mount().await;
        store.set_bookmarks_only(true).await;

        let snapshot = store.snapshot().await;
        assert_eq!(ids(&snapshot), vec![1, 3]);
        assert_eq!(snapshot.fetched_count, 3);
        assert_eq!(snapshot.bookmark_count, 2);
        assert!(snapshot.items.iter().all(|c| c.bookmarked));
    }

    #[tokio::test]
    async fn test_toggle_bookmarks_only_flips() {
        let store = store_with(trending_provider(), MemorySlot::new());
        assert!(store.toggle_bookmarks_only().await);
        assert!(!store.toggle_bookmarks_only().await);
    }

    struct FailingSlot;

    impl BookmarkSlot for FailingSlot {
        fn read(&self) -> AppResult<Option<String>> {
            Ok(Some("[5]".to_string()))
        }

        fn write(&self, _contents: &str) -> AppResult<()> {
            Err(AppError::Storage(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[tokio::test]
    async fn test_failed_persist_rolls_back() {
        let store = Store::new(
            Fetcher::new(Arc::new(trending_provider())),
            Arc::new(FailingSlot),
            "https://img".to_string(),
            ResolutionPolicy::LastResolved,
        );

        assert!(store.toggle_bookmark(5).await.is_err());
        assert!(store.toggle_bookmark(6).await.is_err());
        assert_eq!(store.bookmarked_ids().await, vec![5]);
    }

    #[tokio::test]
    async fn test_select_and_close_detail() {
        let store = store_with(trending_provider(), MemorySlot::with_contents("[3]"));
        store.mount().await;

        let detail = store.select_item(3).await.unwrap();
        assert_eq!(detail.item.title, "C");
        assert_eq!(detail.item.overview, "About C");
        assert!(detail.bookmarked);
        assert_eq!(store.snapshot().await.selected, Some(detail));

        store.close_detail().await;
        assert_eq!(store.snapshot().await.selected, None);
    }

    #[tokio::test]
    async fn test_select_unknown_item_is_not_found() {
        let store = store_with(trending_provider(), MemorySlot::new());
        store.mount().await;
        assert!(matches!(
            store.select_item(404).await,
            Err(AppError::NotFound(_))
        ));
    }

    /// Search provider whose responses are released by the test
    struct GatedProvider {
        gates: Mutex<HashMap<String, oneshot::Receiver<Vec<Item>>>>,
        issued: Mutex<Vec<String>>,
    }

    impl GatedProvider {
        fn new() -> (Self, HashMap<&'static str, oneshot::Sender<Vec<Item>>>) {
            let mut gates = HashMap::new();
            let mut senders = HashMap::new();
            for query in ["dun", "dune"] {
                let (tx, rx) = oneshot::channel();
                gates.insert(query.to_string(), rx);
                senders.insert(query, tx);
            }
            let provider = Self {
                gates: Mutex::new(gates),
                issued: Mutex::new(Vec::new()),
            };
            (provider, senders)
        }
    }

    #[async_trait::async_trait]
    impl CatalogProvider for GatedProvider {
        fn has_credential(&self) -> bool {
            true
        }

        async fn trending(&self) -> AppResult<Vec<Item>> {
            Ok(vec![])
        }

        async fn search(&self, query: &str) -> AppResult<Vec<Item>> {
            self.issued.lock().unwrap().push(query.to_string());
            let gate = self.gates.lock().unwrap().remove(query);
            match gate {
                Some(rx) => rx.await.map_err(|e| AppError::Internal(e.to_string())),
                None => Err(AppError::Internal(format!("no gate for {}", query))),
            }
        }
    }

    /// Issues "dun" then "dune", resolves "dune" first and "dun" second
    async fn overlapping_searches(policy: ResolutionPolicy) -> ViewSnapshot {
        let (provider, mut senders) = GatedProvider::new();
        let provider = Arc::new(provider);
        let store = Arc::new(Store::new(
            Fetcher::new(provider.clone()),
            Arc::new(MemorySlot::new()),
            "https://img".to_string(),
            policy,
        ));

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.set_search_text("dun").await }
        });
        while provider.issued.lock().unwrap().len() < 1 {
            tokio::task::yield_now().await;
        }

        let second = tokio::spawn({
            let store = store.clone();
            async move { store.set_search_text("dune").await }
        });
        while provider.issued.lock().unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }

        senders
            .remove("dune")
            .unwrap()
            .send(vec![movie(20, "Dune")])
            .unwrap();
        second.await.unwrap();

        senders
            .remove("dun")
            .unwrap()
            .send(vec![movie(10, "Dunkirk")])
            .unwrap();
        first.await.unwrap();

        store.snapshot().await
    }

    #[tokio::test]
    async fn test_overlapping_searches_last_resolved_wins() {
        let snapshot = overlapping_searches(ResolutionPolicy::LastResolved).await;
        assert_eq!(snapshot.search_text, "dune");
        assert_eq!(ids(&snapshot), vec![10]);
    }

    #[tokio::test]
    async fn test_overlapping_searches_latest_issued_wins() {
        let snapshot = overlapping_searches(ResolutionPolicy::LatestIssued).await;
        assert_eq!(snapshot.search_text, "dune");
        assert_eq!(ids(&snapshot), vec![20]);
        assert_eq!(snapshot.phase, Phase::Success);
    }

    #[tokio::test]
    async fn test_pending_notifications_are_capped() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_has_credential().return_const(true);
        provider
            .expect_search()
            .returning(|_| Err(AppError::ExternalApi("TMDB API returned status 503".to_string())));

        let store = store_with(provider, MemorySlot::new());
        for n in 0..MAX_PENDING_NOTIFICATIONS + 5 {
            store.set_search_text(&format!("offline {}", n)).await;
        }

        let notifications = store.take_notifications().await;
        assert_eq!(notifications.len(), MAX_PENDING_NOTIFICATIONS);
        assert!(notifications
            .iter()
            .all(|n| n.kind == crate::models::NotificationKind::Failure));
        assert!(store.take_notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_outstanding_request_shows_loading() {
        let (provider, mut senders) = GatedProvider::new();
        let provider = Arc::new(provider);
        let store = Arc::new(Store::new(
            Fetcher::new(provider.clone()),
            Arc::new(MemorySlot::new()),
            "https://img".to_string(),
            ResolutionPolicy::LastResolved,
        ));

        // Trending resolves empty, leaving the no-results error in place
        store.mount().await;
        assert_eq!(store.snapshot().await.error, ErrorSlot::NoResults);

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.set_search_text("dune").await }
        });
        while provider.issued.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        let in_flight = store.snapshot().await;
        assert_eq!(in_flight.phase, Phase::Loading);
        assert!(in_flight.loading);
        assert_eq!(in_flight.error, ErrorSlot::None);
        assert_eq!(in_flight.error_message, None);
        assert_eq!(in_flight.search_text, "dune");

        senders
            .remove("dune")
            .unwrap()
            .send(vec![movie(20, "Dune")])
            .unwrap();
        pending.await.unwrap();

        let done = store.snapshot().await;
        assert_eq!(done.phase, Phase::Success);
        assert!(!done.loading);
        assert_eq!(ids(&done), vec![20]);
    }
}
