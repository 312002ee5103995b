use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{ItemDetail, ItemId, Notification, ViewSnapshot},
    services::ToggleOutcome,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub bookmarks_only: bool,
}

#[derive(Debug, Serialize)]
pub struct BookmarksResponse {
    pub ids: Vec<ItemId>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Current rendered state
pub async fn get_view(State(state): State<AppState>) -> Json<ViewSnapshot> {
    Json(state.store.snapshot().await)
}

/// Home action: reset search and filter, load trending
pub async fn show_trending(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<ViewSnapshot> {
    tracing::info!(request_id = %request_id, "Loading trending");
    state.store.show_trending().await;
    Json(state.store.snapshot().await)
}

/// Search-box change
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<SearchRequest>,
) -> Json<ViewSnapshot> {
    tracing::info!(request_id = %request_id, query = %request.query, "Search text changed");
    state.store.set_search_text(&request.query).await;
    Json(state.store.snapshot().await)
}

/// Set the bookmarks-only filter
pub async fn set_filter(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Json<ViewSnapshot> {
    state.store.set_bookmarks_only(request.bookmarks_only).await;
    Json(state.store.snapshot().await)
}

/// Flip the bookmarks-only filter
pub async fn toggle_filter(State(state): State<AppState>) -> Json<ViewSnapshot> {
    state.store.toggle_bookmarks_only().await;
    Json(state.store.snapshot().await)
}

/// All bookmarked IDs
pub async fn get_bookmarks(State(state): State<AppState>) -> Json<BookmarksResponse> {
    Json(BookmarksResponse {
        ids: state.store.bookmarked_ids().await,
    })
}

/// Add or remove one bookmark
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<ItemId>,
) -> AppResult<Json<ToggleOutcome>> {
    let outcome = state.store.toggle_bookmark(id).await?;

    tracing::info!(
        request_id = %request_id,
        item_id = id,
        action = ?outcome.action,
        "Bookmark toggled"
    );

    Ok(Json(outcome))
}

/// Open the detail view for an item in the current list
pub async fn select_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> AppResult<Json<ItemDetail>> {
    let detail = state.store.select_item(id).await?;
    Ok(Json(detail))
}

/// Close the detail view
pub async fn close_detail(State(state): State<AppState>) -> StatusCode {
    state.store.close_detail().await;
    StatusCode::NO_CONTENT
}

/// Pending transient notifications, cleared once read
pub async fn take_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.store.take_notifications().await)
}
