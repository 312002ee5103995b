use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Outermost, so the trace span can read the ID
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/view", get(handlers::get_view))
        .route("/trending", post(handlers::show_trending))
        .route("/search", put(handlers::search))
        // Bookmarks-only filter
        .route("/filter", put(handlers::set_filter))
        .route("/filter/toggle", post(handlers::toggle_filter))
        // Bookmarks
        .route("/bookmarks", get(handlers::get_bookmarks))
        .route("/bookmarks/:id/toggle", post(handlers::toggle_bookmark))
        // Detail view
        .route("/items/:id/select", post(handlers::select_item))
        .route("/selection", delete(handlers::close_detail))
        .route("/notifications", get(handlers::take_notifications))
}
