use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::{assets, contents, handlers};

/// File management API
pub fn api_routes(max_upload_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_upload_size).unwrap_or(usize::MAX);

    Router::new()
        .route("/api/list/", get(handlers::list_root))
        .route("/api/list/{*path}", get(handlers::list_dir))
        .route("/api/read/", get(handlers::read_root))
        .route("/api/read/{*path}", get(handlers::read_file))
        .route("/api/store/", post(handlers::store_root))
        .route("/api/store/{*path}", post(handlers::store_file))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Complete application: API, raw contents, and the front end for
/// everything else
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api_routes(state.config.max_upload_size))
        .route("/contents/", get(contents::no_contents))
        .route("/contents/{*path}", get(contents::serve_contents))
        .fallback(assets::serve_index)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
