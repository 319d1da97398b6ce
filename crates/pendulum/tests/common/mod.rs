//! Test utilities and common setup.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use pendulum::{AppState, Config, routes};
use tempfile::TempDir;
use tower::ServiceExt;

/// Create a test application serving a fresh temporary root.
///
/// The directory lives as long as the returned `TempDir`.
pub fn test_app() -> (Router, TempDir) {
    test_app_with_config(Config::default())
}

pub fn test_app_with_config(config: Config) -> (Router, TempDir) {
    let root = TempDir::new().unwrap();
    let state = AppState::with_config(root.path().canonicalize().unwrap(), config);
    (routes::app(state), root)
}

/// Send a request with an optional body through the router.
pub async fn send(app: &Router, method: Method, uri: &str, body: Body) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .method(method)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}
