//! Embedded front end and the single-page-app fallback.

use std::borrow::Cow;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use tracing::debug;

use crate::AppState;
use crate::error::PendulumError;

/// Document served for every route the bundle does not contain
pub const ROOT_DOCUMENT: &str = "index.html";

/// Metadata of a bundle entry, available without fetching its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// Opaque content fingerprint, used as the entity tag
    pub etag: String,
}

/// Read-only mapping from logical paths to file contents.
///
/// Keys are `/`-separated and carry no leading slash.
pub trait AssetBundle: Send + Sync {
    /// Look up an entry without reading it.
    fn info(&self, path: &str) -> Option<AssetInfo>;

    /// Fetch the contents of an entry.
    fn get(&self, path: &str) -> Option<Cow<'static, [u8]>>;
}

#[derive(Embed)]
#[folder = "web/dist/"]
struct Dist;

/// The front end compiled into the binary from `web/dist/`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedBundle;

impl AssetBundle for EmbeddedBundle {
    fn info(&self, path: &str) -> Option<AssetInfo> {
        Dist::get(path).map(|file| AssetInfo {
            etag: hex::encode(file.metadata.sha256_hash()),
        })
    }

    fn get(&self, path: &str) -> Option<Cow<'static, [u8]>> {
        Dist::get(path).map(|file| file.data)
    }
}

/// Fallback handler for every route not claimed by the API or `/contents/`.
pub async fn serve_index(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, PendulumError> {
    respond(state.assets.as_ref(), uri.path(), &headers)
}

/// Serve `path` from `bundle`, or the root document when it is not there.
///
/// `path` is the raw request path; it is percent-decoded before the lookup.
pub fn respond(
    bundle: &dyn AssetBundle,
    path: &str,
    headers: &HeaderMap,
) -> Result<Response, PendulumError> {
    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    let key = decoded.trim_start_matches('/');

    if let Some(info) = bundle.info(key) {
        let etag = format!("\"{}\"", info.etag);
        if etag_matches(headers, &etag) {
            return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
        }

        if let Some(data) = bundle.get(key) {
            let mime = mime_guess::from_path(key)
                .first_or_octet_stream()
                .to_string();

            return Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime),
                    (header::ETAG, etag),
                    (header::CACHE_CONTROL, "no-cache".to_string()),
                ],
                data,
            )
                .into_response());
        }
    }

    debug!("No bundled asset for {}, serving {}", path, ROOT_DOCUMENT);

    let Some(document) = bundle.get(ROOT_DOCUMENT) else {
        return Err(PendulumError::NotFound(ROOT_DOCUMENT.to_string()));
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/html")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        document,
    )
        .into_response())
}

fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    value
        .split(',')
        .map(|tag| tag.trim().trim_start_matches("W/"))
        .any(|tag| tag == "*" || tag == etag)
}
