//! Raw contents of the root directory under `/contents/`.
//!
//! Client-side routes put virtual segments in front of file names, so a
//! request such as `/contents/guide/intro/overview.md` may really mean
//! `overview.md` one or two directories up. A miss on the direct path is
//! retried on those demoted paths before giving up.

use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
};
use tokio::fs;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use crate::AppState;
use crate::error::PendulumError;
use crate::paths::{logical_path, resolve_and_verify_path};

/// File served when a contents request names a directory
const DIRECTORY_INDEX: &str = "index.html";

/// Candidate paths for `logical`, in the order they are tried.
///
/// The first is the path itself. Then the file name moves up one directory
/// (`dirname(dirname(p))/basename(p)`), then up two. Duplicates are dropped,
/// so a file at the top level has a single candidate.
pub fn candidates(logical: &str) -> Vec<String> {
    let normalized = logical_path(logical);
    let mut segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

    let Some(file_name) = segments.pop() else {
        return vec![normalized];
    };

    let mut result = vec![normalized.clone()];
    for drop in 1..=2 {
        let keep = segments.len().saturating_sub(drop);
        let mut demoted = segments[..keep].join("/");
        if !demoted.is_empty() {
            demoted.push('/');
        }
        demoted.push_str(file_name);

        if !result.contains(&demoted) {
            result.push(demoted);
        }
    }

    result
}

/// Resolve `logical` to a file under `root`.
///
/// The first candidate that exists wins. A directory resolves to its
/// `index.html`, and is a miss without one; demotion is not retried.
pub async fn resolve_contents(root: &FsPath, logical: &str) -> Result<PathBuf, PendulumError> {
    for candidate in candidates(logical) {
        let path = resolve_and_verify_path(root, &candidate)?;
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!("Contents candidate {} missed: {}", candidate, err);
                continue;
            }
        };

        if candidate != logical_path(logical) {
            debug!("Contents {} served from demoted path {}", logical, candidate);
        }

        if !metadata.is_dir() {
            return Ok(path);
        }

        let index = resolve_and_verify_path(root, &format!("{}/{}", candidate, DIRECTORY_INDEX))?;
        return match fs::metadata(&index).await {
            Ok(metadata) if metadata.is_file() => Ok(index),
            _ => Err(PendulumError::NotFound(logical_path(logical))),
        };
    }

    Err(PendulumError::NotFound(logical_path(logical)))
}

/// GET /contents/{*path} - Serve a file from the root directory
///
/// Content type, byte ranges and conditional requests are handled by the
/// static file service once the path is resolved.
pub async fn serve_contents(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, PendulumError> {
    let file = resolve_contents(&state.root_dir, &path).await?;

    debug!("Serving contents file: {}", file.display());

    let Ok(response) = ServeFile::new(file).oneshot(request).await;

    Ok(response.into_response())
}

/// GET /contents/ - The root directory is never served as a file
pub async fn no_contents() -> PendulumError {
    PendulumError::NotFound("/".to_string())
}
