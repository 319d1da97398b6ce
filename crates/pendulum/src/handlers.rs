use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use crate::AppState;
use crate::error::PendulumError;
use crate::paths::{logical_path, resolve_and_verify_path};

/// Directory entry in a listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the root, `/`-separated
    pub path: String,
    pub is_dir: bool,
    /// Size in bytes, 0 for directories
    pub size: u64,
    /// Modification time in Unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,
}

/// Response for successful operations
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/list/ - List the root directory
pub async fn list_root(state: State<AppState>) -> Result<Json<Vec<FileEntry>>, PendulumError> {
    list_dir(state, Path(String::new())).await
}

/// GET /api/list/{*path} - List one directory
pub async fn list_dir(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<Vec<FileEntry>>, PendulumError> {
    let logical = logical_path(&path);
    let dir = resolve_and_verify_path(&state.root_dir, &path)?;

    let metadata = fs::metadata(&dir)
        .await
        .map_err(|e| PendulumError::from_io(e, &logical))?;
    if !metadata.is_dir() {
        return Err(PendulumError::NotADirectory(logical));
    }

    debug!("Listing directory: {}", dir.display());

    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(&dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        // Follows symlinks; a dangling link is skipped
        let Ok(metadata) = fs::metadata(entry.path()).await else {
            continue;
        };

        let is_dir = metadata.is_dir();
        if is_dir && state.config.is_hidden_dir(&name) {
            continue;
        }

        let path = if logical.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", logical, name)
        };

        entries.push(FileEntry {
            name,
            path,
            is_dir,
            size: if is_dir { 0 } else { metadata.len() },
            modified: metadata.modified().ok().and_then(|t| {
                t.duration_since(std::time::UNIX_EPOCH)
                    .ok()
                    .map(|d| d.as_secs())
            }),
        });
    }

    // Sort: directories first, then alphabetically
    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    Ok(Json(entries))
}

/// GET /api/read/ - The root is a directory, so this always fails
pub async fn read_root(state: State<AppState>) -> Result<Response, PendulumError> {
    read_file(state, Path(String::new())).await
}

/// GET /api/read/{*path} - Get file content
///
/// Streams the raw bytes with a content type guessed from the extension.
pub async fn read_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, PendulumError> {
    let logical = logical_path(&path);
    let file_path = resolve_and_verify_path(&state.root_dir, &path)?;

    let metadata = fs::metadata(&file_path)
        .await
        .map_err(|e| PendulumError::from_io(e, &logical))?;
    if metadata.is_dir() {
        return Err(PendulumError::IsADirectory(logical));
    }

    debug!("Streaming file: {}", file_path.display());

    let file = fs::File::open(&file_path)
        .await
        .map_err(|e| PendulumError::from_io(e, &logical))?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mime = mime_guess::from_path(&file_path)
        .first_or_octet_stream()
        .to_string();

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    // Sanitize filename for Content-Disposition header
    let safe_filename = file_name.replace(['"', '\r', '\n'], "'");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", safe_filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// POST /api/store/ - The root itself cannot be overwritten
pub async fn store_root(
    state: State<AppState>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, PendulumError> {
    store_file(state, Path(String::new()), body).await
}

/// POST /api/store/{*path} - Write the request body to a file
///
/// Missing parent directories are created. Concurrent stores to the same
/// file are not coordinated; the last write wins.
pub async fn store_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, PendulumError> {
    let logical = logical_path(&path);
    if logical.is_empty() {
        return Err(PendulumError::InvalidPath("cannot store to the root directory".to_string()));
    }

    let dest_path = resolve_and_verify_path(&state.root_dir, &path)?;

    if let Ok(metadata) = fs::metadata(&dest_path).await {
        if metadata.is_dir() {
            return Err(PendulumError::IsADirectory(logical));
        }
    }

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            error!("Failed to create directory {}: {}", parent.display(), e);
            PendulumError::Io(e)
        })?;
    }

    // The parent exists now; check it once more in case a symlinked
    // directory was created concurrently
    let dest_path = resolve_and_verify_path(&state.root_dir, &path)?;

    info!(
        "Writing file: {} ({} bytes)",
        dest_path.display(),
        body.len()
    );

    fs::write(&dest_path, &body).await.map_err(|e| {
        error!("Failed to write file {}: {}", dest_path.display(), e);
        PendulumError::Io(e)
    })?;

    Ok(Json(SuccessResponse {
        success: true,
        message: format!("Written: {} ({} bytes)", logical, body.len()),
        path: Some(logical),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn state_for(root: PathBuf) -> State<AppState> {
        State(AppState::new(root))
    }

    #[tokio::test]
    async fn test_list_orders_directories_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("b.txt"), "bb").unwrap();
        std::fs::write(root.join("A.md"), "a").unwrap();
        std::fs::create_dir(root.join("zeta")).unwrap();
        std::fs::create_dir(root.join(".git")).unwrap();

        let Json(entries) = list_root(state_for(root.to_path_buf())).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["zeta", "A.md", "b.txt"]);
        assert!(entries[0].is_dir);
        assert_eq!(entries[0].size, 0);
        assert_eq!(entries[2].size, 2);
        assert_eq!(entries[2].path, "b.txt");
    }

    #[tokio::test]
    async fn test_list_nested_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("notes/daily")).unwrap();
        std::fs::write(root.join("notes/todo.txt"), "x").unwrap();

        let Json(entries) = list_dir(
            state_for(root.to_path_buf()),
            Path("notes".to_string()),
        )
        .await
        .unwrap();

        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["notes/daily", "notes/todo.txt"]);
    }

    #[tokio::test]
    async fn test_list_errors() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("file.txt"), "x").unwrap();

        let result = list_dir(state_for(root.to_path_buf()), Path("missing".to_string())).await;
        assert!(matches!(result, Err(PendulumError::NotFound(_))));

        let result = list_dir(state_for(root.to_path_buf()), Path("file.txt".to_string())).await;
        assert!(matches!(result, Err(PendulumError::NotADirectory(_))));

        let result = list_dir(state_for(root.to_path_buf()), Path("../".to_string())).await;
        assert!(matches!(result, Err(PendulumError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_read_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("dir")).unwrap();

        let result = read_file(
            state_for(temp_dir.path().to_path_buf()),
            Path("dir".to_string()),
        )
        .await;
        assert!(matches!(result, Err(PendulumError::IsADirectory(_))));

        let result = read_root(state_for(temp_dir.path().to_path_buf())).await;
        assert!(matches!(result, Err(PendulumError::IsADirectory(_))));
    }

    #[tokio::test]
    async fn test_store_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let Json(response) = store_file(
            state_for(root.to_path_buf()),
            Path("a/b/c.txt".to_string()),
            Bytes::from_static(b"hello"),
        )
        .await
        .unwrap();

        assert!(response.success);
        assert_eq!(response.path.as_deref(), Some("a/b/c.txt"));
        assert_eq!(std::fs::read(root.join("a/b/c.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("f.txt"), "old contents").unwrap();

        store_file(
            state_for(root.to_path_buf()),
            Path("f.txt".to_string()),
            Bytes::from_static(b"new"),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(root.join("f.txt")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_store_rejects_root_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir(root.join("dir")).unwrap();

        let result = store_root(state_for(root.to_path_buf()), Bytes::new()).await;
        assert!(matches!(result, Err(PendulumError::InvalidPath(_))));

        let result = store_file(
            state_for(root.to_path_buf()),
            Path("dir".to_string()),
            Bytes::new(),
        )
        .await;
        assert!(matches!(result, Err(PendulumError::IsADirectory(_))));

        let result = store_file(
            state_for(root.to_path_buf()),
            Path("../escape.txt".to_string()),
            Bytes::new(),
        )
        .await;
        assert!(matches!(result, Err(PendulumError::InvalidPath(_))));
        assert!(!root.parent().unwrap().join("escape.txt").exists());
    }
}
