//! Path containment helpers.
//!
//! Every filesystem access in the crate goes through [`resolve_and_verify_path`]
//! so that no request can reach outside the root directory, whether through
//! `..` segments or through symlinks.

use std::path::{Component, Path, PathBuf};

use tracing::{error, warn};

use crate::error::PendulumError;

/// Join a request path onto `root`, rejecting anything that is not a plain
/// relative path.
///
/// The path is built component by component without touching the filesystem:
/// `..`, absolute components and NUL bytes are refused. A leading `/` is
/// stripped, and an empty path or `.` resolves to `root` itself.
pub fn resolve_path(root: &Path, relative: &str) -> Result<PathBuf, PendulumError> {
    let relative = relative.trim_start_matches('/');

    if relative.is_empty() || relative == "." {
        return Ok(root.to_path_buf());
    }

    if relative.contains('\0') {
        warn!("Path contains null byte: {:?}", relative);
        return Err(PendulumError::InvalidPath(relative.replace('\0', "")));
    }

    let mut result = root.to_path_buf();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(name) => result.push(name),
            Component::CurDir => continue,
            Component::ParentDir => {
                warn!("Path traversal attempt detected: {:?}", relative);
                return Err(PendulumError::InvalidPath(relative.to_string()));
            }
            Component::RootDir | Component::Prefix(_) => {
                warn!("Absolute path component in relative path: {:?}", relative);
                return Err(PendulumError::InvalidPath(relative.to_string()));
            }
        }
    }

    if !result.starts_with(root) {
        error!("Path resolution left the root: {:?}", result);
        return Err(PendulumError::InvalidPath(relative.to_string()));
    }

    Ok(result)
}

/// Resolve a request path and verify that what it names on disk stays
/// within `root` once symlinks are followed.
///
/// Existing paths come back canonicalized. For a path that does not exist
/// yet the nearest existing ancestor is checked instead, and the built path
/// is returned unchanged. Symlinks count as existing even when their target
/// is missing; such dangling links are refused, since writing through one
/// would create its target wherever it points.
pub fn resolve_and_verify_path(root: &Path, relative: &str) -> Result<PathBuf, PendulumError> {
    let built_path = resolve_path(root, relative)?;
    let canonical_root = root.canonicalize().map_err(PendulumError::Io)?;

    let mut current = Some(built_path.as_path());
    while let Some(entry) = current {
        let metadata = match entry.symlink_metadata() {
            Ok(metadata) => metadata,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
            {
                current = entry.parent();
                continue;
            }
            Err(e) => return Err(PendulumError::Io(e)),
        };

        let canonical = match entry.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) if metadata.file_type().is_symlink() => {
                warn!("Dangling symlink in path: {:?}", entry);
                return Err(PendulumError::InvalidPath(relative.to_string()));
            }
            Err(e) => return Err(PendulumError::Io(e)),
        };

        if !canonical.starts_with(&canonical_root) {
            warn!(
                "Symlink escape attempt: {:?} resolved outside {:?}",
                entry, canonical_root
            );
            return Err(PendulumError::InvalidPath(relative.to_string()));
        }

        if entry == built_path {
            return Ok(canonical);
        }
        break;
    }

    Ok(built_path)
}

/// Normalize a request path to its `/`-separated form relative to the root.
pub fn logical_path(relative: &str) -> String {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}
