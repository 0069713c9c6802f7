use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::core::config::Config;

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' points outside allowed root directory")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Parent directory components are not allowed in '{path}'")]
    ParentTraversal { path: PathBuf },

    #[error("Cannot canonicalize path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

/// Validates that an existing path is within the configured security boundaries.
///
/// This function performs the following checks:
/// 1. Resolves relative paths against the configured root (if any)
/// 2. Canonicalizes the path to resolve `.`, `..`, and symlinks
/// 3. If a root path is configured, ensures the canonical path is within that root
/// 4. Handles symlinks according to the configured policy
///
/// # Examples
///
/// ```rust,ignore
/// let config = Config::from_env();
/// let safe_path = validate_path("specs/requirements.md", &config)?;
/// ```
pub fn validate_path(input_path: &str, config: &Config) -> Result<PathBuf, PathSecurityError> {
    let path = resolve_input(input_path, config);

    // If no root path is configured, only do basic canonicalization
    let Some(ref root) = config.security.root_path else {
        return canonicalize_path(&path);
    };

    let canonical_root = canonical_root(root)?;

    if !path.exists() {
        return Err(PathSecurityError::PathNotFound { path });
    }

    check_symlink(&path, &canonical_root, config.security.allow_symlinks)?;

    let canonical_path = path
        .canonicalize()
        .map_err(|e| PathSecurityError::CannotCanonicalize {
            path: path.clone(),
            error: e,
        })?;

    if !is_within_root(&canonical_path, &canonical_root) {
        return Err(PathSecurityError::OutsideRootDirectory {
            path: canonical_path,
            root: canonical_root,
        });
    }

    Ok(canonical_path)
}

/// Upper bound on chained dangling links followed by [`validate_write_path`].
const MAX_LINK_HOPS: usize = 8;

/// Validates a path that is about to be written and may not exist yet.
///
/// Existing paths go through [`validate_path`]. For new paths, `..`
/// components are rejected outright and the deepest existing ancestor must
/// lie within the root; the returned path is that canonical ancestor joined
/// with the not-yet-existing tail.
///
/// A dangling symlink counts as existing. It is rejected when symlinks are
/// disallowed, otherwise its target must resolve inside the root and the
/// returned path is that target.
pub fn validate_write_path(
    input_path: &str,
    config: &Config,
) -> Result<PathBuf, PathSecurityError> {
    let path = resolve_input(input_path, config);

    if path.exists() {
        return validate_path(&path.to_string_lossy(), config);
    }

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(PathSecurityError::ParentTraversal { path });
    }

    let Some(ref root) = config.security.root_path else {
        return Ok(path);
    };
    let canonical_root = canonical_root(root)?;

    let allow_symlinks = config.security.allow_symlinks;

    let (ancestor, tail) = split_existing_ancestor(&path);
    if ancestor.is_symlink() && !ancestor.exists() {
        if !allow_symlinks {
            return Err(PathSecurityError::SymlinkOutsideRoot { path: ancestor });
        }
        let target = resolve_dangling_link(&ancestor, &canonical_root)?;
        return Ok(target.join(tail));
    }
    check_symlink(&ancestor, &canonical_root, allow_symlinks)?;

    let canonical_ancestor =
        ancestor
            .canonicalize()
            .map_err(|e| PathSecurityError::CannotCanonicalize {
                path: ancestor.clone(),
                error: e,
            })?;

    if !is_within_root(&canonical_ancestor, &canonical_root) {
        return Err(PathSecurityError::OutsideRootDirectory {
            path: canonical_ancestor,
            root: canonical_root,
        });
    }

    Ok(canonical_ancestor.join(tail))
}

/// Relative inputs are anchored at the configured root when there is one.
fn resolve_input(input_path: &str, config: &Config) -> PathBuf {
    let path = Path::new(input_path);
    match &config.security.root_path {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf, PathSecurityError> {
    root.canonicalize().map_err(|e| PathSecurityError::IoError {
        path: root.to_path_buf(),
        error: e,
    })
}

/// Symlinks must resolve inside the root, and are rejected entirely when
/// the policy disallows them.
fn check_symlink(
    path: &Path,
    canonical_root: &Path,
    allow: bool,
) -> Result<(), PathSecurityError> {
    if !path.is_symlink() {
        return Ok(());
    }

    if !allow {
        return Err(PathSecurityError::SymlinkOutsideRoot {
            path: path.to_path_buf(),
        });
    }

    let canonical_target =
        path.canonicalize()
            .map_err(|_| PathSecurityError::SymlinkOutsideRoot {
                path: path.to_path_buf(),
            })?;

    if !is_within_root(&canonical_target, canonical_root) {
        return Err(PathSecurityError::SymlinkOutsideRoot {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Follow a chain of dangling links to the path a write would create.
///
/// The final target must not exist yet and must land inside the root.
/// Targets containing `..` are rejected since they cannot be resolved
/// without touching the filesystem.
fn resolve_dangling_link(
    link: &Path,
    canonical_root: &Path,
) -> Result<PathBuf, PathSecurityError> {
    let escaped = || PathSecurityError::SymlinkOutsideRoot {
        path: link.to_path_buf(),
    };

    let mut current = link.to_path_buf();
    for _ in 0..MAX_LINK_HOPS {
        let target = fs::read_link(&current).map_err(|_| escaped())?;
        let target = match current.parent() {
            Some(parent) if target.is_relative() => parent.join(target),
            _ => target,
        };

        if target.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(escaped());
        }

        if target.is_symlink() {
            current = target;
            continue;
        }

        let (ancestor, tail) = split_existing_ancestor(&target);
        if ancestor.is_symlink() && !ancestor.exists() {
            return Err(escaped());
        }
        let resolved = ancestor.canonicalize().map_err(|_| escaped())?.join(tail);
        if !is_within_root(&resolved, canonical_root) {
            return Err(escaped());
        }
        return Ok(resolved);
    }

    Err(escaped())
}

/// Split into the deepest existing ancestor and the remaining relative tail.
///
/// Existence is checked without following links, so a dangling symlink stops
/// the walk.
fn split_existing_ancestor(path: &Path) -> (PathBuf, PathBuf) {
    let mut ancestor = path.to_path_buf();
    let mut tail = Vec::new();

    while fs::symlink_metadata(&ancestor).is_err() {
        match (ancestor.parent(), ancestor.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                ancestor = parent.to_path_buf();
            }
            _ => break,
        }
    }

    if ancestor.as_os_str().is_empty() {
        ancestor = PathBuf::from(".");
    }

    let tail = tail.into_iter().rev().collect::<PathBuf>();
    (ancestor, tail)
}

/// Checks if a path is within (or equal to) a root directory
fn is_within_root(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Canonicalizes a path, mapping a missing path to `PathNotFound`
fn canonicalize_path(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::CannotCanonicalize {
                path: path.to_path_buf(),
                error: e,
            }
        }
    })
}
