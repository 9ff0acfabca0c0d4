//! Filesystem move/copy/remove utilities.
//!
//! One well-tested implementation of each operation, shared by every
//! caller. A move prefers an atomic rename and falls back to copy plus
//! remove when the rename fails (typically a cross-device link); the
//! source is only removed after the copy fully completed.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use nubedrive_core::error::{AppError, ErrorKind};
use nubedrive_core::result::AppResult;

/// Move a file or directory.
///
/// Attempts `rename` first. If the rename fails and the source still
/// exists, the entry is copied to the destination and the source removed
/// afterwards. The destination's parent directory must already exist.
pub async fn move_entry(from: &Path, to: &Path) -> AppResult<()> {
    if !exists(from).await? {
        return Err(AppError::not_found(format!(
            "Source not found: {}",
            from.display()
        )));
    }

    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "Rename failed, falling back to copy + remove"
            );
            copy_entry(from, to).await?;
            remove_entry(from).await
        }
    }
}

/// Copy a file or directory tree, returning the number of file bytes
/// copied.
///
/// Directories are walked with an explicit worklist; the destination tree
/// is created as the walk proceeds.
pub async fn copy_entry(from: &Path, to: &Path) -> AppResult<u64> {
    let meta = fs::metadata(from).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("Source not found: {}", from.display()))
        } else {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to stat source: {}", from.display()),
                e,
            )
        }
    })?;

    if meta.is_file() {
        let bytes = fs::copy(from, to).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to copy {} -> {}", from.display(), to.display()),
                e,
            )
        })?;
        return Ok(bytes);
    }

    let mut copied = 0u64;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(from.to_path_buf(), to.to_path_buf())];

    while let Some((src_dir, dst_dir)) = pending.pop() {
        fs::create_dir_all(&dst_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", dst_dir.display()),
                e,
            )
        })?;

        let mut dir = fs::read_dir(&src_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read directory: {}", src_dir.display()),
                e,
            )
        })?;

        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let file_type = entry.file_type().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to get entry type", e)
            })?;
            let target = dst_dir.join(entry.file_name());

            if file_type.is_dir() {
                pending.push((entry.path(), target));
            } else {
                copied += fs::copy(entry.path(), &target).await.map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to copy file: {}", entry.path().display()),
                        e,
                    )
                })?;
            }
        }
    }

    debug!(from = %from.display(), to = %to.display(), bytes = copied, "Copied directory tree");
    Ok(copied)
}

/// Remove a file or directory tree.
pub async fn remove_entry(path: &Path) -> AppResult<()> {
    let meta = fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("Path not found: {}", path.display()))
        } else {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to stat path: {}", path.display()),
                e,
            )
        }
    })?;

    let result = if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    result.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to remove: {}", path.display()),
            e,
        )
    })
}

/// Whether a path exists, without following through on other stat errors.
pub async fn exists(path: &Path) -> AppResult<bool> {
    fs::try_exists(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to check existence: {}", path.display()),
            e,
        )
    })
}
