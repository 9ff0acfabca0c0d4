//! Trash bin service.
//!
//! Moves files and folders into the per-user `.trash` directory under an
//! encoded name, lists and decodes the current contents, restores entries
//! to their original location, and permanently deletes them.
//!
//! Lifecycle of a single item:
//!
//! ```text
//! ACTIVE --(trash)--> TRASHED --(restore, no conflict)--> ACTIVE
//! TRASHED --(purge)--> GONE
//! TRASHED --(restore, conflict)--> TRASHED (error reported, nothing moved)
//! ```
//!
//! There is no trash-of-a-trash: the `.trash` directory itself can never be
//! the source of a trash operation.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use nubedrive_core::{AppError, AppResult, UserId};
use nubedrive_core::error::ErrorKind;

use crate::codec;
use crate::fsops;
use crate::layout::{TRASH_DIR_NAME, UserLayout, validate_segment};

/// A decoded trash directory entry, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct TrashEntry {
    /// The literal on-disk name in the trash directory.
    pub trash_name: String,
    /// Original leaf name of the trashed item.
    pub display_name: String,
    /// Original containing folder, `""` for the root.
    pub original_folder: String,
    /// When the item was trashed.
    pub deleted_at: DateTime<Utc>,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Size in bytes (0 for directories).
    pub size_bytes: u64,
}

/// Manages the per-user trash lifecycle.
#[derive(Debug, Clone)]
pub struct TrashBin {
    /// Path resolution for the per-user namespace.
    layout: UserLayout,
}

impl TrashBin {
    /// Create a trash bin over the given layout.
    pub fn new(layout: UserLayout) -> Self {
        Self { layout }
    }

    /// The layout this bin resolves paths with.
    pub fn layout(&self) -> &UserLayout {
        &self.layout
    }

    /// Move a file or folder into the user's trash.
    ///
    /// `folder` is the item's containing folder relative to the user's
    /// root (`""` for the root); `name` is the leaf name. Returns the
    /// encoded name the entry now lives under in `.trash`.
    pub async fn trash(&self, user: UserId, folder: &str, name: &str) -> AppResult<String> {
        if name == TRASH_DIR_NAME && folder.is_empty() {
            return Err(AppError::validation("The trash directory cannot be trashed"));
        }
        if folder == TRASH_DIR_NAME || folder.starts_with(".trash/") {
            return Err(AppError::validation(
                "Items already in the trash cannot be trashed again",
            ));
        }

        let source = self.layout.resolve(user, folder, name)?;
        if !fsops::exists(&source).await? {
            return Err(AppError::not_found(format!(
                "No such file or folder: {}",
                display_location(folder, name)
            )));
        }

        let trash_dir = self.layout.trash_dir(user);
        fs::create_dir_all(&trash_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create trash directory: {}", trash_dir.display()),
                e,
            )
        })?;

        let trash_name = codec::encode(Utc::now().timestamp_millis(), folder, name)?;
        fsops::move_entry(&source, &trash_dir.join(&trash_name)).await?;

        info!(user = %user, %trash_name, "Moved entry to trash");
        Ok(trash_name)
    }

    /// List the user's trash, newest deletions first.
    ///
    /// A missing trash directory is an empty trash. Entries whose names do
    /// not decode are skipped with a warning rather than failing the whole
    /// listing.
    pub async fn list(&self, user: UserId) -> AppResult<Vec<TrashEntry>> {
        let trash_dir = self.layout.trash_dir(user);
        if !fsops::exists(&trash_dir).await? {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&trash_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to list trash: {}", trash_dir.display()),
                e,
            )
        })?;

        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read trash entry", e)
        })? {
            let trash_name = entry.file_name().to_string_lossy().to_string();

            let decoded = match codec::decode(&trash_name) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(user = %user, %trash_name, error = %e, "Skipping undecodable trash entry");
                    continue;
                }
            };

            let Some(deleted_at) = DateTime::<Utc>::from_timestamp_millis(decoded.deleted_at_ms)
            else {
                warn!(user = %user, %trash_name, "Skipping trash entry with out-of-range timestamp");
                continue;
            };

            let meta = entry.metadata().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to stat trash entry", e)
            })?;

            entries.push(TrashEntry {
                trash_name,
                display_name: decoded.display_name,
                original_folder: decoded.original_folder,
                deleted_at,
                is_directory: meta.is_dir(),
                size_bytes: if meta.is_dir() { 0 } else { meta.len() },
            });
        }

        entries.sort_by(|a, b| {
            b.deleted_at
                .cmp(&a.deleted_at)
                .then_with(|| a.trash_name.cmp(&b.trash_name))
        });

        Ok(entries)
    }

    /// Restore a trash entry to its original location.
    ///
    /// Missing intermediate folders are recreated. If the destination is
    /// already occupied the restore fails with a conflict and neither the
    /// trash entry nor the occupant is touched. Returns the destination
    /// path on success.
    pub async fn restore(&self, user: UserId, trash_name: &str) -> AppResult<PathBuf> {
        validate_segment(trash_name)?;
        let decoded = codec::decode(trash_name)?;

        let trash_path = self.layout.trash_dir(user).join(trash_name);
        if !fsops::exists(&trash_path).await? {
            return Err(AppError::not_found(format!(
                "Not found in trash: {trash_name}"
            )));
        }

        let destination = self
            .layout
            .resolve(user, &decoded.original_folder, &decoded.display_name)?;

        // Check-then-move is not atomic; a concurrent writer can still win
        // the destination between these two calls.
        if fsops::exists(&destination).await? {
            return Err(AppError::conflict(format!(
                "An item named '{}' already exists at '{}'",
                decoded.display_name,
                if decoded.original_folder.is_empty() {
                    "/"
                } else {
                    &decoded.original_folder
                }
            )));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to recreate destination folder: {}", parent.display()),
                    e,
                )
            })?;
        }

        fsops::move_entry(&trash_path, &destination).await?;

        info!(user = %user, %trash_name, destination = %destination.display(), "Restored entry from trash");
        Ok(destination)
    }

    /// Permanently delete a trash entry by its literal stored name.
    ///
    /// The name is not decoded; directories are removed recursively. This
    /// transition is terminal.
    pub async fn purge(&self, user: UserId, trash_name: &str) -> AppResult<()> {
        validate_segment(trash_name)?;

        let trash_path = self.layout.trash_dir(user).join(trash_name);
        if !fsops::exists(&trash_path).await? {
            return Err(AppError::not_found(format!(
                "Not found in trash: {trash_name}"
            )));
        }

        fsops::remove_entry(&trash_path).await?;

        info!(user = %user, %trash_name, "Permanently deleted trash entry");
        Ok(())
    }
}

/// Human-readable `folder/name` location for error messages.
fn display_location(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(root: &std::path::Path) -> TrashBin {
        TrashBin::new(UserLayout::new(root))
    }

    async fn write_user_file(bin: &TrashBin, user: UserId, folder: &str, name: &str, data: &[u8]) {
        let path = bin.layout().resolve(user, folder, name).unwrap();
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, data).await.unwrap();
    }

    #[tokio::test]
    async fn test_trash_then_list_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        write_user_file(&bin, user, "Projects/Q1", "report.pdf", b"pdf bytes").await;

        let trash_name = bin.trash(user, "Projects/Q1", "report.pdf").await.unwrap();
        assert!(trash_name.ends_with("_Projects_Q1_report.pdf"));

        // Source gone, trash entry present.
        let source = bin.layout().resolve(user, "Projects/Q1", "report.pdf").unwrap();
        assert!(!fsops::exists(&source).await.unwrap());

        let entries = bin.list(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "report.pdf");
        assert_eq!(entries[0].original_folder, "Projects/Q1");
        assert!(!entries[0].is_directory);
        assert_eq!(entries[0].size_bytes, 9);
    }

    #[tokio::test]
    async fn test_trash_missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        let err = bin.trash(user, "", "ghost.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_trash_rejects_trash_itself() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        let err = bin.trash(user, "", ".trash").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = bin.trash(user, ".trash", "123_docs_a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_restore_recreates_missing_folders() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        write_user_file(&bin, user, "docs/tax", "w2.pdf", b"tax").await;
        let trash_name = bin.trash(user, "docs/tax", "w2.pdf").await.unwrap();

        // The original folder tree disappears while the file sits in trash.
        fs::remove_dir_all(bin.layout().user_dir(user).join("docs"))
            .await
            .unwrap();

        let restored = bin.restore(user, &trash_name).await.unwrap();
        assert_eq!(
            restored,
            bin.layout().resolve(user, "docs/tax", "w2.pdf").unwrap()
        );
        assert_eq!(fs::read(&restored).await.unwrap(), b"tax");
        assert!(bin.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_conflict_leaves_both_sides_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        write_user_file(&bin, user, "", "notes.txt", b"old").await;
        let trash_name = bin.trash(user, "", "notes.txt").await.unwrap();

        // A new file takes the original spot before the restore.
        write_user_file(&bin, user, "", "notes.txt", b"new").await;

        let err = bin.restore(user, &trash_name).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        // Occupant intact, trash entry still listed.
        let occupant = bin.layout().resolve(user, "", "notes.txt").unwrap();
        assert_eq!(fs::read(&occupant).await.unwrap(), b"new");
        let entries = bin.list(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].trash_name, trash_name);
    }

    #[tokio::test]
    async fn test_restore_unknown_entry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        let err = bin.restore(user, "123__ghost.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_restore_malformed_name_is_validation() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        let err = bin.restore(user, "not-a-trash-name").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        // A crafted name must not resolve outside the trash directory.
        let err = bin.restore(user, "../escape").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_trash_and_restore_folder() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        write_user_file(&bin, user, "archive/2023", "a.txt", b"a").await;
        write_user_file(&bin, user, "archive/2023/img", "b.png", b"bb").await;

        let trash_name = bin.trash(user, "archive", "2023").await.unwrap();

        let entries = bin.list(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_directory);
        assert_eq!(entries[0].display_name, "2023");
        assert_eq!(entries[0].original_folder, "archive");

        let restored = bin.restore(user, &trash_name).await.unwrap();
        assert_eq!(fs::read(restored.join("a.txt")).await.unwrap(), b"a");
        assert_eq!(fs::read(restored.join("img/b.png")).await.unwrap(), b"bb");
    }

    #[tokio::test]
    async fn test_purge_directory_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        write_user_file(&bin, user, "old/stuff", "x.txt", b"x").await;
        let trash_name = bin.trash(user, "old", "stuff").await.unwrap();

        bin.purge(user, &trash_name).await.unwrap();

        assert!(bin.list(user).await.unwrap().is_empty());
        let err = bin.purge(user, &trash_name).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_purge_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        for name in ["..", "a/b", "a\\b", ""] {
            let err = bin.purge(user, name).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{name:?}");
        }
    }

    #[tokio::test]
    async fn test_list_missing_trash_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        assert!(bin.list(UserId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_undecodable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        write_user_file(&bin, user, "", "keep.txt", b"k").await;
        bin.trash(user, "", "keep.txt").await.unwrap();

        // A folder trashed by older tooling under its bare, unencoded name.
        let stray = bin.layout().trash_dir(user).join("Holiday Photos");
        fs::create_dir_all(&stray).await.unwrap();

        let entries = bin.list(user).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "keep.txt");
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin(dir.path());
        let user = UserId::new();

        let trash_dir = bin.layout().trash_dir(user);
        fs::create_dir_all(&trash_dir).await.unwrap();
        fs::write(trash_dir.join("1000__old.txt"), b"o").await.unwrap();
        fs::write(trash_dir.join("2000__new.txt"), b"n").await.unwrap();

        let entries = bin.list(user).await.unwrap();
        assert_eq!(entries[0].display_name, "new.txt");
        assert_eq!(entries[1].display_name, "old.txt");
    }
}
