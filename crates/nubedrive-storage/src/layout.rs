//! Per-user directory layout.
//!
//! Every user owns one subtree `<upload_root>/<user-uuid>/`, with a hidden
//! `.trash` holding area directly beneath it. The upload root is injected
//! at construction from [`StorageConfig`]; nothing here consults ambient
//! global state.
//!
//! [`StorageConfig`]: nubedrive_core::config::storage::StorageConfig

use std::path::PathBuf;

use nubedrive_core::{AppError, AppResult, UserId};

/// Name of the hidden per-user trash directory. Fixed by the on-disk
/// convention.
pub const TRASH_DIR_NAME: &str = ".trash";

/// Resolves user-relative locations to absolute filesystem paths.
#[derive(Debug, Clone)]
pub struct UserLayout {
    /// Root directory under which each user's subtree lives.
    upload_root: PathBuf,
}

impl UserLayout {
    /// Create a layout rooted at the given upload directory.
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
        }
    }

    /// The root directory of a user's subtree.
    pub fn user_dir(&self, user: UserId) -> PathBuf {
        self.upload_root.join(user.to_string())
    }

    /// The user's trash directory.
    pub fn trash_dir(&self, user: UserId) -> PathBuf {
        self.user_dir(user).join(TRASH_DIR_NAME)
    }

    /// Resolve a `(folder, name)` pair to an absolute path inside the
    /// user's subtree.
    ///
    /// `folder` is `""` for the root or a slash-separated relative path.
    /// Folder names and leaf names are unconstrained user input, so every
    /// segment is validated before joining.
    pub fn resolve(&self, user: UserId, folder: &str, name: &str) -> AppResult<PathBuf> {
        let mut path = self.user_dir(user);
        if !folder.is_empty() {
            for segment in folder.split('/') {
                validate_segment(segment)?;
                path.push(segment);
            }
        }
        validate_segment(name)?;
        path.push(name);
        Ok(path)
    }
}

/// Reject path segments that would escape or rewrite the user's subtree.
pub fn validate_segment(segment: &str) -> AppResult<()> {
    if segment.is_empty() {
        return Err(AppError::validation("Path segment cannot be empty"));
    }
    if segment == "." || segment == ".." {
        return Err(AppError::validation(format!(
            "Illegal path segment: {segment}"
        )));
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err(AppError::validation(format!(
            "Path segment cannot contain separators: {segment}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nubedrive_core::error::ErrorKind;

    fn layout() -> UserLayout {
        UserLayout::new("/srv/uploads")
    }

    #[test]
    fn test_trash_dir_under_user_dir() {
        let user = UserId::new();
        let trash = layout().trash_dir(user);
        assert!(trash.starts_with(layout().user_dir(user)));
        assert_eq!(trash.file_name().unwrap(), TRASH_DIR_NAME);
    }

    #[test]
    fn test_resolve_root_and_nested() {
        let user = UserId::new();
        let l = layout();

        let root = l.resolve(user, "", "a.txt").unwrap();
        assert_eq!(root, l.user_dir(user).join("a.txt"));

        let nested = l.resolve(user, "Projects/Q1", "report.pdf").unwrap();
        assert_eq!(
            nested,
            l.user_dir(user).join("Projects").join("Q1").join("report.pdf")
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let user = UserId::new();
        let l = layout();

        for (folder, name) in [
            ("..", "a.txt"),
            ("docs/..", "a.txt"),
            ("", ".."),
            (".", "a.txt"),
            ("docs", ""),
        ] {
            let err = l.resolve(user, folder, name).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{folder:?}/{name:?}");
        }
    }

    #[test]
    fn test_validate_segment_rejects_separators() {
        assert!(validate_segment("a/b").is_err());
        assert!(validate_segment("a\\b").is_err());
        assert!(validate_segment("plain name").is_ok());
    }
}
