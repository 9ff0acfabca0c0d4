//! Trash filename codec.
//!
//! A trashed item's original location is flattened into its filename in the
//! per-user `.trash` directory, using the on-disk convention
//!
//! ```text
//! <deletedAtEpochMs>_<folderToken>_<leafName>
//! ```
//!
//! where `folderToken` is the original containing folder with every path
//! separator replaced by `_` (empty for the root, which leaves two adjacent
//! underscores before the leaf). This convention must be preserved exactly:
//! trash directories written by earlier versions must keep decoding.
//!
//! The delimiter is not prefix-free. Underscores in the leaf name are
//! sanitized to `-` at encode time, so the "last token is the leaf" decode
//! rule is exact for names this module produced. Underscores *inside* a
//! folder segment cannot be told apart from separators: a folder named
//! `a_b` decodes as `a/b`. That lossiness is inherent to the convention and
//! is documented rather than papered over.

use nubedrive_core::{AppError, AppResult};

/// A trash filename decoded into its three logical fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTrashName {
    /// Milliseconds since the Unix epoch at which the item was trashed.
    pub deleted_at_ms: i64,
    /// Original containing folder, slash-separated, `""` for the root.
    pub original_folder: String,
    /// Original leaf file or folder name (post sanitization).
    pub display_name: String,
}

/// Replace characters that cannot survive inside a single flattened path
/// segment. Irreversible: a leaf that contained `/`, `\` or `_` cannot be
/// restored with those characters intact.
fn sanitize_leaf(leaf: &str) -> String {
    leaf.chars()
        .map(|c| match c {
            '/' | '\\' | '_' => '-',
            other => other,
        })
        .collect()
}

/// Flatten a slash-separated folder path into a single token.
fn folder_token(folder: &str) -> String {
    folder
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

/// Encode a deletion timestamp, original folder, and leaf name into a trash
/// filename.
///
/// The result contains no `/` or `\`, so it is always a legal single path
/// segment. `original_folder` is `""` for items that lived at the root of
/// the user's directory.
pub fn encode(deleted_at_ms: i64, original_folder: &str, leaf_name: &str) -> AppResult<String> {
    if deleted_at_ms < 0 {
        return Err(AppError::validation(format!(
            "Deletion timestamp must be non-negative, got {deleted_at_ms}"
        )));
    }

    let leaf = sanitize_leaf(leaf_name);
    if leaf.is_empty() {
        return Err(AppError::validation("Leaf name cannot be empty"));
    }

    Ok(format!(
        "{deleted_at_ms}_{}_{leaf}",
        folder_token(original_folder)
    ))
}

/// Decode a trash filename back into its logical fields.
///
/// Split on `_`: the first token is the timestamp, the last token is the
/// leaf name, and everything in between rejoined with `/` is the original
/// folder. Names with no underscore at all, a non-numeric or negative first
/// token, or an empty leaf token are malformed; callers either skip such
/// entries (listing) or surface the error (restore).
pub fn decode(trash_name: &str) -> AppResult<DecodedTrashName> {
    let parts: Vec<&str> = trash_name.split('_').collect();
    if parts.len() < 2 {
        return Err(AppError::validation(format!(
            "Malformed trash name (no delimiter): {trash_name}"
        )));
    }

    let deleted_at_ms: i64 = parts[0].parse().map_err(|_| {
        AppError::validation(format!(
            "Malformed trash name (non-numeric timestamp): {trash_name}"
        ))
    })?;
    if deleted_at_ms < 0 {
        return Err(AppError::validation(format!(
            "Malformed trash name (negative timestamp): {trash_name}"
        )));
    }

    let display_name = parts[parts.len() - 1];
    if display_name.is_empty() {
        return Err(AppError::validation(format!(
            "Malformed trash name (empty leaf): {trash_name}"
        )));
    }

    let original_folder = parts[1..parts.len() - 1].join("/");

    Ok(DecodedTrashName {
        deleted_at_ms,
        original_folder,
        display_name: display_name.to_string(),
    })
}
