//! Trash management CLI commands.
//!
//! Each subcommand plays the role of one of the application's route
//! handlers: `put` (delete handler), `list` (list-trash handler),
//! `restore` (restore handler), and `purge` (permanent-delete handler).

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use nubedrive_core::UserId;
use nubedrive_core::error::AppError;
use nubedrive_storage::{TrashBin, TrashEntry, UserLayout};

use crate::output::{self, OutputFormat};

/// Arguments for trash commands
#[derive(Debug, Args)]
pub struct TrashArgs {
    /// Trash subcommand
    #[command(subcommand)]
    pub command: TrashCommand,
}

/// Trash subcommands
#[derive(Debug, Subcommand)]
pub enum TrashCommand {
    /// Move a file or folder to the trash
    Put {
        /// Owning user ID
        #[arg(short, long)]
        user: String,
        /// Leaf name of the file or folder
        #[arg(short, long)]
        name: String,
        /// Containing folder relative to the user's root (omit for root)
        #[arg(long, default_value = "")]
        folder: String,
    },
    /// List the contents of the trash
    List {
        /// Owning user ID
        #[arg(short, long)]
        user: String,
    },
    /// Restore a trash entry to its original location
    Restore {
        /// Owning user ID
        #[arg(short, long)]
        user: String,
        /// Trash entry name as shown by `trash list`
        #[arg(short, long)]
        name: String,
    },
    /// Permanently delete a trash entry
    Purge {
        /// Owning user ID
        #[arg(short, long)]
        user: String,
        /// Trash entry name as shown by `trash list`
        #[arg(short, long)]
        name: String,
    },
}

/// Trash entry display row
#[derive(Debug, Serialize, Tabled)]
struct TrashRow {
    /// On-disk entry name
    name: String,
    /// Original leaf name
    display_name: String,
    /// Original folder
    original_folder: String,
    /// Deletion time
    deleted_at: String,
    /// Entry kind
    kind: String,
    /// Size in bytes
    size_bytes: u64,
}

impl From<&TrashEntry> for TrashRow {
    fn from(entry: &TrashEntry) -> Self {
        Self {
            name: entry.trash_name.clone(),
            display_name: entry.display_name.clone(),
            original_folder: if entry.original_folder.is_empty() {
                "/".to_string()
            } else {
                entry.original_folder.clone()
            },
            deleted_at: entry.deleted_at.to_rfc3339(),
            kind: if entry.is_directory { "folder" } else { "file" }.to_string(),
            size_bytes: entry.size_bytes,
        }
    }
}

/// Execute trash commands
pub async fn execute(
    args: &TrashArgs,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let bin = TrashBin::new(UserLayout::new(&config.storage.upload_root));

    match &args.command {
        TrashCommand::Put { user, name, folder } => {
            let user = parse_user(user)?;
            let trash_name = bin.trash(user, folder, name).await?;
            output::print_success(&format!("Moved to trash as '{}'", trash_name));
        }
        TrashCommand::List { user } => {
            let user = parse_user(user)?;
            let entries = bin.list(user).await?;
            let rows: Vec<TrashRow> = entries.iter().map(TrashRow::from).collect();
            output::print_list(&rows, format);
        }
        TrashCommand::Restore { user, name } => {
            let user = parse_user(user)?;
            let destination = bin.restore(user, name).await?;
            output::print_success(&format!("Restored to '{}'", destination.display()));
        }
        TrashCommand::Purge { user, name } => {
            let user = parse_user(user)?;
            bin.purge(user, name).await?;
            output::print_success(&format!("Permanently deleted '{}'", name));
        }
    }

    Ok(())
}

fn parse_user(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|e| AppError::validation(format!("Invalid user ID '{raw}': {e}")))
}
