//! # nubedrive-storage
//!
//! The storage core of NubeDrive: per-user directory layout, the trash
//! filename codec, filesystem move/copy/remove utilities, and the trash
//! bin service (trash, list, restore, purge).

pub mod codec;
pub mod fsops;
pub mod layout;
pub mod trash;

pub use layout::UserLayout;
pub use trash::{TrashBin, TrashEntry};
