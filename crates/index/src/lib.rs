//! # Relmap Index
//!
//! In-memory index of the map files inside one watched directory, kept
//! consistent with external edits through change-event reconciliation.
//!
//! ## Flow
//!
//! ```text
//! notifier ──events──> MapIndex.reconcile ──> MapFile set
//!                                               │
//! queries (map_entry, tags_for, ...) <──────────┤
//!                                               │
//! request_tag_update ──diff──> MapContentDocument ──> Storage
//! commit ─────────────────────────────────────────> Vcs
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use relmap_index::{AllAccessible, FsStorage, GitVcs, MapIndex, NullProgress};
//! use std::sync::Arc;
//!
//! fn main() -> relmap_index::Result<()> {
//!     let index = MapIndex::open(
//!         "releng/maps",
//!         Arc::new(FsStorage::new()),
//!         Arc::new(GitVcs::new("releng")),
//!         Arc::new(AllAccessible),
//!     )?;
//!
//!     index.request_tag_update("org.example.core", "v20260829")?;
//!     index.commit("update core to v20260829", &NullProgress)?;
//!     Ok(())
//! }
//! ```

mod error;
mod event;
mod index;
mod mapfile;
mod storage;
mod vcs;
mod watcher;
mod workspace;

pub use error::{IndexError, Result};
pub use relmap_format::{MapEntry, DEFAULT_TAG, MAP_FILE_EXTENSION};
pub use event::{ChangeEvent, ChangeKind, PathDelta, ResourceKind};
pub use index::MapIndex;
pub use mapfile::MapFile;
pub use storage::{FsStorage, MemoryStorage, Storage, StorageError};
pub use vcs::{CommitDepth, GitVcs, NullProgress, Progress, Vcs, VcsError};
pub use watcher::MapWatcher;
pub use workspace::{AllAccessible, Workspace};
