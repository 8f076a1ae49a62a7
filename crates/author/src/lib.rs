//! Grid authoring: settings, per-cell validity, statistics, and the
//! save / safe-save / overwrite-all lifecycle of a world's grid files.
//!
//! # Invariants
//! - Validity toggles and settings changes are reversible through [`Editor`].
//! - Safe save never touches disk when the on-disk topology differs.

pub mod editor;
pub mod settings;
pub mod stats;
pub mod store;

use std::path::PathBuf;

use gridstream_persist::StoreError;
use gridstream_topology::TopologyError;

pub use editor::{AuthoringCommand, CommandOutcome, EditCommand, Editor};
pub use settings::{EditorPrefs, GridSettings};
pub use stats::{CELL_WARNING_THRESHOLD, GridStats, SIZE_WARNING_AREA, format_size};
pub use store::{AuthoredCell, ContentRefresh, GridAuthoringStore, SafeSaveReport, SaveReport};

/// Errors from authoring operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthorError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("prefs JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cell index {index} out of range (grid has {len} cells)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(
        "{field} on disk ({on_disk}) differs from current settings ({in_memory}); \
         use overwrite to regenerate the grid"
    )]
    TopologyMismatchOnSafeSave {
        field: &'static str,
        on_disk: String,
        in_memory: String,
    },
    #[error("no saved grid to safe-save over: {0} not found")]
    MissingTopologyFile(PathBuf),
}
