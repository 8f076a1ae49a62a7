//! Streaming: keeps the cells around the observer resident.
//!
//! # Invariants
//! - At most one reconciliation is in flight; a new target cancels the old run.
//! - Within a run every load request precedes every unload request.
//! - When a run completes, the resident set equals the active window
//!   clipped to the grid.

mod config;
mod locator;
mod manager;
mod reconcile;
mod window;

pub use config::StreamConfig;
pub use locator::{DirectoryContentLocator, load_topology_or_default};
pub use manager::{CellChange, CellStreamingManager, StreamStats, StreamingManagerBuilder};
pub use reconcile::{Reconciliation, Step};
pub use window::ActiveWindow;

/// Errors from setting up streaming.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("required collaborator not configured: {0}")]
    MissingCollaborator(&'static str),
}
