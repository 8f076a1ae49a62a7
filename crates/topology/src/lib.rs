//! Grid topology: the immutable description of how the world is cut into cells.
//!
//! # Invariants
//! - Every count is at least 1 and both cell sizes are positive.
//! - Flat indices enumerate x outer, y middle, z inner. Persisted filenames
//!   depend on this order.
//! - Position lookups never return a coordinate outside the grid.

mod expansion;
mod grid;

pub use expansion::{CellSize, ExpansionLevel, ExpansionMode};
pub use grid::{CellLocation, GridTopology};

use gridstream_common::CellCoord;

/// Errors from topology construction and index math.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("cell count on axis {axis} must be at least 1, got {value}")]
    InvalidCount { axis: char, value: i32 },
    #[error("cell size on axis {axis} must be positive, got {value}")]
    InvalidCellSize { axis: &'static str, value: i32 },
    #[error("flat index {index} out of range for {len} cells")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cell {0} is outside the grid")]
    OutOfBounds(CellCoord),
    #[error("unknown expansion mode discriminant {0}")]
    UnknownExpansionMode(i32),
    #[error("unknown expansion level discriminant {0}")]
    UnknownExpansionLevel(i32),
    #[error("unsupported cell size {0}")]
    UnsupportedCellSize(i32),
}
