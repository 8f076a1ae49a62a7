//! Shared types for the grid streaming engine: cell coordinates, cell keys,
//! bounds, content refs and the collaborator traits both the runtime and
//! the authoring tool consume.

pub mod content;
pub mod key;
pub mod types;

pub use content::{ContentLoader, ContentLocator, InMemoryContentLoader, PositionSource};
pub use key::{CellKey, KeyError};
pub use types::{CellBounds, CellCoord, ContentRef};
