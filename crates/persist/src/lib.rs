//! Persistence: the binary grid format shared by the runtime and the
//! authoring tool, plus the on-disk folder layout of a world.
//!
//! # Invariants
//! - Records are little-endian, fixed-field, untagged and unversioned;
//!   readers consume fields in exactly the written order.
//! - Per-cell files are named by the `"x,z,y,index"` key so they can be
//!   placed back at the same flat index on reload.

pub mod codec;
pub mod layout;
pub mod store;

pub use codec::{CELL_RECORD_LEN, CellRecord, CodecError, MASTER_RECORD_LEN, MasterRecord};
pub use layout::GridLayout;
pub use store::{CellScan, GridFileStore, ScannedCell, SkipReason, StoreError};
