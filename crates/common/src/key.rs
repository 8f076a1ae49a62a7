//! Textual cell keys: `"x,z,y,index"`.
//!
//! The key is part of every persisted filename and content path, so its
//! field order (z before y) must never change.

use std::fmt;
use std::str::FromStr;

use crate::CellCoord;

/// Errors from parsing a cell key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("malformed cell key {0:?}: expected four comma-separated integers \"x,z,y,index\"")]
    Malformed(String),
}

/// A cell coordinate paired with its flat array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub coord: CellCoord,
    pub index: usize,
}

impl CellKey {
    pub fn new(coord: CellCoord, index: usize) -> Self {
        Self { coord, index }
    }

    /// Parse the key embedded at the end of a file stem such as
    /// `World_Cell_1,2,0,5`: everything after the last `_`.
    pub fn from_file_stem(stem: &str) -> Result<Self, KeyError> {
        let tail = stem.rsplit('_').next().unwrap_or(stem);
        tail.parse()
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.coord.x, self.coord.z, self.coord.y, self.index
        )
    }
}

impl FromStr for CellKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || KeyError::Malformed(s.to_string());
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, z, y, index] = parts.as_slice() else {
            return Err(malformed());
        };
        let x: i32 = x.parse().map_err(|_| malformed())?;
        let z: i32 = z.parse().map_err(|_| malformed())?;
        let y: i32 = y.parse().map_err(|_| malformed())?;
        let index: usize = index.parse().map_err(|_| malformed())?;
        Ok(Self::new(CellCoord::new(x, y, z), index))
    }
}
