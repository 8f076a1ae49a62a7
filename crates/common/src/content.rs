//! Collaborator seams: how cell content is loaded, located, and where the
//! observer is.
//!
//! The streaming core never loads content itself. Every request is
//! fire-and-forget; implementations must tolerate a load immediately
//! followed by an unload for the same cell.

use std::collections::HashMap;

use glam::Vec3;

use crate::{CellCoord, ContentRef};

/// Loads and unloads per-cell content.
pub trait ContentLoader {
    /// Request that the content of `coord` becomes resident.
    fn load_content(&mut self, coord: CellCoord, content: &ContentRef);
    /// Request that the content of `coord` is released.
    fn unload_content(&mut self, coord: CellCoord);
    /// Whether content for `coord` is currently resident.
    fn is_loaded(&self, coord: CellCoord) -> bool;
}

/// Resolves the content ref of a cell. Absence is not an error.
pub trait ContentLocator {
    fn locate(&self, coord: CellCoord, index: usize) -> Option<ContentRef>;
}

/// Samples the observer's world-space position once per tick.
pub trait PositionSource {
    fn position(&self) -> Vec3;
}

impl<F> PositionSource for F
where
    F: Fn() -> Vec3,
{
    fn position(&self) -> Vec3 {
        self()
    }
}

/// Content loader that only tracks residency in memory.
///
/// Loading an already resident cell and unloading a non-resident one are
/// both no-ops, and neither is counted.
#[derive(Debug, Default)]
pub struct InMemoryContentLoader {
    resident: HashMap<CellCoord, ContentRef>,
    loads: usize,
    unloads: usize,
}

impl InMemoryContentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content refs currently resident.
    pub fn resident(&self) -> &HashMap<CellCoord, ContentRef> {
        &self.resident
    }

    /// Number of loads that actually changed residency.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Number of unloads that actually changed residency.
    pub fn unload_count(&self) -> usize {
        self.unloads
    }
}

impl ContentLoader for InMemoryContentLoader {
    fn load_content(&mut self, coord: CellCoord, content: &ContentRef) {
        if self.resident.contains_key(&coord) {
            return;
        }
        self.resident.insert(coord, content.clone());
        self.loads += 1;
    }

    fn unload_content(&mut self, coord: CellCoord) {
        if self.resident.remove(&coord).is_some() {
            self.unloads += 1;
        }
    }

    fn is_loaded(&self, coord: CellCoord) -> bool {
        self.resident.contains_key(&coord)
    }
}
