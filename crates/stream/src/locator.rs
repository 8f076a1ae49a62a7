//! Reading authored grid data at startup.

use gridstream_common::{CellCoord, CellKey, ContentLocator, ContentRef};
use gridstream_persist::{GridFileStore, StoreError};
use gridstream_topology::GridTopology;

/// Load the authored topology, falling back to the built-in placeholder
/// grid when the master record is missing or unreadable.
pub fn load_topology_or_default(store: &GridFileStore) -> GridTopology {
    let record = match store.read_master() {
        Ok(record) => record,
        Err(StoreError::MissingTopologyFile(path)) => {
            tracing::warn!(
                path = %path.display(),
                "master grid data file not found, using defaults"
            );
            return GridTopology::default();
        }
        Err(e) => {
            tracing::warn!("unreadable master grid data, using defaults: {e}");
            return GridTopology::default();
        }
    };
    match record.to_topology() {
        Ok(topology) => topology,
        Err(e) => {
            tracing::warn!("invalid master grid data, using defaults: {e}");
            GridTopology::default()
        }
    }
}

/// Resolves a cell's content from the world folder: a cell has content
/// when both its bounds file and its content folder exist.
#[derive(Debug, Clone)]
pub struct DirectoryContentLocator {
    store: GridFileStore,
}

impl DirectoryContentLocator {
    pub fn new(store: GridFileStore) -> Self {
        Self { store }
    }
}

impl ContentLocator for DirectoryContentLocator {
    fn locate(&self, coord: CellCoord, index: usize) -> Option<ContentRef> {
        let key = CellKey::new(coord, index);
        if !self.store.cell_exists(&key) {
            return None;
        }
        if !self.store.content_dir_exists(&key) {
            tracing::warn!(%key, "content folder not found for cell");
            return None;
        }
        Some(self.store.layout().content_ref(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec3, Vec3};
    use gridstream_persist::{GridLayout, MasterRecord};
    use gridstream_topology::{ExpansionLevel, ExpansionMode};

    fn store(tmp: &tempfile::TempDir) -> GridFileStore {
        GridFileStore::new(GridLayout::new(tmp.path(), "Demo"))
    }

    #[test]
    fn missing_master_falls_back_to_default() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(load_topology_or_default(&store(&tmp)), GridTopology::default());
    }

    #[test]
    fn truncated_master_falls_back_to_default() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.ensure_dirs().unwrap();
        std::fs::write(store.layout().master_path(), [0u8; 12]).unwrap();
        assert_eq!(load_topology_or_default(&store), GridTopology::default());
    }

    #[test]
    fn authored_master_is_used() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        let authored = GridTopology::new(
            Vec3::new(0.0, 0.0, 0.0),
            IVec3::new(5, 1, 3),
            512,
            256,
            ExpansionMode::Center,
            ExpansionLevel::Top,
        )
        .unwrap();
        store
            .write_master(&MasterRecord::from_topology(&authored))
            .unwrap();
        assert_eq!(load_topology_or_default(&store), authored);
    }

    #[test]
    fn locator_requires_record_and_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        let grid = GridTopology::default();
        let with_both = grid.key_of(CellCoord::new(0, 0, 0)).unwrap();
        let record_only = grid.key_of(CellCoord::new(0, 0, 1)).unwrap();
        store
            .write_cell(&with_both, grid.cell_bounds(with_both.coord))
            .unwrap();
        store.ensure_content_dir(&with_both).unwrap();
        store
            .write_cell(&record_only, grid.cell_bounds(record_only.coord))
            .unwrap();

        let locator = DirectoryContentLocator::new(store.clone());
        let found = locator.locate(with_both.coord, with_both.index).unwrap();
        assert_eq!(found, store.layout().content_ref(&with_both));
        assert!(locator.locate(record_only.coord, record_only.index).is_none());
        assert!(locator.locate(CellCoord::new(3, 1, 3), 31).is_none());
    }
}
