//! Authoring state of one world's grid.
//!
//! Holds every cell the current settings enumerate, with a designer-set
//! validity flag per cell. Only valid cells get a bounds file and a
//! content folder on save.

use std::collections::HashSet;
use std::fmt;

use glam::Vec3;
use gridstream_common::{CellBounds, CellCoord, CellKey, ContentLoader};
use gridstream_persist::{GridFileStore, MasterRecord, StoreError};
use gridstream_topology::GridTopology;

use crate::settings::{EditorPrefs, GridSettings};
use crate::stats::{GridStats, format_size};
use crate::AuthorError;

/// One enumerable cell of the authored grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthoredCell {
    pub key: CellKey,
    pub bounds: CellBounds,
    pub valid: bool,
}

/// Outcome of a full save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub cells_written: usize,
    pub content_dirs_created: usize,
    /// Bounds files of invalid cells deleted.
    pub cells_removed: usize,
    pub content_dirs_removed: usize,
    /// Master record plus every cell record.
    pub bytes_written: u64,
}

impl fmt::Display for SaveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "saved {} cells ({} new content folders), removed {} cells ({} content folders), {}",
            self.cells_written,
            self.content_dirs_created,
            self.cells_removed,
            self.content_dirs_removed,
            format_size(self.bytes_written)
        )
    }
}

/// Outcome of a safe save: what was reconciled against disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafeSaveReport {
    pub records_created: usize,
    pub content_dirs_created: usize,
    pub records_deleted: usize,
    pub content_dirs_deleted: usize,
}

impl fmt::Display for SafeSaveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} records / {} content folders, deleted {} records / {} content folders",
            self.records_created,
            self.content_dirs_created,
            self.records_deleted,
            self.content_dirs_deleted
        )
    }
}

/// Loads and unloads issued by one [`GridAuthoringStore::refresh_content`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentRefresh {
    pub loaded: usize,
    pub unloaded: usize,
}

/// Explicit authoring session for one world.
#[derive(Debug)]
pub struct GridAuthoringStore {
    files: GridFileStore,
    settings: GridSettings,
    topology: GridTopology,
    cells: Vec<AuthoredCell>,
    content_loaded: HashSet<CellCoord>,
    stats: GridStats,
}

impl GridAuthoringStore {
    /// Open a session over existing grid files, or over an empty folder.
    ///
    /// Settings come from the master record when one is readable, else the
    /// defaults. A cell starts valid iff its bounds file exists; with no
    /// parameters folder at all every cell starts valid.
    pub fn open(files: GridFileStore) -> Result<Self, AuthorError> {
        let settings = match files.read_master() {
            Ok(record) => match GridSettings::from_master(&record) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("unusable master grid data, using default settings: {e}");
                    GridSettings::default()
                }
            },
            Err(StoreError::MissingTopologyFile(path)) => {
                tracing::info!(path = %path.display(), "no master grid data, using default settings");
                GridSettings::default()
            }
            Err(StoreError::Codec { path, source }) => {
                tracing::warn!(path = %path.display(), "corrupt master grid data, using default settings: {source}");
                GridSettings::default()
            }
            Err(e) => return Err(e.into()),
        };
        let topology = settings.to_topology()?;
        let mut store = Self {
            files,
            settings,
            topology,
            cells: Vec::new(),
            content_loaded: HashSet::new(),
            stats: GridStats::default(),
        };
        store.cells = store.enumerate_cells(|_| true);
        if store.files.layout().parameters_dir().is_dir() {
            store.load_validity()?;
        }
        store.recompute();
        Ok(store)
    }

    fn enumerate_cells(&self, valid: impl Fn(usize) -> bool) -> Vec<AuthoredCell> {
        self.topology
            .cells()
            .map(|key| AuthoredCell {
                key,
                bounds: self.topology.cell_bounds(key.coord),
                valid: valid(key.index),
            })
            .collect()
    }

    fn load_validity(&mut self) -> Result<(), AuthorError> {
        let scan = self.files.scan_cells()?;
        for cell in &mut self.cells {
            cell.valid = false;
        }
        let len = self.cells.len();
        for scanned in scan.cells {
            let index = scanned.key.index;
            match self.cells.get_mut(index) {
                Some(cell) => cell.valid = true,
                None => tracing::warn!(
                    key = %scanned.key,
                    "cell file index {index} out of range ({len} cells), grid settings changed since it was saved"
                ),
            }
        }
        Ok(())
    }

    /// Recompute every cell's bounds and the grid statistics from the
    /// current topology. Validity is kept.
    pub fn recompute(&mut self) {
        for cell in &mut self.cells {
            cell.bounds = self.topology.cell_bounds(cell.key.coord);
        }
        self.stats = GridStats::compute(&self.topology, &self.validity());
    }

    pub fn files(&self) -> &GridFileStore {
        &self.files
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    /// Apply new settings (clamped into supported ranges). When the cell
    /// count changes every cell resets to valid.
    pub fn set_settings(&mut self, settings: GridSettings) -> Result<(), AuthorError> {
        let settings = settings.clamped();
        let topology = settings.to_topology()?;
        let resized = topology.cell_count() != self.topology.cell_count();
        self.settings = settings;
        self.topology = topology;
        if resized {
            tracing::info!(cells = topology.cell_count(), "grid resized, all cells reset to valid");
            self.cells = self.enumerate_cells(|_| true);
        } else {
            // Same count, but the coordinate at each index may differ.
            let validity = self.validity();
            self.cells = self.enumerate_cells(|i| validity.get(i).copied().unwrap_or(true));
        }
        self.recompute();
        Ok(())
    }

    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    pub fn cells(&self) -> &[AuthoredCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Result<&AuthoredCell, AuthorError> {
        self.cells.get(index).ok_or(AuthorError::IndexOutOfRange {
            index,
            len: self.cells.len(),
        })
    }

    pub fn stats(&self) -> &GridStats {
        &self.stats
    }

    /// Validity flags by flat index.
    pub fn validity(&self) -> Vec<bool> {
        self.cells.iter().map(|c| c.valid).collect()
    }

    /// Put back validity flags captured with [`Self::validity`]. Extra or
    /// missing entries are ignored.
    pub fn restore_validity(&mut self, validity: &[bool]) {
        for (cell, valid) in self.cells.iter_mut().zip(validity) {
            cell.valid = *valid;
        }
        self.recompute();
    }

    /// Set one cell's validity. Returns the previous value.
    pub fn set_cell_valid(&mut self, index: usize, valid: bool) -> Result<bool, AuthorError> {
        let len = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(AuthorError::IndexOutOfRange { index, len })?;
        let old = std::mem::replace(&mut cell.valid, valid);
        if old != valid {
            self.stats = GridStats::compute(&self.topology, &self.validity());
        }
        Ok(old)
    }

    /// Flip one cell's validity. Returns the new value.
    pub fn toggle_cell(&mut self, index: usize) -> Result<bool, AuthorError> {
        let valid = !self.cell(index)?.valid;
        self.set_cell_valid(index, valid)?;
        Ok(valid)
    }

    /// Write the master record, then a bounds file and content folder for
    /// every valid cell. Invalid cells lose any bounds file and content
    /// folder left from an earlier save.
    pub fn save(&self) -> Result<SaveReport, AuthorError> {
        let _span = tracing::info_span!("authoring_save", world = self.files.layout().world()).entered();
        let mut report = SaveReport {
            bytes_written: self
                .files
                .write_master(&MasterRecord::from_topology(&self.topology))?,
            ..SaveReport::default()
        };
        for cell in &self.cells {
            if !cell.valid {
                if self.files.delete_cell(&cell.key)? {
                    report.cells_removed += 1;
                }
                if self.files.delete_content_dir(&cell.key)? {
                    report.content_dirs_removed += 1;
                }
                continue;
            }
            report.bytes_written += self.files.write_cell(&cell.key, cell.bounds)?;
            report.cells_written += 1;
            if self.files.ensure_content_dir(&cell.key)? {
                report.content_dirs_created += 1;
            }
        }
        tracing::info!(
            cells = report.cells_written,
            removed = report.cells_removed,
            size = %format_size(report.bytes_written),
            "grid saved"
        );
        Ok(report)
    }

    /// Save only if the on-disk topology matches the current settings, then
    /// bring per-cell files in line with validity: invalid cells lose their
    /// bounds file and content folder, valid cells missing either get them.
    pub fn safe_save(&self) -> Result<SafeSaveReport, AuthorError> {
        let _span = tracing::info_span!("authoring_save", world = self.files.layout().world(), safe = true).entered();
        let on_disk = match self.files.read_master() {
            Ok(record) => record,
            Err(StoreError::MissingTopologyFile(path)) => {
                return Err(AuthorError::MissingTopologyFile(path));
            }
            Err(e) => return Err(e.into()),
        };
        if let Some((field, on_disk, in_memory)) = self.settings.first_mismatch(&on_disk) {
            tracing::warn!(field, %on_disk, %in_memory, "safe save refused, topology differs from disk");
            return Err(AuthorError::TopologyMismatchOnSafeSave {
                field,
                on_disk,
                in_memory,
            });
        }

        let mut report = SafeSaveReport::default();
        for cell in &self.cells {
            if cell.valid {
                if !self.files.cell_exists(&cell.key) {
                    self.files.write_cell(&cell.key, cell.bounds)?;
                    report.records_created += 1;
                }
                if self.files.ensure_content_dir(&cell.key)? {
                    report.content_dirs_created += 1;
                }
            } else {
                if self.files.delete_cell(&cell.key)? {
                    report.records_deleted += 1;
                }
                if self.files.delete_content_dir(&cell.key)? {
                    report.content_dirs_deleted += 1;
                }
            }
        }
        tracing::info!(%report, "grid safe-saved");
        Ok(report)
    }

    /// Unload everything, delete all per-cell content and records, then
    /// save the current state from scratch.
    pub fn overwrite_all(&mut self, loader: &mut dyn ContentLoader) -> Result<SaveReport, AuthorError> {
        self.unload_all(loader);
        let content = self.files.delete_all_content()?;
        let records = self.files.delete_all_records()?;
        tracing::info!(content, records, "cleared existing grid data");
        self.save()
    }

    /// Load or unload content around the editor camera. With partial load
    /// off, every valid cell is loaded. Cells without a content folder are
    /// never loaded.
    pub fn refresh_content(
        &mut self,
        camera: Vec3,
        prefs: &EditorPrefs,
        loader: &mut dyn ContentLoader,
    ) -> ContentRefresh {
        let mut refresh = ContentRefresh::default();
        for cell in &self.cells {
            let coord = cell.key.coord;
            let wanted = cell.valid
                && (!prefs.partial_load || cell.bounds.center.distance(camera) <= prefs.load_radius);
            let resident = self.content_loaded.contains(&coord);
            if wanted && !resident {
                if !self.files.content_dir_exists(&cell.key) {
                    continue;
                }
                let content = self.files.layout().content_ref(&cell.key);
                tracing::debug!(%coord, name = %content.name, "editor load");
                loader.load_content(coord, &content);
                self.content_loaded.insert(coord);
                refresh.loaded += 1;
            } else if !wanted && resident {
                tracing::debug!(%coord, "editor unload");
                loader.unload_content(coord);
                self.content_loaded.remove(&coord);
                refresh.unloaded += 1;
            }
        }
        refresh
    }

    /// Unload every cell this session loaded. Returns how many.
    pub fn unload_all(&mut self, loader: &mut dyn ContentLoader) -> usize {
        let count = self.content_loaded.len();
        let mut loaded: Vec<CellCoord> = self.content_loaded.drain().collect();
        loaded.sort();
        for coord in loaded {
            loader.unload_content(coord);
        }
        count
    }

    pub fn loaded_content(&self) -> &HashSet<CellCoord> {
        &self.content_loaded
    }

    /// End the session, unloading content unless prefs keep it loaded.
    pub fn close(mut self, prefs: &EditorPrefs, loader: &mut dyn ContentLoader) {
        if !prefs.keep_loaded {
            self.unload_all(loader);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstream_common::InMemoryContentLoader;
    use gridstream_persist::GridLayout;
    use gridstream_topology::CellSize;

    fn files(tmp: &tempfile::TempDir) -> GridFileStore {
        GridFileStore::new(GridLayout::new(tmp.path(), "Demo"))
    }

    fn fresh(tmp: &tempfile::TempDir) -> GridAuthoringStore {
        GridAuthoringStore::open(files(tmp)).unwrap()
    }

    #[test]
    fn open_empty_folder_uses_defaults_all_valid() {
        let tmp = tempfile::tempdir().unwrap();
        let store = fresh(&tmp);
        assert_eq!(*store.settings(), GridSettings::default());
        assert_eq!(store.cells().len(), 8);
        assert!(store.cells().iter().all(|c| c.valid));
        assert_eq!(store.stats().invalid_cells, 0);
    }

    #[test]
    fn save_writes_valid_cells_only() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store.toggle_cell(3).unwrap();
        let report = store.save().unwrap();
        assert_eq!(report.cells_written, 7);
        assert_eq!(report.content_dirs_created, 7);
        assert_eq!(report.bytes_written, 60 + 7 * 24);

        let files = store.files();
        let skipped = store.cell(3).unwrap().key;
        assert!(files.has_master());
        assert!(!files.cell_exists(&skipped));
        assert!(!files.content_dir_exists(&skipped));
        let kept = store.cell(0).unwrap();
        assert_eq!(files.read_cell(&kept.key).unwrap(), kept.bounds);
    }

    #[test]
    fn save_removes_files_of_invalidated_cells() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store.save().unwrap();
        let dropped = store.cell(3).unwrap().key;
        assert!(store.files().cell_exists(&dropped));

        store.set_cell_valid(3, false).unwrap();
        let report = store.save().unwrap();
        assert_eq!(report.cells_written, 7);
        assert_eq!((report.cells_removed, report.content_dirs_removed), (1, 1));
        assert!(!store.files().cell_exists(&dropped));
        assert!(!store.files().content_dir_exists(&dropped));

        let reopened = fresh(&tmp);
        assert!(!reopened.cell(3).unwrap().valid);
        assert_eq!(reopened.stats().invalid_cells, 1);
    }

    #[test]
    fn reopen_restores_settings_and_validity() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store
            .set_settings(GridSettings {
                world_size_x: 3,
                cell_size_xz: CellSize::Size512,
                ..GridSettings::default()
            })
            .unwrap();
        store.set_cell_valid(5, false).unwrap();
        store.save().unwrap();

        let reopened = fresh(&tmp);
        assert_eq!(reopened.settings(), store.settings());
        assert_eq!(reopened.validity(), store.validity());
        assert_eq!(reopened.stats(), store.stats());
    }

    #[test]
    fn out_of_range_cell_files_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store
            .set_settings(GridSettings {
                world_size_x: 4,
                ..GridSettings::default()
            })
            .unwrap();
        store.save().unwrap();
        // Master back to 2x2x2: indices 8..16 no longer exist.
        let small = GridSettings::default().to_topology().unwrap();
        store
            .files()
            .write_master(&MasterRecord::from_topology(&small))
            .unwrap();

        let reopened = fresh(&tmp);
        assert_eq!(reopened.cells().len(), 8);
        assert!(reopened.cells().iter().all(|c| c.valid));
    }

    #[test]
    fn unreadable_cell_entry_does_not_block_open() {
        let tmp = tempfile::tempdir().unwrap();
        let store = fresh(&tmp);
        store.save().unwrap();
        let params = store.files().layout().parameters_dir();
        std::fs::create_dir(params.join("Demo_Cell_9,9,9,99.bin")).unwrap();

        let reopened = fresh(&tmp);
        assert_eq!(reopened.cells().len(), 8);
        assert!(reopened.cells().iter().all(|c| c.valid));
    }

    #[test]
    fn resize_resets_validity_same_count_keeps_it() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store.set_cell_valid(1, false).unwrap();

        store
            .set_settings(GridSettings {
                cell_size_xz: CellSize::Size1024,
                ..GridSettings::default()
            })
            .unwrap();
        assert!(!store.cell(1).unwrap().valid);
        assert_eq!(store.cell(0).unwrap().bounds.size.x, 1024.0);

        store
            .set_settings(GridSettings {
                world_size_z: 3,
                ..GridSettings::default()
            })
            .unwrap();
        assert_eq!(store.cells().len(), 12);
        assert!(store.cells().iter().all(|c| c.valid));
    }

    #[test]
    fn toggle_out_of_range() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        assert!(matches!(
            store.toggle_cell(8),
            Err(AuthorError::IndexOutOfRange { index: 8, len: 8 })
        ));
    }

    #[test]
    fn safe_save_without_master_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let store = fresh(&tmp);
        assert!(matches!(
            store.safe_save(),
            Err(AuthorError::MissingTopologyFile(_))
        ));
    }

    #[test]
    fn safe_save_mismatch_leaves_disk_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store.save().unwrap();
        let master = store.files().layout().master_path();
        let before = std::fs::read(&master).unwrap();

        store
            .set_settings(GridSettings {
                cell_size_xz: CellSize::Size512,
                ..GridSettings::default()
            })
            .unwrap();
        store.set_cell_valid(0, false).unwrap();
        let err = store.safe_save().unwrap_err();
        match err {
            AuthorError::TopologyMismatchOnSafeSave { field, on_disk, in_memory } => {
                assert_eq!(field, "cell size");
                assert_eq!(on_disk, "256/256");
                assert_eq!(in_memory, "512/256");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read(&master).unwrap(), before);
        let first = store.cell(0).unwrap().key;
        assert!(store.files().cell_exists(&first));
        assert!(store.files().content_dir_exists(&first));
    }

    #[test]
    fn safe_save_reconciles_validity() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store.set_cell_valid(2, false).unwrap();
        store.save().unwrap();

        store.set_cell_valid(2, true).unwrap();
        store.set_cell_valid(6, false).unwrap();
        let report = store.safe_save().unwrap();
        assert_eq!(
            report,
            SafeSaveReport {
                records_created: 1,
                content_dirs_created: 1,
                records_deleted: 1,
                content_dirs_deleted: 1,
            }
        );
        let files = store.files();
        assert!(files.cell_exists(&store.cell(2).unwrap().key));
        assert!(!files.cell_exists(&store.cell(6).unwrap().key));
        assert!(!files.content_dir_exists(&store.cell(6).unwrap().key));
    }

    #[test]
    fn overwrite_all_regenerates_from_memory() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store.save().unwrap();
        let stale = store.cell(7).unwrap().key;
        std::fs::write(store.files().layout().content_dir(&stale).join("scene.bin"), b"x").unwrap();

        let mut loader = InMemoryContentLoader::new();
        store.refresh_content(Vec3::ZERO, &EditorPrefs { partial_load: false, ..EditorPrefs::default() }, &mut loader);
        assert_eq!(loader.resident().len(), 8);

        store
            .set_settings(GridSettings {
                cell_size_xz: CellSize::Size512,
                ..GridSettings::default()
            })
            .unwrap();
        store.set_cell_valid(7, false).unwrap();
        let report = store.overwrite_all(&mut loader).unwrap();
        assert_eq!(report.cells_written, 7);
        assert!(loader.resident().is_empty());
        assert!(!store.files().content_dir_exists(&stale));
        let on_disk = store.files().read_master().unwrap();
        assert_eq!(on_disk.cell_size_xz, 512);
        assert!(store.safe_save().is_ok());
    }

    #[test]
    fn partial_load_follows_camera() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store.save().unwrap();
        let prefs = EditorPrefs {
            partial_load: true,
            load_radius: 200.0,
            ..EditorPrefs::default()
        };
        let mut loader = InMemoryContentLoader::new();

        let target = *store.cell(0).unwrap();
        let refresh = store.refresh_content(target.bounds.center, &prefs, &mut loader);
        assert_eq!(refresh, ContentRefresh { loaded: 1, unloaded: 0 });
        assert!(loader.is_loaded(target.key.coord));

        let refresh = store.refresh_content(Vec3::splat(10_000.0), &prefs, &mut loader);
        assert_eq!(refresh, ContentRefresh { loaded: 0, unloaded: 1 });
        assert!(loader.resident().is_empty());
    }

    #[test]
    fn close_honours_keep_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = fresh(&tmp);
        store.save().unwrap();
        let prefs = EditorPrefs {
            partial_load: false,
            keep_loaded: false,
            ..EditorPrefs::default()
        };
        let mut loader = InMemoryContentLoader::new();
        store.refresh_content(Vec3::ZERO, &prefs, &mut loader);
        assert_eq!(loader.resident().len(), 8);
        store.close(&prefs, &mut loader);
        assert!(loader.resident().is_empty());
    }
}
