//! File-backed grid store.
//!
//! Reads and writes the master record, per-cell bounds files and per-cell
//! content folders of one world, following [`GridLayout`].

use std::fs;
use std::path::{Path, PathBuf};

use gridstream_common::{CellBounds, CellKey, KeyError};

use crate::codec::{CellRecord, CodecError, MasterRecord};
use crate::layout::{GridLayout, RECORD_EXTENSION};

/// Errors from file-backed grid persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("master topology file not found at {0}")]
    MissingTopologyFile(PathBuf),
    #[error("corrupt record in {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

/// One per-cell bounds file found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedCell {
    pub key: CellKey,
    pub bounds: CellBounds,
}

/// Why a file in the parameters folder was not used.
#[derive(Debug)]
pub enum SkipReason {
    /// The entry could not be read as a file.
    Unreadable(std::io::Error),
    MalformedKey(KeyError),
    Corrupt(CodecError),
}

/// Result of scanning the parameters folder.
#[derive(Debug, Default)]
pub struct CellScan {
    /// Readable cells, ordered by flat index.
    pub cells: Vec<ScannedCell>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
}

/// Grid files of one world.
#[derive(Debug, Clone)]
pub struct GridFileStore {
    layout: GridLayout,
}

impl GridFileStore {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Create the grid and parameters folders if missing.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        fs::create_dir_all(self.layout.parameters_dir())?;
        Ok(())
    }

    pub fn has_master(&self) -> bool {
        self.layout.master_path().is_file()
    }

    pub fn read_master(&self) -> Result<MasterRecord, StoreError> {
        let path = self.layout.master_path();
        if !path.is_file() {
            return Err(StoreError::MissingTopologyFile(path));
        }
        let bytes = fs::read(&path)?;
        MasterRecord::decode(&bytes).map_err(|source| StoreError::Codec { path, source })
    }

    /// Write the master record, replacing any existing one. Returns bytes written.
    pub fn write_master(&self, record: &MasterRecord) -> Result<u64, StoreError> {
        self.ensure_dirs()?;
        let bytes = record.encode();
        fs::write(self.layout.master_path(), &bytes)?;
        Ok(bytes.len() as u64)
    }

    pub fn cell_exists(&self, key: &CellKey) -> bool {
        self.layout.cell_record_path(key).is_file()
    }

    /// Write the bounds file of a cell. Returns bytes written.
    pub fn write_cell(&self, key: &CellKey, bounds: CellBounds) -> Result<u64, StoreError> {
        self.ensure_dirs()?;
        let bytes = CellRecord::from(bounds).encode();
        fs::write(self.layout.cell_record_path(key), &bytes)?;
        Ok(bytes.len() as u64)
    }

    pub fn read_cell(&self, key: &CellKey) -> Result<CellBounds, StoreError> {
        read_cell_file(&self.layout.cell_record_path(key))
    }

    /// Delete the bounds file of a cell. Returns whether a file was removed.
    pub fn delete_cell(&self, key: &CellKey) -> Result<bool, StoreError> {
        remove_file_if_exists(&self.layout.cell_record_path(key))
    }

    /// Read every per-cell bounds file in the parameters folder.
    ///
    /// Entries that cannot be read, whose name does not end in a
    /// well-formed key, or whose record is truncated, are skipped with a
    /// warning. A missing folder yields an
    /// empty scan.
    pub fn scan_cells(&self) -> Result<CellScan, StoreError> {
        let mut scan = CellScan::default();
        let dir = self.layout.parameters_dir();
        if !dir.is_dir() {
            return Ok(scan);
        }
        let prefix = self.layout.cell_record_prefix();
        for entry in fs::read_dir(&dir)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), "skipping unreadable entry: {e}");
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !stem.starts_with(&prefix) {
                continue;
            }
            let key = match CellKey::from_file_stem(stem) {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping cell file: {e}");
                    scan.skipped.push((path, SkipReason::MalformedKey(e)));
                    continue;
                }
            };
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping unreadable cell file: {e}");
                    scan.skipped.push((path, SkipReason::Unreadable(e)));
                    continue;
                }
            };
            match CellRecord::decode(&bytes) {
                Ok(record) => scan.cells.push(ScannedCell {
                    key,
                    bounds: record.bounds(),
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping cell file: {e}");
                    scan.skipped.push((path, SkipReason::Corrupt(e)));
                }
            }
        }
        scan.cells.sort_by_key(|c| c.key.index);
        Ok(scan)
    }

    pub fn content_dir_exists(&self, key: &CellKey) -> bool {
        self.layout.content_dir(key).is_dir()
    }

    /// Create the content folder of a cell. Returns whether it was created.
    pub fn ensure_content_dir(&self, key: &CellKey) -> Result<bool, StoreError> {
        let dir = self.layout.content_dir(key);
        if dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&dir)?;
        Ok(true)
    }

    /// Delete the content folder of a cell and everything in it.
    pub fn delete_content_dir(&self, key: &CellKey) -> Result<bool, StoreError> {
        let dir = self.layout.content_dir(key);
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        Ok(true)
    }

    /// Delete every per-cell content folder of this world. Returns the count removed.
    pub fn delete_all_content(&self) -> Result<usize, StoreError> {
        let grid_dir = self.layout.grid_dir();
        if !grid_dir.is_dir() {
            return Ok(0);
        }
        let prefix = self.layout.content_dir_prefix();
        let mut removed = 0;
        for entry in fs::read_dir(&grid_dir)? {
            let entry = entry?;
            let is_content = entry.file_type()?.is_dir()
                && entry.file_name().to_str().is_some_and(|n| n.starts_with(&prefix));
            if is_content {
                fs::remove_dir_all(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Delete the master record and every per-cell bounds file. Returns the
    /// count of files removed.
    pub fn delete_all_records(&self) -> Result<usize, StoreError> {
        let dir = self.layout.parameters_dir();
        if !dir.is_dir() {
            return Ok(0);
        }
        let prefix = self.layout.cell_record_prefix();
        let master = self.layout.master_path();
        let mut removed = 0;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_cell = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix));
            if (is_cell || path == master) && path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn read_cell_file(path: &Path) -> Result<CellBounds, StoreError> {
    let bytes = fs::read(path)?;
    CellRecord::decode(&bytes)
        .map(|r| r.bounds())
        .map_err(|source| StoreError::Codec {
            path: path.to_path_buf(),
            source,
        })
}

fn remove_file_if_exists(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
