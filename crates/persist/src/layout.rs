//! Where each persisted piece of a world lives on disk.
//!
//! ```text
//! <root>/GridData_<world>/
//!   Grid_Parameters/
//!     <world>_MasterGridData.bin
//!     <world>_Cell_<x,z,y,index>.bin
//!   <world>_ComplexData_<x,z,y,index>/
//! ```

use std::path::{Path, PathBuf};

use gridstream_common::{CellKey, ContentRef};

pub const PARAMETERS_DIR: &str = "Grid_Parameters";
pub const RECORD_EXTENSION: &str = "bin";

/// Path scheme for one world's grid data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    root: PathBuf,
    world: String,
}

impl GridLayout {
    pub fn new(root: impl Into<PathBuf>, world: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            world: world.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    /// Name of the grid folder relative to the root.
    pub fn grid_dir_name(&self) -> String {
        format!("GridData_{}", self.world)
    }

    pub fn grid_dir(&self) -> PathBuf {
        self.root.join(self.grid_dir_name())
    }

    pub fn parameters_dir(&self) -> PathBuf {
        self.grid_dir().join(PARAMETERS_DIR)
    }

    pub fn master_path(&self) -> PathBuf {
        self.parameters_dir()
            .join(format!("{}_MasterGridData.{RECORD_EXTENSION}", self.world))
    }

    /// Prefix shared by every per-cell bounds file stem.
    pub fn cell_record_prefix(&self) -> String {
        format!("{}_Cell_", self.world)
    }

    pub fn cell_record_stem(&self, key: &CellKey) -> String {
        format!("{}{key}", self.cell_record_prefix())
    }

    pub fn cell_record_path(&self, key: &CellKey) -> PathBuf {
        self.parameters_dir()
            .join(format!("{}.{RECORD_EXTENSION}", self.cell_record_stem(key)))
    }

    /// Prefix shared by every per-cell content folder name.
    pub fn content_dir_prefix(&self) -> String {
        format!("{}_ComplexData_", self.world)
    }

    pub fn content_dir_name(&self, key: &CellKey) -> String {
        format!("{}{key}", self.content_dir_prefix())
    }

    pub fn content_dir(&self, key: &CellKey) -> PathBuf {
        self.grid_dir().join(self.content_dir_name(key))
    }

    /// Content ref of a cell: the sub-scene inside its content folder,
    /// addressed relative to the root.
    pub fn content_ref(&self, key: &CellKey) -> ContentRef {
        let name = format!("{}_SubScene", self.cell_record_stem(key));
        let path = format!(
            "{}/{}/{name}",
            self.grid_dir_name(),
            self.content_dir_name(key)
        );
        ContentRef::new(name, path)
    }
}
