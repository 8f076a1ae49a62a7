use std::path::Path;

use glam::{IVec3, Vec3};
use gridstream_persist::MasterRecord;
use gridstream_topology::{CellSize, ExpansionLevel, ExpansionMode, GridTopology, TopologyError};
use serde::{Deserialize, Serialize};

use crate::AuthorError;

pub const WORLD_SIZE_XZ_RANGE: (i32, i32) = (2, 25);
pub const WORLD_SIZE_Y_RANGE: (i32, i32) = (1, 4);
pub const LOAD_RADIUS_RANGE: (f32, f32) = (0.0, 3000.0);

/// The persisted shape of the grid, as edited by a designer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub world_size_x: i32,
    pub world_size_z: i32,
    pub world_size_y: i32,
    pub origin: Vec3,
    pub cell_size_xz: CellSize,
    pub cell_size_y: CellSize,
    pub expansion_mode: ExpansionMode,
    pub expansion_level: ExpansionLevel,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            world_size_x: 2,
            world_size_z: 2,
            world_size_y: 2,
            origin: Vec3::ZERO,
            cell_size_xz: CellSize::Size256,
            cell_size_y: CellSize::Size256,
            expansion_mode: ExpansionMode::Center,
            expansion_level: ExpansionLevel::Bottom,
        }
    }
}

impl GridSettings {
    /// Clamp world sizes into the ranges the tool supports.
    pub fn clamped(self) -> Self {
        let (xz_min, xz_max) = WORLD_SIZE_XZ_RANGE;
        let (y_min, y_max) = WORLD_SIZE_Y_RANGE;
        Self {
            world_size_x: self.world_size_x.clamp(xz_min, xz_max),
            world_size_z: self.world_size_z.clamp(xz_min, xz_max),
            world_size_y: self.world_size_y.clamp(y_min, y_max),
            ..self
        }
    }

    pub fn to_topology(&self) -> Result<GridTopology, TopologyError> {
        GridTopology::new(
            self.origin,
            IVec3::new(self.world_size_x, self.world_size_y, self.world_size_z),
            self.cell_size_xz.units(),
            self.cell_size_y.units(),
            self.expansion_mode,
            self.expansion_level,
        )
    }

    /// Settings described by a persisted master record.
    pub fn from_master(record: &MasterRecord) -> Result<Self, TopologyError> {
        Ok(Self {
            world_size_x: record.count_x,
            world_size_z: record.count_z,
            world_size_y: record.count_y,
            origin: record.origin,
            cell_size_xz: CellSize::try_from(record.cell_size_xz)?,
            cell_size_y: CellSize::try_from(record.cell_size_y)?,
            expansion_mode: record.expansion_mode,
            expansion_level: record.expansion_level,
        })
    }

    /// First field that differs from what is on disk, as
    /// `(field, on_disk, in_memory)`. Fields are checked in the order a
    /// designer is most likely to have changed them.
    pub fn first_mismatch(&self, on_disk: &MasterRecord) -> Option<(&'static str, String, String)> {
        let sizes = (self.cell_size_xz.units(), self.cell_size_y.units());
        if (on_disk.cell_size_xz, on_disk.cell_size_y) != sizes {
            return Some((
                "cell size",
                format!("{}/{}", on_disk.cell_size_xz, on_disk.cell_size_y),
                format!("{}/{}", sizes.0, sizes.1),
            ));
        }
        if on_disk.origin != self.origin {
            return Some(("origin", on_disk.origin.to_string(), self.origin.to_string()));
        }
        if on_disk.expansion_level != self.expansion_level {
            return Some((
                "expansion level",
                format!("{:?}", on_disk.expansion_level),
                format!("{:?}", self.expansion_level),
            ));
        }
        if on_disk.expansion_mode != self.expansion_mode {
            return Some((
                "expansion mode",
                format!("{:?}", on_disk.expansion_mode),
                format!("{:?}", self.expansion_mode),
            ));
        }
        let disk_size = (on_disk.count_x, on_disk.count_y, on_disk.count_z);
        let size = (self.world_size_x, self.world_size_y, self.world_size_z);
        if disk_size != size {
            return Some(("world size", format!("{disk_size:?}"), format!("{size:?}")));
        }
        None
    }
}

/// Editor-session preferences. Persisted separately from the grid itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPrefs {
    /// Draw the grid preview.
    pub preview: bool,
    /// Only keep content loaded near the editor camera.
    pub partial_load: bool,
    /// Distance from the camera within which content is loaded.
    pub load_radius: f32,
    /// Leave content loaded when the authoring session closes.
    pub keep_loaded: bool,
    pub dismissed_cell_warning: bool,
}

impl Default for EditorPrefs {
    fn default() -> Self {
        Self {
            preview: true,
            partial_load: true,
            load_radius: 100.0,
            keep_loaded: true,
            dismissed_cell_warning: false,
        }
    }
}

impl EditorPrefs {
    /// Load prefs from a JSON file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AuthorError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(Self::default());
        }
        let prefs: Self = serde_json::from_reader(std::fs::File::open(path)?)?;
        Ok(prefs.clamped())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AuthorError> {
        serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?;
        Ok(())
    }

    pub fn clamped(self) -> Self {
        let (min, max) = LOAD_RADIUS_RANGE;
        Self {
            load_radius: self.load_radius.clamp(min, max),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_clamp_world_size() {
        let s = GridSettings {
            world_size_x: 1,
            world_size_z: 40,
            world_size_y: 9,
            ..GridSettings::default()
        }
        .clamped();
        assert_eq!((s.world_size_x, s.world_size_z, s.world_size_y), (2, 25, 4));
    }

    #[test]
    fn settings_roundtrip_through_master_record() {
        let settings = GridSettings {
            world_size_x: 7,
            world_size_z: 3,
            world_size_y: 2,
            origin: Vec3::new(10.0, 0.0, -5.0),
            cell_size_xz: CellSize::Size1024,
            cell_size_y: CellSize::Size128,
            expansion_mode: ExpansionMode::NegativeXZCorner,
            expansion_level: ExpansionLevel::Top,
        };
        let record = MasterRecord::from_topology(&settings.to_topology().unwrap());
        assert_eq!(GridSettings::from_master(&record).unwrap(), settings);
        assert!(settings.first_mismatch(&record).is_none());
    }

    #[test]
    fn mismatch_reports_cell_size_first() {
        let on_disk = MasterRecord::from_topology(&GridSettings::default().to_topology().unwrap());
        let changed = GridSettings {
            cell_size_xz: CellSize::Size512,
            world_size_x: 5,
            ..GridSettings::default()
        };
        let (field, disk, mem) = changed.first_mismatch(&on_disk).unwrap();
        assert_eq!(field, "cell size");
        assert_eq!(disk, "256/256");
        assert_eq!(mem, "512/256");
    }

    #[test]
    fn mismatch_detects_each_field() {
        let base = GridSettings::default();
        let on_disk = MasterRecord::from_topology(&base.to_topology().unwrap());
        let cases = [
            ("origin", GridSettings { origin: Vec3::X, ..base }),
            ("expansion level", GridSettings { expansion_level: ExpansionLevel::Top, ..base }),
            ("expansion mode", GridSettings { expansion_mode: ExpansionMode::PositiveXZCorner, ..base }),
            ("world size", GridSettings { world_size_y: 3, ..base }),
        ];
        for (expected, settings) in cases {
            assert_eq!(settings.first_mismatch(&on_disk).unwrap().0, expected);
        }
    }

    #[test]
    fn unsupported_cell_size_on_disk() {
        let mut record = MasterRecord::from_topology(&GridSettings::default().to_topology().unwrap());
        record.cell_size_xz = 300;
        assert!(matches!(
            GridSettings::from_master(&record),
            Err(TopologyError::UnsupportedCellSize(300))
        ));
    }

    #[test]
    fn prefs_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prefs.json");
        assert_eq!(EditorPrefs::load(&path).unwrap(), EditorPrefs::default());

        let prefs = EditorPrefs {
            partial_load: false,
            load_radius: 750.0,
            ..EditorPrefs::default()
        };
        prefs.save(&path).unwrap();
        assert_eq!(EditorPrefs::load(&path).unwrap(), prefs);
    }

    #[test]
    fn prefs_load_clamps_radius() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prefs.json");
        std::fs::write(&path, r#"{ "load_radius": 99999.0 }"#).unwrap();
        let prefs = EditorPrefs::load(&path).unwrap();
        assert_eq!(prefs.load_radius, 3000.0);
        assert!(prefs.preview);
    }
}
