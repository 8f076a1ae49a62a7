use glam::{IVec3, Vec3};
use gridstream_common::{CellBounds, CellCoord, CellKey};
use serde::{Deserialize, Serialize};

use crate::{ExpansionLevel, ExpansionMode, TopologyError};

/// Result of mapping a world position onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLocation {
    /// The cell containing the position, clamped into the grid.
    pub coord: CellCoord,
    /// Whether clamping changed the raw coordinate (position outside the world).
    pub clamped: bool,
}

/// Immutable description of the world grid.
///
/// Cells are `cell_size_xz` wide on X and Z and `cell_size_y` tall. The
/// expansion mode and level shift the grid relative to `origin`; all
/// position math is done from the resulting minimum corner.
///
/// Deserializing goes through [`GridTopology::new`], so the same checks apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TopologyFields")]
pub struct GridTopology {
    origin: Vec3,
    counts: IVec3,
    cell_size_xz: i32,
    cell_size_y: i32,
    expansion_mode: ExpansionMode,
    expansion_level: ExpansionLevel,
}

/// Unchecked serialized form of [`GridTopology`].
#[derive(Deserialize)]
struct TopologyFields {
    origin: Vec3,
    counts: IVec3,
    cell_size_xz: i32,
    cell_size_y: i32,
    expansion_mode: ExpansionMode,
    expansion_level: ExpansionLevel,
}

impl TryFrom<TopologyFields> for GridTopology {
    type Error = TopologyError;

    fn try_from(f: TopologyFields) -> Result<Self, Self::Error> {
        Self::new(
            f.origin,
            f.counts,
            f.cell_size_xz,
            f.cell_size_y,
            f.expansion_mode,
            f.expansion_level,
        )
    }
}

impl Default for GridTopology {
    /// Placeholder world used when no authored data exists: 4x4x2 cells of
    /// 256x128x256 units rising from the origin.
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            counts: IVec3::new(4, 2, 4),
            cell_size_xz: 256,
            cell_size_y: 128,
            expansion_mode: ExpansionMode::PositiveXZCorner,
            expansion_level: ExpansionLevel::Bottom,
        }
    }
}

impl GridTopology {
    /// Create a topology. `counts` is `(x, y, z)`; every count must be at
    /// least 1 and both cell sizes positive.
    pub fn new(
        origin: Vec3,
        counts: IVec3,
        cell_size_xz: i32,
        cell_size_y: i32,
        expansion_mode: ExpansionMode,
        expansion_level: ExpansionLevel,
    ) -> Result<Self, TopologyError> {
        for (axis, value) in [('x', counts.x), ('y', counts.y), ('z', counts.z)] {
            if value < 1 {
                return Err(TopologyError::InvalidCount { axis, value });
            }
        }
        if cell_size_xz <= 0 {
            return Err(TopologyError::InvalidCellSize {
                axis: "xz",
                value: cell_size_xz,
            });
        }
        if cell_size_y <= 0 {
            return Err(TopologyError::InvalidCellSize {
                axis: "y",
                value: cell_size_y,
            });
        }
        Ok(Self {
            origin,
            counts,
            cell_size_xz,
            cell_size_y,
            expansion_mode,
            expansion_level,
        })
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Cell counts as `(x, y, z)`.
    pub fn counts(&self) -> IVec3 {
        self.counts
    }

    pub fn cell_size_xz(&self) -> i32 {
        self.cell_size_xz
    }

    pub fn cell_size_y(&self) -> i32 {
        self.cell_size_y
    }

    pub fn expansion_mode(&self) -> ExpansionMode {
        self.expansion_mode
    }

    pub fn expansion_level(&self) -> ExpansionLevel {
        self.expansion_level
    }

    /// Total number of cells, valid or not.
    pub fn cell_count(&self) -> usize {
        (self.counts.x as usize) * (self.counts.y as usize) * (self.counts.z as usize)
    }

    /// Size of one cell in world units.
    pub fn cell_size(&self) -> Vec3 {
        Vec3::new(
            self.cell_size_xz as f32,
            self.cell_size_y as f32,
            self.cell_size_xz as f32,
        )
    }

    /// Size of the whole grid in world units.
    pub fn extent(&self) -> Vec3 {
        self.cell_size() * self.counts.as_vec3()
    }

    /// Horizontal shift applied by the expansion mode.
    ///
    /// The Z-first corner modes size their Z shift by the X count; persisted
    /// worlds depend on this, so it is kept as is.
    pub fn base_offset(&self) -> Vec3 {
        let size = i64::from(self.cell_size_xz);
        let span_x = size * i64::from(self.counts.x);
        let span_z = size * i64::from(self.counts.z);
        let (x, z) = match self.expansion_mode {
            ExpansionMode::Center => (-span_x / 2, -span_z / 2),
            ExpansionMode::PositiveXZCorner => (0, 0),
            ExpansionMode::NegativeXZCorner => (-span_x, 0),
            ExpansionMode::PositiveZXCorner => (0, -span_x),
            ExpansionMode::NegativeZXCorner => (-span_x, -span_x),
        };
        Vec3::new(x as f32, 0.0, z as f32)
    }

    /// Vertical shift applied by the expansion level.
    pub fn vertical_offset(&self) -> f32 {
        let total_height = i64::from(self.cell_size_y) * i64::from(self.counts.y);
        let offset = match self.expansion_level {
            ExpansionLevel::Bottom => 0,
            ExpansionLevel::Center => -total_height / 2,
            ExpansionLevel::Top => -total_height,
        };
        offset as f32
    }

    /// World-space minimum corner of cell `(0, 0, 0)`.
    pub fn min_corner(&self) -> Vec3 {
        self.origin + self.base_offset() + Vec3::new(0.0, self.vertical_offset(), 0.0)
    }

    /// Map a world position to a cell, clamping each axis into the grid.
    pub fn locate(&self, position: Vec3) -> CellLocation {
        let raw = ((position - self.min_corner()) / self.cell_size()).floor();
        let raw = IVec3::new(raw.x as i32, raw.y as i32, raw.z as i32);
        let clamped = raw.clamp(IVec3::ZERO, self.counts - IVec3::ONE);
        CellLocation {
            coord: clamped.into(),
            clamped: clamped != raw,
        }
    }

    /// Cell containing `position`, clamped into the grid. Positions outside
    /// the authored world are logged and snapped to the nearest edge cell.
    pub fn cell_coordinate_of(&self, position: Vec3) -> CellCoord {
        let location = self.locate(position);
        if location.clamped {
            tracing::debug!(
                ?position,
                coord = %location.coord,
                "observer is outside the grid, clamped to edge cell"
            );
        }
        location.coord
    }

    /// World-space center of a cell.
    pub fn world_center_of(&self, coord: CellCoord) -> Vec3 {
        let xz = i64::from(self.cell_size_xz);
        let y = i64::from(self.cell_size_y);
        let local = Vec3::new(
            (i64::from(coord.x) * xz + xz / 2) as f32,
            (i64::from(coord.y) * y + y / 2) as f32 + self.vertical_offset(),
            (i64::from(coord.z) * xz + xz / 2) as f32,
        );
        self.origin + self.base_offset() + local
    }

    /// World-space bounds of a cell.
    pub fn cell_bounds(&self, coord: CellCoord) -> CellBounds {
        CellBounds::new(self.world_center_of(coord), self.cell_size())
    }

    /// Whether `coord` addresses a cell of this grid.
    pub fn contains(&self, coord: CellCoord) -> bool {
        let v = IVec3::from(coord);
        v.cmpge(IVec3::ZERO).all() && v.cmplt(self.counts).all()
    }

    /// Clamp a coordinate into the grid.
    pub fn clamp(&self, coord: CellCoord) -> CellCoord {
        IVec3::from(coord)
            .clamp(IVec3::ZERO, self.counts - IVec3::ONE)
            .into()
    }

    /// Flat array index of a cell. Z varies fastest, then Y, then X.
    pub fn flat_index(&self, coord: CellCoord) -> Result<usize, TopologyError> {
        if !self.contains(coord) {
            return Err(TopologyError::OutOfBounds(coord));
        }
        let (cy, cz) = (self.counts.y as usize, self.counts.z as usize);
        Ok((coord.x as usize * cy + coord.y as usize) * cz + coord.z as usize)
    }

    /// Inverse of [`flat_index`](Self::flat_index).
    pub fn coord_at(&self, index: usize) -> Result<CellCoord, TopologyError> {
        let len = self.cell_count();
        if index >= len {
            return Err(TopologyError::IndexOutOfRange { index, len });
        }
        let (cy, cz) = (self.counts.y as usize, self.counts.z as usize);
        let z = index % cz;
        let y = (index / cz) % cy;
        let x = index / (cz * cy);
        Ok(CellCoord::new(x as i32, y as i32, z as i32))
    }

    /// Key (coordinate + flat index) of an in-bounds cell.
    pub fn key_of(&self, coord: CellCoord) -> Result<CellKey, TopologyError> {
        Ok(CellKey::new(coord, self.flat_index(coord)?))
    }

    /// Every cell of the grid in persisted order (x outer, y middle, z inner).
    pub fn cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        let counts = self.counts;
        (0..counts.x)
            .flat_map(move |x| (0..counts.y).flat_map(move |y| (0..counts.z).map(move |z| (x, y, z))))
            .enumerate()
            .map(|(index, (x, y, z))| CellKey::new(CellCoord::new(x, y, z), index))
    }
}
