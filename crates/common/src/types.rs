use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Integer address of one cell in the world grid.
///
/// Components are cell indices, not world units. A coordinate is only
/// meaningful relative to a topology, which bounds each axis to
/// `0..count`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset this coordinate by a per-axis delta.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl From<IVec3> for CellCoord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<CellCoord> for IVec3 {
    fn from(c: CellCoord) -> Self {
        IVec3::new(c.x, c.y, c.z)
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Axis-aligned world-space bounds of a cell, stored as center + size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl CellBounds {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Build bounds from a min and max corner.
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            size: max - min,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }

    /// Whether a world-space point lies inside (or on the surface of) these bounds.
    pub fn contains(&self, point: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        point.cmpge(min).all() && point.cmple(max).all()
    }
}

impl Default for CellBounds {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            size: Vec3::ZERO,
        }
    }
}

/// Opaque name + path pair naming the loadable content of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    pub name: String,
    pub path: String,
}

impl ContentRef {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_offset() {
        let c = CellCoord::new(1, 0, 1).offset(-1, 2, 3);
        assert_eq!(c, CellCoord::new(0, 2, 4));
    }

    #[test]
    fn coord_ivec_conversion() {
        let c = CellCoord::new(3, 1, 2);
        let v: IVec3 = c.into();
        assert_eq!(CellCoord::from(v), c);
    }

    #[test]
    fn bounds_min_max() {
        let b = CellBounds::new(Vec3::new(128.0, 64.0, 128.0), Vec3::new(256.0, 128.0, 256.0));
        assert_eq!(b.min(), Vec3::ZERO);
        assert_eq!(b.max(), Vec3::new(256.0, 128.0, 256.0));
        assert_eq!(CellBounds::from_min_max(b.min(), b.max()), b);
    }

    #[test]
    fn bounds_contains() {
        let b = CellBounds::from_min_max(Vec3::ZERO, Vec3::splat(10.0));
        assert!(b.contains(Vec3::splat(5.0)));
        assert!(b.contains(Vec3::splat(10.0)));
        assert!(!b.contains(Vec3::new(11.0, 5.0, 5.0)));
    }
}
