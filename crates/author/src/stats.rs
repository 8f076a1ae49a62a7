use std::fmt;

use gridstream_topology::GridTopology;

/// Grids above this many cells should use a larger cell size.
pub const CELL_WARNING_THRESHOLD: usize = 1024;
/// Ground area (m²) above which saving and loading get slow.
pub const SIZE_WARNING_AREA: f64 = 10_000_000.0;

const SQUARE_METERS_PER_SQUARE_MILE: f64 = 2_589_988.110336;

/// Derived figures describing an authored grid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridStats {
    pub total_cells: usize,
    pub invalid_cells: usize,
    /// Ground area of valid cells on the bottom layer, in m².
    pub total_area: f64,
    pub height: i64,
    pub extent_x: i64,
    pub extent_z: i64,
}

impl GridStats {
    /// `validity` is indexed by flat cell index.
    pub fn compute(topology: &GridTopology, validity: &[bool]) -> Self {
        let cell_area = f64::from(topology.cell_size_xz()).powi(2);
        let mut stats = Self {
            total_cells: topology.cell_count(),
            height: i64::from(topology.cell_size_y()) * i64::from(topology.counts().y),
            extent_x: i64::from(topology.cell_size_xz()) * i64::from(topology.counts().x),
            extent_z: i64::from(topology.cell_size_xz()) * i64::from(topology.counts().z),
            ..Self::default()
        };
        for key in topology.cells() {
            let valid = validity.get(key.index).copied().unwrap_or(false);
            if !valid {
                stats.invalid_cells += 1;
            } else if key.coord.y == 0 {
                stats.total_area += cell_area;
            }
        }
        stats
    }

    pub fn area_km2(&self) -> f64 {
        self.total_area / 1_000_000.0
    }

    pub fn area_mi2(&self) -> f64 {
        self.total_area / SQUARE_METERS_PER_SQUARE_MILE
    }

    pub fn exceeds_cell_warning(&self) -> bool {
        self.total_cells > CELL_WARNING_THRESHOLD
    }

    pub fn exceeds_size_warning(&self) -> bool {
        self.total_area > SIZE_WARNING_AREA
    }
}

impl fmt::Display for GridStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total 2D area: {:.0} m² or {:.2} km² / {:.2} mi².",
            self.total_area,
            self.area_km2(),
            self.area_mi2()
        )?;
        writeln!(
            f,
            "Total cells: {}, disabled cells: {}.",
            self.total_cells, self.invalid_cells
        )?;
        write!(
            f,
            "Y height is {}m, X distance is {}m, Z distance is {}m.",
            self.height, self.extent_x, self.extent_z
        )
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1_024;
    const MB: u64 = 1_048_576;
    const GB: u64 = 1_073_741_824;
    let scaled = |unit: u64| bytes as f64 / unit as f64;
    if bytes >= GB {
        format!("{:.2} GB", scaled(GB))
    } else if bytes >= MB {
        format!("{:.2} MB", scaled(MB))
    } else if bytes >= KB {
        format!("{:.2} KB", scaled(KB))
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec3, Vec3};
    use gridstream_topology::{ExpansionLevel, ExpansionMode};

    fn grid(x: i32, y: i32, z: i32, size: i32) -> GridTopology {
        GridTopology::new(
            Vec3::ZERO,
            IVec3::new(x, y, z),
            size,
            128,
            ExpansionMode::Center,
            ExpansionLevel::Bottom,
        )
        .unwrap()
    }

    #[test]
    fn area_counts_valid_ground_cells_only() {
        let topology = grid(2, 2, 2, 256);
        let mut validity = vec![true; 8];
        // index 1 = (0,0,1) ground, index 2 = (0,1,0) upper layer
        validity[1] = false;
        validity[2] = false;
        let stats = GridStats::compute(&topology, &validity);
        assert_eq!(stats.total_cells, 8);
        assert_eq!(stats.invalid_cells, 2);
        assert_eq!(stats.total_area, 3.0 * 256.0 * 256.0);
        assert_eq!(stats.height, 256);
        assert_eq!((stats.extent_x, stats.extent_z), (512, 512));
    }

    #[test]
    fn warnings() {
        let big = grid(25, 4, 25, 2048);
        let stats = GridStats::compute(&big, &vec![true; big.cell_count()]);
        assert!(stats.exceeds_cell_warning());
        assert!(stats.exceeds_size_warning());
        assert!(stats.area_km2() > 1000.0);

        let small = grid(2, 1, 2, 128);
        let stats = GridStats::compute(&small, &[true; 4]);
        assert!(!stats.exceeds_cell_warning());
        assert!(!stats.exceeds_size_warning());
    }

    #[test]
    fn summary_mentions_counts() {
        let topology = grid(2, 1, 2, 256);
        let text = GridStats::compute(&topology, &[true, false, true, true]).to_string();
        assert!(text.contains("Total cells: 4, disabled cells: 1."));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2_048), "2.00 KB");
        assert_eq!(format_size(3 * 1_048_576 / 2), "1.50 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
    }
}
