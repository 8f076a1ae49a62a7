use gridstream_common::CellCoord;
use gridstream_topology::GridTopology;

/// The block of cells that should be resident around the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    pub center: CellCoord,
    pub last_center: CellCoord,
    pub horizontal_radius: i32,
    pub vertical_radius: i32,
}

impl ActiveWindow {
    /// In-bounds cells of the window, x outer, y middle, z inner.
    pub fn cells(&self, topology: &GridTopology) -> Vec<CellCoord> {
        let (r, rv) = (self.horizontal_radius, self.vertical_radius);
        let mut cells = Vec::new();
        for dx in -r..=r {
            for dy in -rv..=rv {
                for dz in -r..=r {
                    let cell = self.center.offset(dx, dy, dz);
                    if topology.contains(cell) {
                        cells.push(cell);
                    }
                }
            }
        }
        cells
    }

    /// Upper bound on the window size, reached when it touches no grid edge.
    pub fn max_cells(&self) -> usize {
        let side = (2 * self.horizontal_radius + 1) as usize;
        side * side * (2 * self.vertical_radius + 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec3, Vec3};
    use gridstream_topology::{ExpansionLevel, ExpansionMode};

    fn window(center: CellCoord, r: i32, rv: i32) -> ActiveWindow {
        ActiveWindow {
            center,
            last_center: center,
            horizontal_radius: r,
            vertical_radius: rv,
        }
    }

    #[test]
    fn interior_window_is_full() {
        let grid = GridTopology::new(
            Vec3::ZERO,
            IVec3::new(9, 5, 9),
            256,
            128,
            ExpansionMode::Center,
            ExpansionLevel::Bottom,
        )
        .unwrap();
        let w = window(CellCoord::new(4, 2, 4), 2, 1);
        assert_eq!(w.cells(&grid).len(), w.max_cells());
        assert_eq!(w.max_cells(), 25 * 3);
    }

    #[test]
    fn edge_window_is_clipped() {
        let grid = GridTopology::default();
        for center in grid.cells().map(|k| k.coord) {
            for (r, rv) in [(1, 0), (1, 1), (2, 1), (3, 2)] {
                let w = window(center, r, rv);
                let cells = w.cells(&grid);
                assert!(cells.len() <= w.max_cells());
                assert!(cells.iter().all(|c| grid.contains(*c)));
            }
        }
        let corner = window(CellCoord::new(0, 0, 0), 1, 0);
        assert_eq!(corner.cells(&grid).len(), 4);
    }

    #[test]
    fn window_around_1_0_1() {
        let grid = GridTopology::default();
        let cells = window(CellCoord::new(1, 0, 1), 1, 0).cells(&grid);
        let mut expected = Vec::new();
        for x in 0..3 {
            for z in 0..3 {
                expected.push(CellCoord::new(x, 0, z));
            }
        }
        assert_eq!(cells, expected);
    }
}
