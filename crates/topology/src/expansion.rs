use serde::{Deserialize, Serialize};

use crate::TopologyError;

/// Where the grid extends horizontally relative to its origin.
///
/// Discriminants are persisted in the master record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExpansionMode {
    /// Grid is centered on the origin.
    #[default]
    Center = 0,
    PositiveXZCorner = 1,
    NegativeXZCorner = 2,
    PositiveZXCorner = 3,
    NegativeZXCorner = 4,
}

impl ExpansionMode {
    pub const ALL: [ExpansionMode; 5] = [
        ExpansionMode::Center,
        ExpansionMode::PositiveXZCorner,
        ExpansionMode::NegativeXZCorner,
        ExpansionMode::PositiveZXCorner,
        ExpansionMode::NegativeZXCorner,
    ];
}

impl TryFrom<i32> for ExpansionMode {
    type Error = TopologyError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|m| *m as i32 == value)
            .ok_or(TopologyError::UnknownExpansionMode(value))
    }
}

/// Where the grid extends vertically relative to its origin.
///
/// Discriminants are persisted in the master record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExpansionLevel {
    /// Origin sits on the top face; the grid hangs below it.
    Top = 0,
    Center = 1,
    /// Origin sits on the bottom face; the grid rises above it.
    #[default]
    Bottom = 2,
}

impl ExpansionLevel {
    pub const ALL: [ExpansionLevel; 3] = [
        ExpansionLevel::Top,
        ExpansionLevel::Center,
        ExpansionLevel::Bottom,
    ];
}

impl TryFrom<i32> for ExpansionLevel {
    type Error = TopologyError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|l| *l as i32 == value)
            .ok_or(TopologyError::UnknownExpansionLevel(value))
    }
}

/// Cell edge lengths offered by the authoring tool, in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum CellSize {
    Size128 = 128,
    #[default]
    Size256 = 256,
    Size512 = 512,
    Size1024 = 1024,
    Size2048 = 2048,
}

impl CellSize {
    pub const ALL: [CellSize; 5] = [
        CellSize::Size128,
        CellSize::Size256,
        CellSize::Size512,
        CellSize::Size1024,
        CellSize::Size2048,
    ];

    pub fn units(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for CellSize {
    type Error = TopologyError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|s| s.units() == value)
            .ok_or(TopologyError::UnsupportedCellSize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_mode_discriminants_roundtrip() {
        for mode in ExpansionMode::ALL {
            assert_eq!(ExpansionMode::try_from(mode as i32).unwrap(), mode);
        }
        assert!(ExpansionMode::try_from(5).is_err());
        assert!(ExpansionMode::try_from(-1).is_err());
    }

    #[test]
    fn expansion_level_discriminants_match_persisted_values() {
        assert_eq!(ExpansionLevel::Top as i32, 0);
        assert_eq!(ExpansionLevel::Center as i32, 1);
        assert_eq!(ExpansionLevel::Bottom as i32, 2);
        assert!(matches!(
            ExpansionLevel::try_from(3),
            Err(TopologyError::UnknownExpansionLevel(3))
        ));
    }

    #[test]
    fn cell_size_from_units() {
        assert_eq!(CellSize::try_from(512).unwrap(), CellSize::Size512);
        assert!(CellSize::try_from(300).is_err());
    }
}
