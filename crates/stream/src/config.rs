use serde::{Deserialize, Serialize};

pub const HORIZONTAL_RADIUS_RANGE: (i32, i32) = (1, 10);
pub const VERTICAL_RADIUS_RANGE: (i32, i32) = (0, 4);

/// Streaming configuration: window radii and how often the observer cell is re-sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Radius (in cells) on X and Z. 1 = 3x3, 2 = 5x5. Large radii with large
    /// cells load a lot of content.
    pub horizontal_radius: i32,
    /// Radius (in cells) on Y.
    pub vertical_radius: i32,
    /// Ticks to wait after a cell change before sampling the observer again.
    pub cell_change_cooldown_ticks: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            horizontal_radius: 1,
            vertical_radius: 1,
            cell_change_cooldown_ticks: 100,
        }
    }
}

impl StreamConfig {
    /// Clamp radii into their supported ranges, warning on each change.
    pub fn clamped(self) -> Self {
        let horizontal_radius = clamp_field(
            "horizontal_radius",
            self.horizontal_radius,
            HORIZONTAL_RADIUS_RANGE,
        );
        let vertical_radius =
            clamp_field("vertical_radius", self.vertical_radius, VERTICAL_RADIUS_RANGE);
        Self {
            horizontal_radius,
            vertical_radius,
            ..self
        }
    }
}

fn clamp_field(name: &str, value: i32, (min, max): (i32, i32)) -> i32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::warn!(field = name, value, clamped, "stream config value out of range");
    }
    clamped
}
