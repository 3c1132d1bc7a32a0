//! Vent slot layout shared by both shells.

use case_types::vec3::Vec3;
use modeling_ops::Tool;
use serde::{Deserialize, Serialize};

/// Slot pattern through the side walls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VentParams {
    /// Candidate slots along the long walls.
    pub count_long: usize,
    /// Candidate slots along the short walls.
    pub count_short: usize,
    /// Slot length along the wall.
    pub slot_length: f64,
    /// Slot height (z).
    pub slot_width: f64,
    /// Centre-to-centre spacing.
    pub spacing: f64,
    /// Candidates closer than this to either end of the wall are dropped.
    pub corner_margin: f64,
}

impl Default for VentParams {
    fn default() -> Self {
        Self {
            count_long: 15,
            count_short: 10,
            slot_length: 8.0,
            slot_width: 2.0,
            spacing: 10.5,
            corner_margin: 15.0,
        }
    }
}

/// Centres `extent/2 + (i - (count-1)/2) * spacing`, keeping those at least
/// `margin` from both ends.
pub fn vent_positions(extent: f64, count: usize, spacing: f64, margin: f64) -> Vec<f64> {
    let mid = (count as f64 - 1.0) / 2.0;
    (0..count)
        .map(|i| extent / 2.0 + (i as f64 - mid) * spacing)
        .filter(|c| *c >= margin && *c <= extent - margin)
        .collect()
}

/// Wall a slot goes through, named in the pre-mirror frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallSide {
    /// y = 0 wall.
    Top,
    /// y = width wall.
    Bottom,
    /// x = 0 wall.
    Left,
    /// x = length wall.
    Right,
}

impl WallSide {
    pub const ALL: [WallSide; 4] = [
        WallSide::Top,
        WallSide::Bottom,
        WallSide::Left,
        WallSide::Right,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WallSide::Top => "top",
            WallSide::Bottom => "bottom",
            WallSide::Left => "left",
            WallSide::Right => "right",
        }
    }

    fn runs_along_x(&self) -> bool {
        matches!(self, WallSide::Top | WallSide::Bottom)
    }
}

/// Box outline of one slot, centred on the wall mid-plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VentSlot {
    pub side: WallSide,
    pub center: Vec3,
    /// Extent through the wall.
    pub depth: f64,
}

impl VentSlot {
    pub fn tool(&self, vents: &VentParams) -> Tool {
        let [cx, cy, cz] = self.center;
        let (len, w, d) = (vents.slot_length, vents.slot_width, self.depth);
        if self.side.runs_along_x() {
            Tool::block([cx - len / 2.0, cy - d / 2.0, cz - w / 2.0], [len, d, w])
        } else {
            Tool::block([cx - d / 2.0, cy - len / 2.0, cz - w / 2.0], [d, len, w])
        }
    }
}

/// Slots through one wall of a `length x width` shell at height `z`.
pub fn vent_slots(
    side: WallSide,
    length: f64,
    width: f64,
    wall: f64,
    z: f64,
    depth: f64,
    vents: &VentParams,
) -> Vec<VentSlot> {
    let (extent, count) = if side.runs_along_x() {
        (length, vents.count_long)
    } else {
        (width, vents.count_short)
    };
    vent_positions(extent, count, vents.spacing, vents.corner_margin)
        .into_iter()
        .map(|c| {
            let center = match side {
                WallSide::Top => [c, wall / 2.0, z],
                WallSide::Bottom => [c, width - wall / 2.0, z],
                WallSide::Left => [wall / 2.0, c, z],
                WallSide::Right => [length - wall / 2.0, c, z],
            };
            VentSlot {
                side,
                center,
                depth,
            }
        })
        .collect()
}

/// Cutting tools for the slots through one wall.
pub fn vent_tools(
    side: WallSide,
    length: f64,
    width: f64,
    wall: f64,
    z: f64,
    depth: f64,
    vents: &VentParams,
) -> Vec<Tool> {
    vent_slots(side, length, width, wall, z, depth, vents)
        .iter()
        .map(|s| s.tool(vents))
        .collect()
}
