//! Primary dimensions and the quantities derived from them.
//!
//! Primary inputs are plain serde structs so partial overrides can be read from JSON.
//! Derived dimensions are computed exactly once, inside [`Parametrics::new`], and are
//! only reachable through a shared reference afterwards.

use case_types::vec3::Vec3;
use case_types::{Aabb, MirrorPlane, Rect2};
use serde::{Deserialize, Serialize};

use crate::layout::VentParams;

/// Cavity span for a board dimension: board plus clearance on both sides.
pub fn cavity(board: f64, clearance: f64) -> f64 {
    board + 2.0 * clearance
}

/// Outer span around a cavity. The single place `outer = inner + 2 * wall` is written.
pub fn envelope(inner: f64, wall: f64) -> f64 {
    inner + 2.0 * wall
}

/// Primary inputs that know how to derive their dimensions.
pub trait Derive {
    type Dims;

    fn derive(&self) -> Self::Dims;
}

/// A primary parameter set frozen together with its derived dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Parametrics<P, D> {
    params: P,
    dims: D,
}

impl<P, D> Parametrics<P, D>
where
    P: Derive<Dims = D>,
{
    pub fn new(params: P) -> Self {
        let dims = params.derive();
        Self { params, dims }
    }
}

impl<P, D> Parametrics<P, D> {
    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn dims(&self) -> &D {
        &self.dims
    }
}

pub type FrontParametrics = Parametrics<FrontParams, FrontDims>;
pub type BackParametrics = Parametrics<BackParams, BackDims>;

/// Slot-through-wall overshoot on each side so a cut never shares a face with the wall.
pub const THROUGH_OVERSHOOT: f64 = 1.0;

/// PCB mounting hole pattern, relative to the board corner.
pub const PCB_MOUNT_HOLES: [[f64; 2]; 4] = [[3.5, 3.5], [3.5, 86.0], [129.5, 3.5], [129.5, 86.0]];

// ---------------------------------------------------------------------------
// Front (display) shell
// ---------------------------------------------------------------------------

/// Primary inputs of the front display shell, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontParams {
    pub pcb_length: f64,
    pub pcb_width: f64,
    pub pcb_thickness: f64,
    pub pcb_clearance: f64,
    pub pcb_mount_holes: [[f64; 2]; 4],

    pub face_thickness: f64,
    pub wall_thickness: f64,
    /// Room between the face and the rim for the display stack.
    pub display_clearance: f64,

    pub standoff_height: f64,
    pub standoff_diameter: f64,
    pub standoff_hole_diameter: f64,

    /// Display module mounting holes, board coordinates.
    pub display_holes: [[f64; 2]; 4],
    /// Opening centre offset in x from the middle of the display holes.
    pub display_x_offset: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub display_fillet_radius: f64,
    /// Margin around the mirrored display opening kept free of inner fillets.
    pub display_exclusion_margin: f64,

    pub ldr_diameter: f64,
    /// LDR centre, board coordinates.
    pub ldr_position: [f64; 2],
    pub include_ldr_tube: bool,
    pub ldr_tube_outer_diameter: f64,
    pub ldr_tube_inner_diameter: f64,
    pub ldr_tube_height: f64,

    /// Sensor footprint before the 90 degree turn.
    pub sensor_opening: [f64; 2],
    /// Final frame: inside right wall to the right edge of the opening.
    pub sensor_right_offset: f64,
    /// Final frame: inside top wall to the top edge of the opening.
    pub sensor_top_offset: f64,

    pub include_sensor_lattice: bool,
    pub lattice_bar_thickness: f64,
    pub lattice_bar_length: f64,
    pub lattice_spacing: f64,
    /// Bars per diagonal direction.
    pub lattice_bars: usize,

    pub include_sensor_box: bool,
    pub sensor_box_width: f64,
    pub sensor_box_height: f64,
    pub sensor_box_depth: f64,
    pub sensor_box_wall: f64,
    /// Final frame: inside right wall to the inner face of the box's left wall.
    pub sensor_box_left_offset: f64,
    /// Final frame: inside top wall to the inner face of the box's bottom wall.
    pub sensor_box_bottom_offset: f64,

    pub corner_radius: f64,
    pub face_edge_radius: f64,
    pub inner_face_edge_radius: f64,

    pub include_vents: bool,
    pub vents: VentParams,

    pub latch_hole_diameter: f64,
    /// Latch hole centre below the rim.
    pub latch_drop: f64,

    pub seating_lip_depth: f64,
    pub seating_lip_height: f64,
}

impl Default for FrontParams {
    fn default() -> Self {
        Self {
            pcb_length: 133.0,
            pcb_width: 89.5,
            pcb_thickness: 1.6,
            pcb_clearance: 3.0,
            pcb_mount_holes: PCB_MOUNT_HOLES,
            face_thickness: 1.8,
            wall_thickness: 5.0,
            display_clearance: 18.9,
            standoff_height: 17.3,
            standoff_diameter: 15.0,
            standoff_hole_diameter: 2.7,
            display_holes: [[45.5, 16.1], [45.5, 65.0], [128.61, 16.1], [128.61, 65.0]],
            display_x_offset: 5.6,
            display_width: 68.0,
            display_height: 50.0,
            display_fillet_radius: 1.0,
            display_exclusion_margin: 5.0,
            ldr_diameter: 5.5,
            ldr_position: [104.3, 6.5],
            include_ldr_tube: true,
            ldr_tube_outer_diameter: 8.0,
            ldr_tube_inner_diameter: 6.0,
            ldr_tube_height: 10.0,
            sensor_opening: [12.5, 6.0],
            sensor_right_offset: 11.5,
            sensor_top_offset: 15.83,
            include_sensor_lattice: true,
            lattice_bar_thickness: 0.4,
            lattice_bar_length: 15.0,
            lattice_spacing: 2.5,
            lattice_bars: 7,
            include_sensor_box: true,
            sensor_box_width: 20.0,
            sensor_box_height: 32.2,
            sensor_box_depth: 17.5,
            sensor_box_wall: 1.5,
            sensor_box_left_offset: 19.0,
            sensor_box_bottom_offset: 30.58,
            corner_radius: 4.0,
            face_edge_radius: 4.0,
            inner_face_edge_radius: 0.5,
            include_vents: true,
            vents: VentParams::default(),
            latch_hole_diameter: 2.0,
            latch_drop: 3.0,
            seating_lip_depth: 2.2,
            seating_lip_height: 6.2,
        }
    }
}

/// Everything the front recipe places, derived from [`FrontParams`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct FrontDims {
    pub inner_length: f64,
    pub inner_width: f64,
    pub case_length: f64,
    pub case_width: f64,
    pub case_height: f64,
    /// Cavity footprint, pre-mirror.
    pub inner_rect: Rect2,
    /// Outer footprint, pre-mirror.
    pub outer_rect: Rect2,
    /// Display opening footprint, pre-mirror.
    pub display_rect: Rect2,
    /// Mirrored display opening grown by the exclusion margin.
    pub display_exclusion: Rect2,
    pub ldr_center: [f64; 2],
    /// Centre of the sensor opening after its 90 degree turn.
    pub sensor_center: [f64; 2],
    /// Sensor protection box walls, pre-mirror.
    pub sensor_box_left_wall: Aabb,
    pub sensor_box_bottom_wall: Aabb,
    pub standoff_centers: Vec<[f64; 2]>,
    /// Latch holes at mid-width, this far up.
    pub latch_z: f64,
    pub latch_y: f64,
    /// Recess boxes along the four inner rim edges.
    pub seating_lip: Vec<Aabb>,
    pub vent_z: f64,
    pub vent_depth: f64,
}

impl Derive for FrontParams {
    type Dims = FrontDims;

    fn derive(&self) -> FrontDims {
        let wall = self.wall_thickness;
        let inner_length = cavity(self.pcb_length, self.pcb_clearance);
        let inner_width = cavity(self.pcb_width, self.pcb_clearance);
        let case_length = envelope(inner_length, wall);
        let case_width = envelope(inner_width, wall);
        let case_height = self.face_thickness + self.display_clearance;
        // Board coordinates start at the inside wall plus clearance.
        let board = wall + self.pcb_clearance;

        let holes = &self.display_holes;
        let display_cx = (holes[0][0] + holes[3][0]) / 2.0 + self.display_x_offset;
        let display_cy = (holes[0][1] + holes[3][1]) / 2.0;
        let display_rect = Rect2::from_origin_size(
            [
                board + display_cx - self.display_width / 2.0,
                board + display_cy - self.display_height / 2.0,
            ],
            [self.display_width, self.display_height],
        );
        let display_exclusion = display_rect
            .mirrored_x()
            .expanded(self.display_exclusion_margin);

        // Opening is turned 90 degrees, so its x extent is the footprint's short side.
        let [open_long, open_short] = self.sensor_opening;
        let sensor_center = [
            wall + self.sensor_right_offset + open_short / 2.0,
            case_width - wall - self.sensor_top_offset - open_long / 2.0,
        ];

        let (left_wall, bottom_wall) = self.sensor_box_walls(case_width);

        let standoff_centers = self
            .pcb_mount_holes
            .iter()
            .map(|h| [board + h[0], board + h[1]])
            .collect();

        let lip_z = case_height - self.seating_lip_height;
        let (d, lh) = (self.seating_lip_depth, self.seating_lip_height);
        let seating_lip = vec![
            Aabb::from_origin_size([wall, case_width - wall - d, lip_z], [inner_length, d, lh]),
            Aabb::from_origin_size([wall, wall, lip_z], [inner_length, d, lh]),
            Aabb::from_origin_size([wall, wall, lip_z], [d, inner_width, lh]),
            Aabb::from_origin_size(
                [case_length - wall - d, wall, lip_z],
                [d, inner_width, lh],
            ),
        ];

        FrontDims {
            inner_length,
            inner_width,
            case_length,
            case_width,
            case_height,
            inner_rect: Rect2::from_corners([wall, wall], [case_length - wall, case_width - wall]),
            outer_rect: Rect2::from_corners([0.0, 0.0], [case_length, case_width]),
            display_rect,
            display_exclusion,
            ldr_center: [board + self.ldr_position[0], board + self.ldr_position[1]],
            sensor_center,
            sensor_box_left_wall: left_wall,
            sensor_box_bottom_wall: bottom_wall,
            standoff_centers,
            latch_z: case_height - self.latch_drop,
            latch_y: case_width / 2.0,
            seating_lip,
            vent_z: case_height / 2.0,
            vent_depth: wall + 2.0 * THROUGH_OVERSHOOT,
        }
    }
}

impl FrontParams {
    /// The protection box is placed by offsets from the inside right and top walls of
    /// the finished (mirrored) shell; x spans are mapped back through the mirror plane.
    fn sensor_box_walls(&self, case_width: f64) -> (Aabb, Aabb) {
        let mirror = MirrorPlane::default();
        let t = self.sensor_box_wall;
        let depth = self.sensor_box_depth;

        let inside_right = -self.wall_thickness;
        let inside_top = case_width - self.wall_thickness;

        let left_inner = inside_right - self.sensor_box_left_offset;
        let left_outer = left_inner - t;
        let bottom_inner = inside_top - self.sensor_box_bottom_offset;
        let bottom_outer = bottom_inner - t;

        let (lx0, lx1) = mirror.to_pre_mirror_span(left_outer, left_inner);
        let left = Aabb::new(
            [lx0, bottom_outer, 0.0],
            [lx1, bottom_outer + self.sensor_box_height, depth],
        );
        // Bottom wall runs from the inside right wall to the outer face of the left wall.
        let (bx0, bx1) = mirror.to_pre_mirror_span(left_outer, inside_right);
        let bottom = Aabb::new([bx0, bottom_outer, 0.0], [bx1, bottom_inner, depth]);
        (left, bottom)
    }
}

// ---------------------------------------------------------------------------
// Back (wall) shell
// ---------------------------------------------------------------------------

/// Primary inputs of the wall-mounted back shell, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackParams {
    pub pcb_length: f64,
    pub pcb_width: f64,
    pub pcb_thickness: f64,
    pub pcb_clearance: f64,
    pub pcb_mount_holes: [[f64; 2]; 4],

    pub wall_thickness: f64,
    pub bottom_thickness: f64,
    pub standoff_height: f64,
    pub component_height: f64,
    /// Cavity cut height beyond the rim.
    pub cavity_overshoot: f64,

    pub wire_hole_diameter: f64,

    pub mount_hole_diameter: f64,
    pub mount_spacing: [f64; 2],
    /// Single-gang electrical box screw spacing (3.5 in).
    pub gang_spacing: f64,
    pub screw_head_diameter: f64,
    pub screw_head_height: f64,
    /// Channel height beyond the inner lip top.
    pub screw_channel_margin: f64,

    pub corner_radius: f64,

    pub include_vents: bool,
    pub vents: VentParams,
    /// Slot extent through the wall; long enough to reach through the inner lip.
    pub vent_depth: f64,

    pub include_back_lip: bool,
    pub back_lip_depth: f64,
    pub back_lip_height: f64,
    pub add_print_supports: bool,
    pub support_thickness: f64,
    /// Uncut lip left above snap slots and support ribs.
    pub lip_top_margin: f64,

    pub snap_tab_width: f64,
    pub snap_tab_length: f64,
    pub snap_tab_height: f64,
    pub snap_tab_undercut: f64,
    pub snap_slot_clearance: f64,

    pub include_inner_lip: bool,
    pub inner_lip_width: f64,
    /// Inner lip height above the rim.
    pub inner_lip_protrusion: f64,
    pub pin_hole_diameter: f64,
}

impl Default for BackParams {
    fn default() -> Self {
        Self {
            pcb_length: 133.0,
            pcb_width: 89.5,
            pcb_thickness: 1.6,
            pcb_clearance: 3.0,
            pcb_mount_holes: PCB_MOUNT_HOLES,
            wall_thickness: 9.0,
            bottom_thickness: 4.0,
            standoff_height: 4.0,
            component_height: 20.0,
            cavity_overshoot: 1.0,
            wire_hole_diameter: 22.0,
            mount_hole_diameter: 4.0,
            mount_spacing: [83.0, 60.0],
            gang_spacing: 88.9,
            screw_head_diameter: 8.0,
            screw_head_height: 10.0,
            screw_channel_margin: 1.0,
            corner_radius: 4.0,
            include_vents: true,
            vents: VentParams::default(),
            vent_depth: 35.0,
            include_back_lip: false,
            back_lip_depth: 1.5,
            back_lip_height: 1.5,
            add_print_supports: false,
            support_thickness: 0.6,
            lip_top_margin: 0.5,
            snap_tab_width: 12.0,
            snap_tab_length: 6.0,
            snap_tab_height: 2.5,
            snap_tab_undercut: 1.0,
            snap_slot_clearance: 0.2,
            include_inner_lip: true,
            inner_lip_width: 2.0,
            inner_lip_protrusion: 6.0,
            pin_hole_diameter: 1.0,
        }
    }
}

/// Ring-shaped seating lip near the rim: outer box minus inner box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LipRing {
    pub outer: Aabb,
    pub inner: Aabb,
}

/// Through-x pin hole in the inner lip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PinHole {
    pub origin: Vec3,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct BackDims {
    pub inner_length: f64,
    pub inner_width: f64,
    pub case_length: f64,
    pub case_width: f64,
    pub case_height: f64,
    pub cavity_height: f64,
    pub wire_center: [f64; 2],
    pub mount_holes: Vec<[f64; 2]>,
    pub gang_holes: Vec<[f64; 2]>,
    /// Inner lip height measured from the floor.
    pub lip_total_height: f64,
    /// Screw channel height, measured from the floor; clears the inner lip.
    pub screw_channel_height: f64,
    pub inner_lip: Vec<Aabb>,
    pub pin_holes: Vec<PinHole>,
    pub back_lip: Option<LipRing>,
    pub support_ribs: Vec<Aabb>,
    pub snap_slots: Vec<Aabb>,
    pub vent_z: f64,
}

impl Derive for BackParams {
    type Dims = BackDims;

    fn derive(&self) -> BackDims {
        let wall = self.wall_thickness;
        let inner_length = cavity(self.pcb_length, self.pcb_clearance);
        let inner_width = cavity(self.pcb_width, self.pcb_clearance);
        let case_length = envelope(inner_length, wall);
        let case_width = envelope(inner_width, wall);
        let case_height = self.bottom_thickness
            + self.standoff_height
            + self.pcb_thickness
            + self.component_height;
        let (cx, cy) = (case_length / 2.0, case_width / 2.0);

        let [sx, sy] = self.mount_spacing;
        let mut mount_holes = Vec::with_capacity(4);
        for dx in [-sx / 2.0, sx / 2.0] {
            for dy in [-sy / 2.0, sy / 2.0] {
                mount_holes.push([cx + dx, cy + dy]);
            }
        }
        let gang_holes = vec![
            [cx, cy - self.gang_spacing / 2.0],
            [cx, cy + self.gang_spacing / 2.0],
        ];

        let lip_total_height = (case_height - self.bottom_thickness) + self.inner_lip_protrusion;
        let lw = self.inner_lip_width;
        let floor = self.bottom_thickness;
        let inner_lip = vec![
            Aabb::from_origin_size(
                [wall, case_width - wall - lw, floor],
                [inner_length, lw, lip_total_height],
            ),
            Aabb::from_origin_size([wall, wall, floor], [inner_length, lw, lip_total_height]),
            Aabb::from_origin_size([wall, wall, floor], [lw, inner_width, lip_total_height]),
            Aabb::from_origin_size(
                [case_length - wall - lw, wall, floor],
                [lw, inner_width, lip_total_height],
            ),
        ];

        let pin_z = case_height + self.inner_lip_protrusion / 2.0;
        let pin_length = lw + 3.0;
        let pin_holes = vec![
            PinHole {
                origin: [wall - 0.5, cy, pin_z],
                length: pin_length,
            },
            PinHole {
                origin: [case_length - wall - lw - 1.5, cy, pin_z],
                length: pin_length,
            },
        ];

        let (back_lip, support_ribs, snap_slots) = if self.include_back_lip {
            self.back_lip_parts(case_length, case_width, case_height)
        } else {
            (None, Vec::new(), Vec::new())
        };

        BackDims {
            inner_length,
            inner_width,
            case_length,
            case_width,
            case_height,
            cavity_height: case_height - self.bottom_thickness + self.cavity_overshoot,
            wire_center: [cx, cy],
            mount_holes,
            gang_holes,
            lip_total_height,
            screw_channel_height: lip_total_height + self.screw_channel_margin,
            inner_lip,
            pin_holes,
            back_lip,
            support_ribs,
            snap_slots,
            vent_z: case_height / 2.0,
        }
    }
}

impl BackParams {
    fn back_lip_parts(
        &self,
        length: f64,
        width: f64,
        height: f64,
    ) -> (Option<LipRing>, Vec<Aabb>, Vec<Aabb>) {
        let wall = self.wall_thickness;
        let (d, h) = (self.back_lip_depth, self.back_lip_height);
        let ring = LipRing {
            outer: Aabb::from_origin_size(
                [wall, wall, height - h],
                [length - 2.0 * wall, width - 2.0 * wall, h],
            ),
            inner: Aabb::from_origin_size(
                [wall + d, wall + d, height - h - 0.1],
                [length - 2.0 * (wall + d), width - 2.0 * (wall + d), h + 0.2],
            ),
        };

        let mut ribs = Vec::new();
        if self.add_print_supports {
            let t = self.support_thickness;
            let rib_h = h - self.lip_top_margin;
            let z = height - h - rib_h;
            let run_x = length - 2.0 * (wall + d);
            let run_y = width - 2.0 * (wall + d);
            ribs.push(Aabb::from_origin_size([wall + d, wall + d, z], [run_x, t, rib_h]));
            ribs.push(Aabb::from_origin_size(
                [wall + d, width - wall - d - t, z],
                [run_x, t, rib_h],
            ));
            ribs.push(Aabb::from_origin_size([wall + d, wall + d, z], [t, run_y, rib_h]));
            ribs.push(Aabb::from_origin_size(
                [length - wall - d - t, wall + d, z],
                [t, run_y, rib_h],
            ));
        }

        let slot_w = self.snap_tab_width + 2.0 * self.snap_slot_clearance;
        let slot_l = self.snap_tab_length + self.snap_slot_clearance;
        let slot_h = self.snap_tab_height + self.snap_tab_undercut + self.snap_slot_clearance;
        let z = height - slot_h - self.lip_top_margin;
        let (mx, my) = (length / 2.0, width / 2.0);
        let slots = vec![
            Aabb::from_origin_size([mx - slot_w / 2.0, wall, z], [slot_w, slot_l, slot_h]),
            Aabb::from_origin_size(
                [mx - slot_w / 2.0, width - wall - slot_l, z],
                [slot_w, slot_l, slot_h],
            ),
            Aabb::from_origin_size([wall, my - slot_w / 2.0, z], [slot_l, slot_w, slot_h]),
            Aabb::from_origin_size(
                [length - wall - slot_l, my - slot_w / 2.0, z],
                [slot_l, slot_w, slot_h],
            ),
        ];
        (Some(ring), ribs, slots)
    }
}
