//! Cross-checks between the two independent parameter sets.
//!
//! The shells share no storage; board footprint, vent pattern and lip fit only agree by
//! convention, so drift is reported rather than prevented.

use std::fmt;

use serde::Serialize;

use crate::params::{BackParametrics, FrontParametrics};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatingWarning {
    pub quantity: &'static str,
    pub front: f64,
    pub back: f64,
    pub note: &'static str,
}

impl fmt::Display for MatingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: front {} vs back {} ({})",
            self.quantity, self.front, self.back, self.note
        )
    }
}

/// Compare the conventions the two shells rely on. An empty result means they mate.
pub fn check_mating(front: &FrontParametrics, back: &BackParametrics) -> Vec<MatingWarning> {
    let (fp, fd) = (front.params(), front.dims());
    let (bp, bd) = (back.params(), back.dims());
    let mut out = Vec::new();
    let mut same = |quantity: &'static str, a: f64, b: f64| {
        if (a - b).abs() > EPS {
            out.push(MatingWarning {
                quantity,
                front: a,
                back: b,
                note: "must match",
            });
        }
    };

    same("pcb_length", fp.pcb_length, bp.pcb_length);
    same("pcb_width", fp.pcb_width, bp.pcb_width);
    same("pcb_thickness", fp.pcb_thickness, bp.pcb_thickness);
    same("pcb_clearance", fp.pcb_clearance, bp.pcb_clearance);
    for (a, b) in fp.pcb_mount_holes.iter().zip(&bp.pcb_mount_holes) {
        same("pcb_mount_hole_x", a[0], b[0]);
        same("pcb_mount_hole_y", a[1], b[1]);
    }
    same("vent_spacing", fp.vents.spacing, bp.vents.spacing);
    same("vent_slot_length", fp.vents.slot_length, bp.vents.slot_length);
    same("vent_slot_width", fp.vents.slot_width, bp.vents.slot_width);
    same("corner_radius", fp.corner_radius, bp.corner_radius);
    // The back lip's outer faces sit on the front's inner walls.
    same(
        "inner_half_length",
        fd.inner_length / 2.0,
        bd.case_length / 2.0 - bp.wall_thickness,
    );
    same(
        "inner_half_width",
        fd.inner_width / 2.0,
        bd.case_width / 2.0 - bp.wall_thickness,
    );

    if bp.include_inner_lip {
        if bp.inner_lip_width > fp.seating_lip_depth {
            out.push(MatingWarning {
                quantity: "lip_width",
                front: fp.seating_lip_depth,
                back: bp.inner_lip_width,
                note: "back lip wider than the front recess",
            });
        }
        if bp.inner_lip_protrusion > fp.seating_lip_height {
            out.push(MatingWarning {
                quantity: "lip_height",
                front: fp.seating_lip_height,
                back: bp.inner_lip_protrusion,
                note: "back lip taller than the front recess",
            });
        }
    }
    out
}
