//! Recipe for the wall-mounted back shell.

use case_types::{vec3, CaseVariant};
use modeling_ops::Tool;

use crate::front::{corner_fillet, mirror_step};
use crate::layout::{vent_tools, WallSide};
use crate::params::BackParametrics;
use crate::types::{FeatureOp, FeatureStep, Recipe, Stage};

const INNER_LIP: &str = "inner_lip";

pub fn back_recipe(p: &BackParametrics) -> Recipe {
    let (bp, d) = (p.params(), p.dims());
    let wall = bp.wall_thickness;
    let floor = bp.bottom_thickness;
    let (l, w, h) = (d.case_length, d.case_width, d.case_height);
    let through = floor + 1.0;

    let mut r = Recipe::new(CaseVariant::Back, [l, w, h]);
    r.push(corner_fillet(l, w, bp.corner_radius));

    // ---- cutouts ----
    r.push(FeatureStep::new(
        "cavity",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::block(
                [wall, wall, floor],
                [d.inner_length, d.inner_width, d.cavity_height],
            ),
        },
    ));
    let [wx, wy] = d.wire_center;
    r.push(FeatureStep::new(
        "wire_hole",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::z_cylinder(wx, wy, -0.5, bp.wire_hole_diameter / 2.0, through),
        },
    ));

    let hole_r = bp.mount_hole_diameter / 2.0;
    let bottom_holes = |centers: &[[f64; 2]]| -> Vec<Tool> {
        centers
            .iter()
            .map(|[x, y]| Tool::z_cylinder(*x, *y, -0.5, hole_r, through))
            .collect()
    };
    r.push(FeatureStep::new(
        "mount_holes",
        Stage::CutoutsApplied,
        FeatureOp::CutEach {
            tools: bottom_holes(&d.mount_holes),
        },
    ));
    r.push(FeatureStep::new(
        "gang_holes",
        Stage::CutoutsApplied,
        FeatureOp::CutEach {
            tools: bottom_holes(&d.gang_holes),
        },
    ));

    let head_r = bp.screw_head_diameter / 2.0;
    let screw_channels = |height: f64| -> Vec<Tool> {
        d.gang_holes
            .iter()
            .map(|[x, y]| Tool::z_cylinder(*x, *y, floor, head_r, height))
            .collect()
    };
    r.push(FeatureStep::new(
        "screw_head_clearance",
        Stage::CutoutsApplied,
        FeatureOp::CutEach {
            tools: screw_channels(bp.screw_head_height),
        },
    ));

    let vents = |side: WallSide| vent_tools(side, l, w, wall, d.vent_z, bp.vent_depth, &bp.vents);
    if bp.include_vents {
        for side in WallSide::ALL {
            r.push(
                FeatureStep::new(
                    format!("vents_{}", side.name()),
                    Stage::CutoutsApplied,
                    FeatureOp::CutEach { tools: vents(side) },
                )
                .optional(),
            );
        }
    }

    // ---- ribs and lips ----
    if let Some(ring) = d.back_lip {
        let lip = Tool::block(ring.outer.min, ring.outer.size())
            .minus(Tool::block(ring.inner.min, ring.inner.size()));
        r.push(
            FeatureStep::new("back_lip", Stage::RibsAndLipsAdded, FeatureOp::Fuse { tool: lip })
                .optional(),
        );
    }
    if !d.support_ribs.is_empty() {
        let ribs = d
            .support_ribs
            .iter()
            .map(|b| Tool::block(b.min, b.size()))
            .collect();
        r.push(
            FeatureStep::new(
                "print_supports",
                Stage::RibsAndLipsAdded,
                FeatureOp::FuseEach { tools: ribs },
            )
            .optional(),
        );
    }
    if !d.snap_slots.is_empty() {
        let slots = d
            .snap_slots
            .iter()
            .map(|b| Tool::block(b.min, b.size()))
            .collect();
        r.push(
            FeatureStep::new(
                "snap_slots",
                Stage::RibsAndLipsAdded,
                FeatureOp::CutEach { tools: slots },
            )
            .optional(),
        );
    }

    if bp.include_inner_lip {
        let lip = d
            .inner_lip
            .iter()
            .map(|b| Tool::block(b.min, b.size()))
            .collect();
        r.push(
            FeatureStep::new(
                INNER_LIP,
                Stage::RibsAndLipsAdded,
                FeatureOp::Fuse {
                    tool: Tool::Union { parts: lip },
                },
            )
            .optional(),
        );
        // The lip covers the earlier screw clearance; the channel is re-cut through it.
        r.push(
            FeatureStep::new(
                "screw_channels",
                Stage::RibsAndLipsAdded,
                FeatureOp::CutEach {
                    tools: screw_channels(d.screw_channel_height),
                },
            )
            .penetrating(INNER_LIP)
            .clearing(INNER_LIP, bp.screw_channel_margin),
        );
        let pin_r = bp.pin_hole_diameter / 2.0;
        let pins = d
            .pin_holes
            .iter()
            .map(|pin| Tool::cylinder(pin_r, pin.length, pin.origin, vec3::X))
            .collect();
        r.push(
            FeatureStep::new(
                "lip_pin_holes",
                Stage::RibsAndLipsAdded,
                FeatureOp::CutEach { tools: pins },
            )
            .optional()
            .penetrating(INNER_LIP),
        );
        if bp.include_vents {
            for side in WallSide::ALL {
                r.push(
                    FeatureStep::new(
                        format!("vents_{}_through_lip", side.name()),
                        Stage::RibsAndLipsAdded,
                        FeatureOp::CutEach { tools: vents(side) },
                    )
                    .optional()
                    .penetrating(INNER_LIP),
                );
            }
        }
    }

    r.push(mirror_step());
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BackParams;
    use crate::types::BuildError;

    fn recipe() -> Recipe {
        back_recipe(&BackParametrics::new(BackParams::default()))
    }

    #[test]
    fn default_recipe_validates() {
        recipe().validate().unwrap();
    }

    #[test]
    fn vents_are_recut_after_the_lip() {
        let r = recipe();
        let lip = r.step_index(INNER_LIP).unwrap();
        let recut = r.step_index("vents_top_through_lip").unwrap();
        assert!(recut > lip);
        assert_eq!(r.steps[recut].penetrates.as_deref(), Some(INNER_LIP));
    }

    #[test]
    fn screw_channel_reaches_above_the_lip() {
        let r = recipe();
        let lip_top = r.step(INNER_LIP).unwrap().op.top().unwrap();
        let channel_top = r.step("screw_channels").unwrap().op.top().unwrap();
        assert!(channel_top >= lip_top + 1.0 - 1e-9);
    }

    #[test]
    fn short_channel_is_rejected() {
        let p = BackParametrics::new(BackParams {
            screw_channel_margin: 1.0,
            ..BackParams::default()
        });
        let mut r = back_recipe(&p);
        // Demand more clearance than the channel was built with.
        let i = r.step_index("screw_channels").unwrap();
        r.steps[i] = r.steps[i].clone().clearing(INNER_LIP, 5.0);
        assert!(matches!(
            r.validate(),
            Err(BuildError::ClearanceTooShort { .. })
        ));
    }

    #[test]
    fn moving_the_recut_before_the_lip_is_rejected() {
        let mut r = recipe();
        let recut = r.step_index("vents_left_through_lip").unwrap();
        let step = r.steps.remove(recut);
        let lip = r.step_index(INNER_LIP).unwrap();
        r.steps.insert(lip, step);
        assert!(matches!(
            r.validate(),
            Err(BuildError::OrderingViolation { .. })
        ));
    }

    #[test]
    fn optional_back_lip_adds_steps() {
        let p = BackParametrics::new(BackParams {
            include_back_lip: true,
            add_print_supports: true,
            ..BackParams::default()
        });
        let r = back_recipe(&p);
        r.validate().unwrap();
        assert!(r.step("back_lip").is_some());
        assert!(r.step("print_supports").is_some());
        assert!(r.step("snap_slots").is_some());
    }
}
