//! Recipe for the front display shell.

use case_types::{vec3, Affine, CaseVariant, Frame, MirrorPlane};
use modeling_ops::{
    EdgePredicate, FallbackPolicy, FilletMode, FilletSpec, Tool, ZoneMode, COINCIDENT_TOL,
    PERIMETER_TOL, SNAP_TOL,
};

use crate::layout::{vent_tools, WallSide};
use crate::params::{FrontParametrics, THROUGH_OVERSHOOT};
use crate::types::{FeatureOp, FeatureStep, Recipe, Stage};

/// Vertical edges on the four footprint corners of an `l x w` box.
pub(crate) fn corner_fillet(l: f64, w: f64, radius: f64) -> FeatureStep {
    FeatureStep::new(
        "corner_fillet",
        Stage::CornersRounded,
        FeatureOp::Fillet {
            spec: FilletSpec {
                predicate: EdgePredicate::CornerVertical {
                    x: [0.0, l],
                    y: [0.0, w],
                    tol: SNAP_TOL,
                },
                radius,
                fallback: Some(FallbackPolicy {
                    ceiling: None,
                    ..FallbackPolicy::default()
                }),
                mode: FilletMode::Batch,
            },
        },
    )
    .optional()
}

pub(crate) fn mirror_step() -> FeatureStep {
    FeatureStep::new(
        "mirror",
        Stage::Mirrored,
        FeatureOp::Mirror {
            plane: MirrorPlane::default(),
        },
    )
}

pub fn front_recipe(p: &FrontParametrics) -> Recipe {
    let (fp, d) = (p.params(), p.dims());
    let wall = fp.wall_thickness;
    let face = fp.face_thickness;
    let (l, w, h) = (d.case_length, d.case_width, d.case_height);

    let mut r = Recipe::new(CaseVariant::Front, [l, w, h]);
    r.push(corner_fillet(l, w, fp.corner_radius));

    // ---- cutouts ----
    r.push(FeatureStep::new(
        "cavity",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::block(
                [wall, wall, face],
                [d.inner_length, d.inner_width, h - face + THROUGH_OVERSHOOT],
            ),
        },
    ));

    let [lx, ly] = d.ldr_center;
    r.push(FeatureStep::new(
        "ldr_hole",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::z_cylinder(lx, ly, -1.0, fp.ldr_diameter / 2.0, face + 2.0),
        },
    ));
    if fp.include_ldr_tube {
        let tube = Tool::z_cylinder(lx, ly, 0.0, fp.ldr_tube_outer_diameter / 2.0, fp.ldr_tube_height)
            .minus(Tool::z_cylinder(
                lx,
                ly,
                -0.1,
                fp.ldr_tube_inner_diameter / 2.0,
                fp.ldr_tube_height + 0.2,
            ));
        r.push(
            FeatureStep::new("ldr_tube", Stage::CutoutsApplied, FeatureOp::Fuse { tool: tube })
                .optional(),
        );
    }

    let [sx, sy] = d.sensor_center;
    let sensor_place = Affine::rotation(vec3::Z, 90.0).then_translate([sx, sy, 0.0]);
    let [open_long, open_short] = fp.sensor_opening;
    r.push(FeatureStep::new(
        "sensor_opening",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::block(
                [-open_long / 2.0, -open_short / 2.0, -0.1],
                [open_long, open_short, face + 0.2],
            )
            .then(sensor_place),
        },
    ));
    if fp.include_sensor_lattice {
        r.push(
            FeatureStep::new(
                "sensor_lattice",
                Stage::CutoutsApplied,
                FeatureOp::Fuse {
                    tool: sensor_lattice(p).then(sensor_place),
                },
            )
            .optional(),
        );
    }
    if fp.include_sensor_box {
        let walls = [d.sensor_box_left_wall, d.sensor_box_bottom_wall]
            .iter()
            .map(|b| Tool::block(b.min, b.size()))
            .collect();
        r.push(
            FeatureStep::new(
                "sensor_box",
                Stage::CutoutsApplied,
                FeatureOp::Fuse {
                    tool: Tool::Union { parts: walls },
                },
            )
            .optional(),
        );
    }

    let disp = d.display_rect;
    r.push(FeatureStep::new(
        "display_opening",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::block(
                [disp.min[0], disp.min[1], -0.1],
                [disp.width(), disp.height(), face + 0.2],
            ),
        },
    ));
    // Outer rim of the opening, one edge at a time; thin edges that cannot take the
    // radius are left sharp.
    r.push(
        FeatureStep::new(
            "display_fillet",
            Stage::CutoutsApplied,
            FeatureOp::Fillet {
                spec: FilletSpec {
                    predicate: EdgePredicate::all(vec![
                        EdgePredicate::HorizontalAt {
                            z: 0.0,
                            tol: COINCIDENT_TOL,
                        },
                        EdgePredicate::InZone {
                            rect: disp,
                            mode: ZoneMode::BothOnAxis,
                        },
                        EdgePredicate::NonDegenerate {
                            tol: COINCIDENT_TOL,
                        },
                    ]),
                    radius: fp.display_fillet_radius,
                    fallback: None,
                    mode: FilletMode::PerEdge,
                },
            },
        )
        .optional(),
    );

    if fp.include_vents {
        for side in WallSide::ALL {
            let tools = vent_tools(side, l, w, wall, d.vent_z, d.vent_depth, &fp.vents);
            r.push(
                FeatureStep::new(
                    format!("vents_{}", side.name()),
                    Stage::CutoutsApplied,
                    FeatureOp::CutEach { tools },
                )
                .optional(),
            );
        }
    }

    // ---- ribs and lips ----
    let standoffs = d
        .standoff_centers
        .iter()
        .map(|[x, y]| {
            Tool::z_cylinder(*x, *y, face, fp.standoff_diameter / 2.0, fp.standoff_height).minus(
                Tool::z_cylinder(
                    *x,
                    *y,
                    face - 0.1,
                    fp.standoff_hole_diameter / 2.0,
                    fp.standoff_height + 0.2,
                ),
            )
        })
        .collect();
    r.push(
        FeatureStep::new(
            "standoffs",
            Stage::RibsAndLipsAdded,
            FeatureOp::FuseEach { tools: standoffs },
        )
        .optional(),
    );

    let latch_r = fp.latch_hole_diameter / 2.0;
    let latch_len = wall + 2.0;
    r.push(
        FeatureStep::new(
            "latch_holes",
            Stage::RibsAndLipsAdded,
            FeatureOp::CutEach {
                tools: vec![
                    Tool::cylinder(latch_r, latch_len, [-2.0, d.latch_y, d.latch_z], vec3::X),
                    Tool::cylinder(
                        latch_r,
                        latch_len,
                        [l - wall, d.latch_y, d.latch_z],
                        vec3::X,
                    ),
                ],
            },
        )
        .optional(),
    );

    let lip = d
        .seating_lip
        .iter()
        .map(|b| Tool::block(b.min, b.size()))
        .collect();
    r.push(
        FeatureStep::new(
            "seating_lip",
            Stage::RibsAndLipsAdded,
            FeatureOp::Cut {
                tool: Tool::Union { parts: lip },
            },
        )
        .optional(),
    );

    r.push(mirror_step());

    // ---- post-mirror fillets, keyed on final-frame coordinates ----
    r.push(
        FeatureStep::new(
            "inner_fillet",
            Stage::PostMirrorFilleted,
            FeatureOp::Fillet {
                spec: FilletSpec {
                    predicate: EdgePredicate::all(vec![
                        EdgePredicate::HorizontalAt {
                            z: face,
                            tol: COINCIDENT_TOL,
                        },
                        EdgePredicate::OnPerimeter {
                            rects: vec![d.inner_rect.mirrored_x()],
                            tol: PERIMETER_TOL,
                        },
                        EdgePredicate::not(EdgePredicate::InZone {
                            rect: d.display_exclusion,
                            mode: ZoneMode::AnyEndpoint,
                        }),
                        EdgePredicate::NonDegenerate {
                            tol: COINCIDENT_TOL,
                        },
                    ]),
                    radius: fp.inner_face_edge_radius,
                    fallback: Some(FallbackPolicy::default()),
                    mode: FilletMode::PerEdge,
                },
            },
        )
        .optional()
        .in_frame(Frame::PostMirror),
    );
    r.push(
        FeatureStep::new(
            "outer_fillet",
            Stage::PostMirrorFilleted,
            FeatureOp::Fillet {
                spec: FilletSpec {
                    predicate: EdgePredicate::all(vec![
                        EdgePredicate::HorizontalAt {
                            z: 0.0,
                            tol: COINCIDENT_TOL,
                        },
                        EdgePredicate::OnPerimeter {
                            rects: vec![d.outer_rect.mirrored_x()],
                            tol: COINCIDENT_TOL,
                        },
                        EdgePredicate::NonDegenerate {
                            tol: COINCIDENT_TOL,
                        },
                    ]),
                    radius: fp.face_edge_radius,
                    fallback: Some(FallbackPolicy {
                        ceiling: None,
                        ..FallbackPolicy::default()
                    }),
                    mode: FilletMode::Batch,
                },
            },
        )
        .optional()
        .in_frame(Frame::PostMirror),
    );
    r
}

/// Two sets of diagonal bars at +-45 degrees, centred on the origin.
fn sensor_lattice(p: &FrontParametrics) -> Tool {
    let fp = p.params();
    let t = fp.lattice_bar_thickness;
    let len = fp.lattice_bar_length;
    let depth = fp.face_thickness / 3.0;
    let half = (fp.lattice_bars as f64 - 1.0) / 2.0;
    let mut parts = Vec::with_capacity(2 * fp.lattice_bars);
    for angle in [45.0, -45.0] {
        for i in 0..fp.lattice_bars {
            let offset = (i as f64 - half) * fp.lattice_spacing;
            parts.push(
                Tool::block([offset - t / 2.0, -len / 2.0, 0.0], [t, len, depth])
                    .then(Affine::rotation(vec3::Z, angle)),
            );
        }
    }
    Tool::Union { parts }
}
