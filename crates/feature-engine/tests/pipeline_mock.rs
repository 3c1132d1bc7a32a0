//! End-to-end pipeline runs against the deterministic kernel.

use approx::assert_relative_eq;
use case_types::{CaseVariant, MirrorPlane};
use feature_engine::{
    build, build_back, build_front, BackParametrics, BackParams, BuildError, BuildOptions,
    FeatureOp, FeatureStep, FrontParametrics, FrontParams, Recipe, Requirement, Stage,
    StepOutcome,
};
use geom_kernel::{EdgeCurve, KernelIntrospect, MockKernel};
use modeling_ops::{EdgePredicate, FallbackPolicy, FilletMode, FilletSpec, Tool, COINCIDENT_TOL};

fn verified() -> BuildOptions {
    BuildOptions {
        verify_volumes: true,
        ..BuildOptions::default()
    }
}

fn mirror() -> FeatureStep {
    FeatureStep::new(
        "mirror",
        Stage::Mirrored,
        FeatureOp::Mirror {
            plane: MirrorPlane::default(),
        },
    )
}

fn circles(k: &MockKernel, solid: &geom_kernel::KernelSolidHandle) -> Vec<([f64; 3], f64)> {
    k.edges(solid)
        .unwrap()
        .into_iter()
        .filter_map(|e| match e.curve {
            EdgeCurve::Circle { center, radius, .. } => Some((center, radius)),
            _ => None,
        })
        .collect()
}

#[test]
fn front_builds_to_completion() {
    let mut k = MockKernel::new();
    let params = FrontParametrics::new(FrontParams::default());
    let out = build_front(&mut k, &params, &verified()).unwrap();
    let report = &out.report;

    assert_eq!(report.variant, CaseVariant::Front);
    assert_eq!(report.final_stage, Stage::Finalized);
    assert!(report.regressions.is_empty(), "{:?}", report.regressions);
    for name in ["cavity", "ldr_hole", "sensor_opening", "display_opening", "mirror"] {
        let step = report.step(name).unwrap();
        assert_eq!(step.outcome, StepOutcome::Applied, "{name}");
    }
    let cavity = report.step("cavity").unwrap();
    assert!(cavity.volume_after.unwrap() < cavity.volume_before.unwrap());

    // Mirrored about x = 0: the shell now lies entirely at negative x.
    let bb = k.bounding_box(&out.solid).unwrap();
    let l = params.dims().case_length;
    assert_relative_eq!(bb.min[0], -l, epsilon = 1e-6);
    assert_relative_eq!(bb.max[0], 0.0, epsilon = 1e-6);
    assert_eq!(k.live_solids(), 1);
}

#[test]
fn back_builds_to_completion() {
    let mut k = MockKernel::new();
    let params = BackParametrics::new(BackParams::default());
    let out = build_back(&mut k, &params, &verified()).unwrap();
    let report = &out.report;

    assert_eq!(report.final_stage, Stage::Finalized);
    assert!(report.regressions.is_empty(), "{:?}", report.regressions);
    for s in report.steps.iter().filter(|s| s.requirement == Requirement::Required) {
        assert!(s.outcome.is_applied(), "{}: {:?}", s.name, s.outcome);
    }
    let bb = k.bounding_box(&out.solid).unwrap();
    assert!(bb.max[0] <= 1e-6);
    assert_eq!(k.live_solids(), 1);
}

#[test]
fn wire_hole_is_centred_before_and_after_the_mirror() {
    let params = BackParametrics::new(BackParams::default());
    let [cx, cy] = params.dims().wire_center;
    assert_relative_eq!(cx, 78.5, epsilon = 1e-9);
    assert_relative_eq!(cy, 56.75, epsilon = 1e-9);

    let mut k = MockKernel::new();
    let opts = BuildOptions {
        halt_after: Some(Stage::CutoutsApplied),
        ..BuildOptions::default()
    };
    let out = build_back(&mut k, &params, &opts).unwrap();
    assert_eq!(out.report.final_stage, Stage::CutoutsApplied);
    assert!(out.report.step("mirror").is_none());
    let hole = circles(&k, &out.solid).into_iter().find(|(c, r)| {
        (r - 11.0).abs() < 1e-6 && c[2].abs() < 1e-6
    });
    let (c, _) = hole.expect("wire hole circle on the outer face");
    assert_relative_eq!(c[0], cx, epsilon = 1e-6);
    assert_relative_eq!(c[1], cy, epsilon = 1e-6);

    let mut k = MockKernel::new();
    let out = build_back(&mut k, &params, &BuildOptions::default()).unwrap();
    let mirrored = circles(&k, &out.solid)
        .into_iter()
        .any(|(c, r)| {
            (r - 11.0).abs() < 1e-6
                && (c[0] + cx).abs() < 1e-6
                && (c[1] - cy).abs() < 1e-6
                && c[2].abs() < 1e-6
        });
    assert!(mirrored);
}

#[test]
fn corner_fillet_rounds_four_edges_first() {
    let mut k = MockKernel::new();
    let params = FrontParametrics::new(FrontParams::default());
    let out = build_front(&mut k, &params, &BuildOptions::default()).unwrap();

    let first = &k.fillet_attempts()[0];
    assert_eq!(first.edges, 4);
    assert_relative_eq!(first.radius, params.params().corner_radius);
    assert!(first.succeeded);
    assert_eq!(
        out.report.step("corner_fillet").unwrap().outcome,
        StepOutcome::Applied
    );
}

/// A thin plate whose bottom edges cannot carry 1 mm or the 0.5 mm fallback.
fn thin_plate_recipe(cut_required: bool) -> Recipe {
    let mut r = Recipe::new(CaseVariant::Front, [10.0, 10.0, 0.4]);
    r.push(
        FeatureStep::new(
            "bottom_fillet",
            Stage::CornersRounded,
            FeatureOp::Fillet {
                spec: FilletSpec {
                    predicate: EdgePredicate::HorizontalAt {
                        z: 0.0,
                        tol: COINCIDENT_TOL,
                    },
                    radius: 1.0,
                    fallback: Some(FallbackPolicy::default()),
                    mode: FilletMode::Batch,
                },
            },
        )
        .optional(),
    );
    let hole = FeatureStep::new(
        "hole",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::z_cylinder(5.0, 5.0, -0.5, 1.0, 1.4),
        },
    );
    r.push(if cut_required { hole } else { hole.optional() });
    r.push(mirror());
    r
}

#[test]
fn fallback_is_tried_exactly_once() {
    let mut k = MockKernel::new();
    let out = build(&mut k, &thin_plate_recipe(true), &verified()).unwrap();

    let attempts = k.fillet_attempts();
    assert_eq!(attempts.len(), 2);
    assert_relative_eq!(attempts[0].radius, 1.0);
    assert_relative_eq!(attempts[1].radius, 0.5);
    assert!(attempts.iter().all(|a| !a.succeeded));

    let report = &out.report;
    assert!(matches!(
        report.step("bottom_fillet").unwrap().outcome,
        StepOutcome::Skipped { .. }
    ));
    assert_eq!(report.step("hole").unwrap().outcome, StepOutcome::Applied);
    assert!(report.warnings.iter().any(|w| w.starts_with("bottom_fillet")));
}

fn broken_cut_recipe(required: bool) -> Recipe {
    let mut r = Recipe::new(CaseVariant::Back, [20.0, 20.0, 5.0]);
    // A zero-radius cylinder is rejected by the kernel.
    let step = FeatureStep::new(
        "bad_hole",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::z_cylinder(10.0, 10.0, -0.5, 0.0, 6.0),
        },
    );
    r.push(if required { step } else { step.optional() });
    r.push(mirror());
    r
}

#[test]
fn required_failure_aborts_and_releases_everything() {
    let mut k = MockKernel::new();
    let err = build(&mut k, &broken_cut_recipe(true), &BuildOptions::default()).unwrap_err();
    match err {
        BuildError::RequiredStepFailed { step, source } => {
            assert_eq!(step, "bad_hole");
            assert!(source.is_geometry_failure());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(k.live_solids(), 0);
}

#[test]
fn optional_failure_is_skipped() {
    let mut k = MockKernel::new();
    let out = build(&mut k, &broken_cut_recipe(false), &BuildOptions::default()).unwrap();
    assert!(matches!(
        out.report.step("bad_hole").unwrap().outcome,
        StepOutcome::Skipped { .. }
    ));
    assert!(out.report.step("mirror").unwrap().outcome.is_applied());
    assert_eq!(k.live_solids(), 1);
}

#[test]
fn invalid_recipe_creates_no_solids() {
    let mut k = MockKernel::new();
    let mut r = broken_cut_recipe(false);
    r.push(mirror());
    assert!(matches!(
        build(&mut k, &r, &BuildOptions::default()),
        Err(BuildError::DuplicateStep { .. })
    ));
    assert_eq!(k.live_solids(), 0);
}

#[test]
fn report_serializes_with_outcome_tags() {
    let mut k = MockKernel::new();
    let out = build(&mut k, &thin_plate_recipe(false), &BuildOptions::default()).unwrap();
    let json = out.report.to_json_pretty().unwrap();
    assert!(json.contains("\"status\": \"skipped\""));
    assert!(json.contains("\"hole\""));
}

#[test]
fn halted_build_reports_the_last_stage_it_ran() {
    // Nothing in the recipe sits between the cutouts and the mirror.
    let mut k = MockKernel::new();
    let opts = BuildOptions {
        halt_after: Some(Stage::RibsAndLipsAdded),
        ..BuildOptions::default()
    };
    let out = build(&mut k, &thin_plate_recipe(true), &opts).unwrap();
    assert_eq!(out.report.final_stage, Stage::CutoutsApplied);
    assert!(out.report.step("mirror").is_none());

    let mut k = MockKernel::new();
    let opts = BuildOptions {
        halt_after: Some(Stage::Base),
        ..BuildOptions::default()
    };
    let out = build(&mut k, &thin_plate_recipe(true), &opts).unwrap();
    assert_eq!(out.report.final_stage, Stage::Base);
    assert!(out.report.steps.is_empty());
    assert_eq!(k.live_solids(), 1);
}
