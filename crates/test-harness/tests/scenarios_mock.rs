//! Case scenarios against MockKernel.

use feature_engine::{BackParams, BuildOptions, FrontParams, Stage, StepOutcome};
use test_harness::assertions::{assert_bounds, assert_circle_at, assert_outcome};
use test_harness::helpers::plate_with_hole;
use test_harness::oracle;
use test_harness::CaseBench;

use case_types::Aabb;

fn verified() -> BuildOptions {
    BuildOptions {
        verify_volumes: true,
        ..BuildOptions::default()
    }
}

// ── Scenario 1: envelope of the back shell ──────────────────────────────────

#[test]
fn back_envelope_after_mirror() {
    let mut m = CaseBench::mock().with_options(verified());
    let report = m
        .back(BackParams {
            wall_thickness: 9.0,
            pcb_length: 133.0,
            pcb_width: 89.5,
            pcb_clearance: 3.0,
            ..BackParams::default()
        })
        .unwrap();
    let verdict = oracle::check_required_steps(report);
    assert!(verdict.passed, "{}", verdict.detail);

    let bb = m.bounding_box().unwrap();
    assert_bounds(
        &Aabb::new([bb.min[0], bb.min[1], 0.0], [bb.max[0], bb.max[1], 0.0]),
        &Aabb::new([-157.0, 0.0, 0.0], [0.0, 113.5, 0.0]),
        1e-6,
        "footprint",
    )
    .unwrap();
}

// ── Scenario 2: wire hole placement ─────────────────────────────────────────

#[test]
fn wire_hole_before_and_after_mirror() {
    let mut m = CaseBench::mock().with_options(BuildOptions {
        halt_after: Some(Stage::CutoutsApplied),
        ..BuildOptions::default()
    });
    m.back(BackParams::default()).unwrap();
    assert_circle_at(m.kernel().as_introspect(), m.solid().unwrap(), [78.5, 56.75, 0.0], 11.0, 1e-6, "pre-mirror")
        .unwrap();

    let mut m = CaseBench::mock();
    m.back(BackParams::default()).unwrap();
    assert_circle_at(m.kernel().as_introspect(), m.solid().unwrap(), [-78.5, 56.75, 0.0], 11.0, 1e-6, "post-mirror")
        .unwrap();
}

// ── Scenario 3: corner fillet ───────────────────────────────────────────────

#[test]
fn corner_fillet_applies_at_full_radius() {
    let mut m = CaseBench::mock();
    let report = m.front(FrontParams::default()).unwrap();
    assert_outcome(report, "corner_fillet", StepOutcome::is_applied, "front").unwrap();
}

// ── Feature behaviour ───────────────────────────────────────────────────────

#[test]
fn every_required_cut_removes_material() {
    let mut m = CaseBench::mock().with_options(verified());
    for report in [
        m.front(FrontParams::default()).unwrap().clone(),
        m.back(BackParams::default()).unwrap().clone(),
    ] {
        assert!(report.regressions.is_empty(), "{:?}", report.regressions);
        for s in report.steps.iter().filter(|s| s.volume_before.is_some()) {
            assert!(s.volume_after.unwrap() < s.volume_before.unwrap(), "{}", s.name);
        }
    }
}

#[test]
fn lip_recuts_follow_the_lip() {
    let mut m = CaseBench::mock();
    let report = m.back(BackParams::default()).unwrap();
    let pos = |name: &str| report.steps.iter().position(|s| s.name == name).unwrap();
    assert!(pos("inner_lip") < pos("screw_channels"));
    assert!(pos("inner_lip") < pos("vents_top_through_lip"));
    assert_outcome(report, "screw_channels", StepOutcome::is_applied, "back").unwrap();
}

#[test]
fn disabling_the_inner_lip_drops_its_recuts() {
    let mut m = CaseBench::mock();
    let report = m
        .back(BackParams {
            include_inner_lip: false,
            ..BackParams::default()
        })
        .unwrap();
    assert!(report.step("inner_lip").is_none());
    assert!(report.step("screw_channels").is_none());
    assert!(report.step("screw_head_clearance").is_some());
}

#[test]
fn halting_stops_before_the_mirror() {
    let mut m = CaseBench::mock().with_options(BuildOptions {
        halt_after: Some(Stage::RibsAndLipsAdded),
        ..BuildOptions::default()
    });
    let report = m.front(FrontParams::default()).unwrap();
    assert_eq!(report.final_stage, Stage::RibsAndLipsAdded);
    assert!(report.step("mirror").is_none());
    // Still in the pre-mirror frame.
    assert!(m.bounding_box().unwrap().min[0] >= -1e-9);
}

#[test]
fn synthetic_plate_leaves_mirrored_hole() {
    let mut m = CaseBench::mock().with_options(verified());
    m.recipe(&plate_with_hole([40.0, 30.0, 4.0], 10.0, 15.0, 3.0))
        .unwrap();
    assert_circle_at(m.kernel().as_introspect(), m.solid().unwrap(), [-10.0, 15.0, 4.0], 3.0, 1e-6, "top")
        .unwrap();
    let bb = m.bounding_box().unwrap();
    assert_bounds(&bb, &Aabb::new([-40.0, 0.0, 0.0], [0.0, 30.0, 4.0]), 1e-9, "plate").unwrap();
}

#[test]
fn mock_mesh_passes_oracles() {
    let mut m = CaseBench::mock();
    m.front(FrontParams::default()).unwrap();
    let verdicts = m.check_mesh().unwrap();
    assert_eq!(verdicts.len(), 4);
}

#[test]
fn new_build_releases_the_previous_shell() {
    let mut m = CaseBench::mock();
    m.front(FrontParams::default()).unwrap();
    let first = m.volume().unwrap();
    m.back(BackParams::default()).unwrap();
    assert_ne!(first, m.volume().unwrap());
}

#[test]
fn mock_cannot_write_step() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = CaseBench::mock();
    m.back(BackParams::default()).unwrap();
    assert!(m.write_artifacts(dir.path()).is_err());
}
