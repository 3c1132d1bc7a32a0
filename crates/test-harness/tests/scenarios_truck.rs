//! TruckKernel scenarios.
//!
//! These run on real B-Rep geometry. Full case builds chain dozens of booleans and are
//! #[ignore]d; run them with `--ignored`.

use approx::assert_relative_eq;
use case_types::{Affine, MeshQuality, MirrorPlane};
use feature_engine::{BackParametrics, BackParams, BuildOptions, FrontParams, Stage, StepOutcome};
use geom_kernel::{Kernel, KernelIntrospect, TruckKernel};
use test_harness::helpers::plate_with_hole;
use test_harness::stl::parse_binary_stl;
use test_harness::{oracle, CaseBench};

#[test]
fn truck_box_topology() {
    let mut k = TruckKernel::new();
    let b = k.make_box([10.0, 20.0, 5.0]).unwrap();
    assert_eq!(k.list_edges(&b).len(), 12);
    assert_relative_eq!(k.volume(&b).unwrap(), 1000.0, max_relative = 1e-6);
}

#[test]
fn truck_tessellation_round_trips_through_stl() {
    let mut k = TruckKernel::new();
    let b = k.make_box([10.0, 10.0, 10.0]).unwrap();
    let mesh = k.tessellate(&b, &MeshQuality::PRINT).unwrap();
    for v in oracle::run_all_mesh_checks(&mesh) {
        assert!(v.passed, "{}: {}", v.oracle_name, v.detail);
    }

    let bytes = file_format::render_mesh_to_stl(&mesh, "box").unwrap();
    let stl = parse_binary_stl(&bytes).unwrap();
    let verdict = oracle::check_stl_matches_mesh(&stl, &mesh);
    assert!(verdict.passed, "{}", verdict.detail);
    assert_relative_eq!(stl.volume(), 1000.0, max_relative = 1e-4);
}

#[test]
fn truck_mirror_twice_restores_bounds() {
    let mut k = TruckKernel::new();
    let b = k.make_box([10.0, 20.0, 5.0]).unwrap();
    let moved = k.transform(&b, &Affine::translation([3.0, 1.0, 0.0])).unwrap();
    let m = MirrorPlane::default().to_affine();
    let once = k.transform(&moved, &m).unwrap();
    let twice = k.transform(&once, &m).unwrap();

    let bb1 = k.bounding_box(&once).unwrap();
    assert_relative_eq!(bb1.min[0], -13.0, epsilon = 1e-6);
    assert_relative_eq!(bb1.max[0], -3.0, epsilon = 1e-6);
    let (a, b2) = (k.bounding_box(&moved).unwrap(), k.bounding_box(&twice).unwrap());
    for i in 0..3 {
        assert_relative_eq!(a.min[i], b2.min[i], epsilon = 1e-6);
        assert_relative_eq!(a.max[i], b2.max[i], epsilon = 1e-6);
    }
    assert!(k.volume(&twice).unwrap() > 0.0);
}

#[test]
fn truck_hole_lowers_volume() {
    let mut m = CaseBench::truck().with_options(BuildOptions {
        verify_volumes: true,
        ..BuildOptions::default()
    });
    let report = m
        .recipe(&plate_with_hole([40.0, 40.0, 4.0], 20.0, 20.0, 5.0))
        .unwrap()
        .clone();
    assert!(report.regressions.is_empty());
    let hole = report.step("hole").unwrap();
    let removed = hole.volume_before.unwrap() - hole.volume_after.unwrap();
    // pi * 5^2 * 4, within tessellation error
    assert_relative_eq!(removed, 314.159, max_relative = 0.02);
}

#[test]
fn truck_step_text() {
    let mut k = TruckKernel::new();
    let b = k.make_box([10.0, 10.0, 10.0]).unwrap();
    let text = file_format::export_step(&k, &b, "box").unwrap();
    assert!(text.starts_with("ISO-10303-21"));
    assert!(text.contains("MANIFOLD_SOLID_BREP") || text.contains("SHELL"));
}

#[test]
fn truck_back_corners_are_rounded() {
    let params = BackParams::default();
    let dims = BackParametrics::new(params.clone()).dims().clone();
    let (l, w, h) = (dims.case_length, dims.case_width, dims.case_height);
    let r = params.corner_radius;

    let mut m = CaseBench::truck().with_options(BuildOptions {
        halt_after: Some(Stage::CornersRounded),
        ..BuildOptions::default()
    });
    let report = m.back(params).unwrap().clone();
    assert_eq!(report.final_stage, Stage::CornersRounded);
    assert_eq!(
        report.step("corner_fillet").unwrap().outcome,
        StepOutcome::Applied
    );

    let removed = l * w * h - m.volume().unwrap();
    let ideal = 4.0 * (1.0 - std::f64::consts::FRAC_PI_4) * r * r * h;
    assert!(
        removed > 0.85 * ideal && removed < 1.05 * ideal,
        "removed {removed}, ideal {ideal}"
    );
    let bb = m.bounding_box().unwrap();
    assert_relative_eq!(bb.max[0] - bb.min[0], l, epsilon = 1e-3);
    assert_relative_eq!(bb.max[1] - bb.min[1], w, epsilon = 1e-3);
}

#[test]
#[ignore = "full boolean chain on truck is slow"]
fn truck_front_case_builds_and_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = CaseBench::truck();
    let report = m.front(FrontParams::default()).unwrap();
    let verdict = oracle::check_required_steps(report);
    assert!(verdict.passed, "{}", verdict.detail);
    assert_eq!(
        report.step("corner_fillet").unwrap().outcome,
        StepOutcome::Applied
    );
    let paths = m.write_artifacts(dir.path()).unwrap();
    let stl = parse_binary_stl(&std::fs::read(&paths.stl).unwrap()).unwrap();
    assert!(stl.volume() > 0.0);
}

#[test]
#[ignore = "full boolean chain on truck is slow"]
fn truck_back_case_builds() {
    let mut m = CaseBench::truck();
    let report = m.back(BackParams::default()).unwrap();
    let verdict = oracle::check_required_steps(report);
    assert!(verdict.passed, "{}", verdict.detail);
}
