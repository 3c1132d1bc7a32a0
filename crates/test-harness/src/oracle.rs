//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail rather than
//! panicking, so one pass can collect every failure.

use std::collections::HashMap;

use case_types::Aabb;
use feature_engine::{BuildReport, StepOutcome};
use geom_kernel::RenderMesh;

use crate::stl::StlMesh;

/// The result of a single oracle check.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

// ── Mesh Oracles ────────────────────────────────────────────────────────────

/// Every triangle edge shared by exactly two triangles.
///
/// Edges are matched by quantized position, so per-face vertex buffers still pair up.
pub fn check_watertight_mesh(mesh: &RenderMesh) -> OracleVerdict {
    type Key = (i64, i64, i64);
    let key = |idx: u32| -> Key {
        let i = idx as usize * 3;
        let q = |v: f32| (v as f64 * 10000.0).round() as i64;
        (
            q(mesh.vertices[i]),
            q(mesh.vertices[i + 1]),
            q(mesh.vertices[i + 2]),
        )
    };

    let mut edge_counts: HashMap<(Key, Key), usize> = HashMap::new();
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (key(tri[0]), key(tri[1]), key(tri[2]));
        for (p, q) in [(a, b), (b, c), (c, a)] {
            *edge_counts.entry((p.min(q), p.max(q))).or_insert(0) += 1;
        }
    }

    let unpaired = edge_counts.values().filter(|&&c| c != 2).count();
    if unpaired == 0 {
        OracleVerdict::pass(
            "watertight_mesh",
            format!("all {} edges paired", edge_counts.len()),
        )
    } else {
        OracleVerdict::fail(
            "watertight_mesh",
            format!("{unpaired} unpaired edges out of {}", edge_counts.len()),
        )
    }
}

/// All indices address a vertex.
pub fn check_valid_indices(mesh: &RenderMesh) -> OracleVerdict {
    let count = mesh.vertices.len() / 3;
    match mesh.indices.iter().find(|&&i| i as usize >= count) {
        None => OracleVerdict::pass(
            "valid_indices",
            format!("{} indices within {count} vertices", mesh.indices.len()),
        ),
        Some(i) => OracleVerdict::fail(
            "valid_indices",
            format!("index {i} out of range ({count} vertices)"),
        ),
    }
}

/// No zero-area triangles.
pub fn check_no_degenerate_triangles(mesh: &RenderMesh) -> OracleVerdict {
    let v = |i: u32| {
        let i = i as usize * 3;
        [
            mesh.vertices[i] as f64,
            mesh.vertices[i + 1] as f64,
            mesh.vertices[i + 2] as f64,
        ]
    };
    let degenerate = mesh
        .indices
        .chunks_exact(3)
        .filter(|t| {
            let (a, b, c) = (v(t[0]), v(t[1]), v(t[2]));
            let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let w = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let n = [
                u[1] * w[2] - u[2] * w[1],
                u[2] * w[0] - u[0] * w[2],
                u[0] * w[1] - u[1] * w[0],
            ];
            (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt() < 1e-12
        })
        .count();
    if degenerate == 0 {
        OracleVerdict::pass(
            "no_degenerate_triangles",
            format!("{} triangles", mesh.triangle_count()),
        )
    } else {
        OracleVerdict::fail(
            "no_degenerate_triangles",
            format!("{degenerate} degenerate triangles"),
        )
        .with_value(degenerate as f64)
    }
}

/// Enclosed volume is positive, so the winding faces outward.
pub fn check_positive_volume(mesh: &RenderMesh) -> OracleVerdict {
    let volume = mesh.enclosed_volume();
    let verdict = if volume > 0.0 {
        OracleVerdict::pass("positive_volume", format!("{volume:.3} mm^3"))
    } else {
        OracleVerdict::fail("positive_volume", format!("{volume:.3} mm^3 (inverted?)"))
    };
    verdict.with_value(volume)
}

/// Mesh bounds within `tol` of `expected`.
pub fn check_bounding_box(mesh: &RenderMesh, expected: &Aabb, tol: f64) -> OracleVerdict {
    let (min, max) = crate::helpers::mesh_bounding_box(mesh);
    let off = (0..3)
        .map(|i| {
            let dmin = (min[i] as f64 - expected.min[i]).abs();
            let dmax = (max[i] as f64 - expected.max[i]).abs();
            dmin.max(dmax)
        })
        .fold(0.0, f64::max);
    let detail = format!("min {min:?} max {max:?}, expected {expected:?}");
    if off <= tol {
        OracleVerdict::pass("bounding_box", detail).with_value(off)
    } else {
        OracleVerdict::fail("bounding_box", detail).with_value(off)
    }
}

/// The STL on disk carries the same triangles as the mesh it was written from.
pub fn check_stl_matches_mesh(stl: &StlMesh, mesh: &RenderMesh) -> OracleVerdict {
    if stl.triangles.len() != mesh.triangle_count() {
        return OracleVerdict::fail(
            "stl_matches_mesh",
            format!(
                "STL has {} triangles, mesh has {}",
                stl.triangles.len(),
                mesh.triangle_count()
            ),
        );
    }
    let diff = (stl.volume() - mesh.enclosed_volume()).abs();
    if diff <= 1e-3 * mesh.enclosed_volume().abs().max(1.0) {
        OracleVerdict::pass("stl_matches_mesh", format!("volume differs by {diff:.2e}"))
            .with_value(diff)
    } else {
        OracleVerdict::fail("stl_matches_mesh", format!("volume differs by {diff:.3}"))
            .with_value(diff)
    }
}

// ── Report Oracles ──────────────────────────────────────────────────────────

/// Every required step applied and no required cut left the volume unchanged.
pub fn check_required_steps(report: &BuildReport) -> OracleVerdict {
    use feature_engine::Requirement;

    let failed: Vec<&str> = report
        .steps
        .iter()
        .filter(|s| s.requirement == Requirement::Required)
        .filter(|s| !matches!(s.outcome, StepOutcome::Applied))
        .map(|s| s.name.as_str())
        .collect();
    if !failed.is_empty() {
        return OracleVerdict::fail("required_steps", format!("not applied: {failed:?}"));
    }
    if !report.regressions.is_empty() {
        return OracleVerdict::fail(
            "required_steps",
            format!("removed no material: {:?}", report.regressions),
        );
    }
    OracleVerdict::pass(
        "required_steps",
        format!("{} steps recorded", report.steps.len()),
    )
}

/// Run all mesh oracles.
pub fn run_all_mesh_checks(mesh: &RenderMesh) -> Vec<OracleVerdict> {
    vec![
        check_valid_indices(mesh),
        check_watertight_mesh(mesh),
        check_no_degenerate_triangles(mesh),
        check_positive_volume(mesh),
    ]
}
