//! KernelIntrospect for TruckKernel: edge enumeration and curve classification.

use std::collections::HashSet;

use case_types::vec3::{self, Vec3};
use case_types::Aabb;
use truck_modeling::topology::{Edge, Solid};
use truck_modeling::{BoundedCurve, ParametricCurve};

use crate::tessellation;
use crate::traits::KernelIntrospect;
use crate::truck_kernel::TruckKernel;
use crate::types::*;

/// Samples per edge for classification and bounds.
const EDGE_SAMPLES: usize = 16;
/// Chord tolerance of the mesh behind point membership.
const MEMBERSHIP_TOLERANCE: f64 = 0.005;
/// Relative deviation under which sampled points count as collinear or concyclic.
const FIT_TOL: f64 = 1e-6;

impl KernelIntrospect for TruckKernel {
    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Ok(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..unique_edges(truck_solid).len())
            .map(|i| edge_id(solid.id(), i))
            .collect()
    }

    fn edge_info(&self, edge: KernelId) -> Result<EdgeInfo, KernelError> {
        let (solid, index) = decode_edge_id(edge).ok_or(KernelError::EntityNotFound { id: edge })?;
        let truck_solid = self
            .solid_by_id(solid)
            .ok_or(KernelError::EntityNotFound { id: edge })?;
        let edges = unique_edges(truck_solid);
        let e = edges
            .get(index)
            .ok_or(KernelError::EntityNotFound { id: edge })?;
        Ok(describe(edge, e))
    }

    fn edges(&self, solid: &KernelSolidHandle) -> Result<Vec<EdgeInfo>, KernelError> {
        let truck_solid = self.get_solid(solid)?;
        Ok(unique_edges(truck_solid)
            .iter()
            .enumerate()
            .map(|(i, e)| describe(edge_id(solid.id(), i), e))
            .collect())
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<Aabb, KernelError> {
        let truck_solid = self.get_solid(solid)?;
        let points = unique_edges(truck_solid)
            .iter()
            .flat_map(sample_edge)
            .collect::<Vec<_>>();
        Ok(Aabb::from_points(points))
    }

    fn contains_point(&self, solid: &KernelSolidHandle, point: Vec3) -> Result<bool, KernelError> {
        let mesh = tessellation::mesh_at(self.get_solid(solid)?, MEMBERSHIP_TOLERANCE)?;
        Ok(mesh.contains_point(point))
    }
}

/// Edges in shell traversal order, each once (an edge is shared by two faces).
pub(crate) fn unique_edges(solid: &Solid) -> Vec<Edge> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for shell in solid.boundaries().iter() {
        for edge in shell.edge_iter() {
            if seen.insert(edge.id()) {
                out.push(edge);
            }
        }
    }
    out
}

fn sample_edge(edge: &Edge) -> Vec<Vec3> {
    let curve = edge.oriented_curve();
    let (t0, t1) = curve.range_tuple();
    (0..=EDGE_SAMPLES)
        .map(|i| {
            let t = t0 + (t1 - t0) * i as f64 / EDGE_SAMPLES as f64;
            let p = curve.subs(t);
            [p.x, p.y, p.z]
        })
        .collect()
}

pub(crate) fn describe(id: KernelId, edge: &Edge) -> EdgeInfo {
    let s = edge.front().point();
    let e = edge.back().point();
    EdgeInfo {
        id,
        start: [s.x, s.y, s.z],
        end: [e.x, e.y, e.z],
        curve: classify(&sample_edge(edge)),
    }
}

/// Classify sampled points as a line, a circular arc or anything else.
pub(crate) fn classify(points: &[Vec3]) -> EdgeCurve {
    if points.len() < 3 {
        return EdgeCurve::Line;
    }
    let first = points[0];
    let last = points[points.len() - 1];
    let span = points
        .iter()
        .map(|p| vec3::distance(*p, first))
        .fold(0.0, f64::max);
    if span < 1e-12 {
        return EdgeCurve::Other;
    }
    let tol = FIT_TOL * span.max(1.0);

    if let Some(dir) = vec3::normalize(vec3::sub(last, first)) {
        let off_line = points.iter().any(|p| {
            let d = vec3::sub(*p, first);
            vec3::norm(vec3::sub(d, vec3::scale(dir, vec3::dot(d, dir)))) > tol
        });
        if !off_line {
            return EdgeCurve::Line;
        }
    }

    let n = points.len();
    let Some((center, radius, normal)) = circumcircle(points[0], points[n / 3], points[2 * n / 3])
    else {
        return EdgeCurve::Other;
    };
    let on_circle = points.iter().all(|p| {
        (vec3::distance(*p, center) - radius).abs() <= tol
            && vec3::dot(vec3::sub(*p, center), normal).abs() <= tol
    });
    if on_circle {
        EdgeCurve::Circle {
            center,
            radius,
            normal,
        }
    } else {
        EdgeCurve::Other
    }
}

/// Circle through three points: (center, radius, unit normal).
fn circumcircle(a: Vec3, b: Vec3, c: Vec3) -> Option<(Vec3, f64, Vec3)> {
    let ab = vec3::sub(b, a);
    let ac = vec3::sub(c, a);
    let n = vec3::cross(ab, ac);
    let n2 = vec3::dot(n, n);
    if n2 < 1e-18 {
        return None;
    }
    let num = vec3::add(
        vec3::scale(vec3::cross(n, ab), vec3::dot(ac, ac)),
        vec3::scale(vec3::cross(ac, n), vec3::dot(ab, ab)),
    );
    let center = vec3::add(a, vec3::scale(num, 1.0 / (2.0 * n2)));
    Some((center, vec3::distance(center, a), vec3::normalize(n)?))
}
