//! MockKernel: deterministic in-memory kernel for pipeline tests.
//!
//! Solids are CSG trees over exact boxes and cylinders. Membership is exact, volumes are
//! exact for primitives and estimated by grid sampling over the region a boolean can
//! change, and edges are tracked explicitly: booleans trim existing edges at membership
//! transitions and add the section loops where a primitive tool crosses the other
//! operand's boundary. Each edge carries the largest fillet radius its adjacent faces can
//! take; `fillet_edges` fails above it.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_4, PI};
use std::sync::Arc;

use case_types::vec3::{self, Vec3};
use case_types::{Aabb, Affine, MeshQuality};
use tracing::debug;

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

/// Membership tolerance: `inside(p, EPS)` is the open interior, `inside(p, -EPS)` the
/// closed solid.
const EPS: f64 = 1e-7;
/// Grid samples per overlap estimate.
const OVERLAP_SAMPLES: f64 = 12_000.0;
const MIN_AXIS_SAMPLES: usize = 4;
const MAX_AXIS_SAMPLES: usize = 160;
/// Edge sampling pitch in millimetres when looking for membership transitions.
const SPLIT_PITCH: f64 = 0.5;
const MIN_SPLIT_SAMPLES: usize = 16;
const GENERATOR_LINES: usize = 8;
const CIRCLE_SAMPLES: usize = 24;
const BISECTIONS: usize = 40;
/// Two transitions on parallel generator lines belong to one section loop within this.
const LOOP_MATCH_TOL: f64 = 1e-5;
const MIN_EDGE_LENGTH: f64 = 1e-6;

#[derive(Debug)]
enum Csg {
    Cuboid {
        to_local: Affine,
        size: Vec3,
        bounds: Aabb,
    },
    Cylinder {
        origin: Vec3,
        axis: Vec3,
        radius: f64,
        height: f64,
        bounds: Aabb,
    },
    Union(Arc<Csg>, Arc<Csg>, Aabb),
    Difference(Arc<Csg>, Arc<Csg>),
    Transformed {
        to_local: Affine,
        child: Arc<Csg>,
        bounds: Aabb,
    },
}

impl Csg {
    fn bounds(&self) -> Aabb {
        match self {
            Csg::Cuboid { bounds, .. }
            | Csg::Cylinder { bounds, .. }
            | Csg::Union(_, _, bounds)
            | Csg::Transformed { bounds, .. } => *bounds,
            Csg::Difference(a, _) => a.bounds(),
        }
    }

    /// Point membership. Positive `eps` shrinks the solid, negative grows it.
    fn inside(&self, p: Vec3, eps: f64) -> bool {
        if !self.bounds().contains(p, EPS * 10.0) {
            return false;
        }
        match self {
            Csg::Cuboid { to_local, size, .. } => {
                let q = to_local.apply_point(p);
                (0..3).all(|i| q[i] > eps && q[i] < size[i] - eps)
            }
            Csg::Cylinder {
                origin,
                axis,
                radius,
                height,
                ..
            } => {
                let d = vec3::sub(p, *origin);
                let t = vec3::dot(d, *axis);
                if t <= eps || t >= height - eps {
                    return false;
                }
                vec3::norm(vec3::sub(d, vec3::scale(*axis, t))) < radius - eps
            }
            Csg::Union(a, b, _) => a.inside(p, eps) || b.inside(p, eps),
            Csg::Difference(a, b) => a.inside(p, eps) && !b.inside(p, -eps),
            Csg::Transformed {
                to_local, child, ..
            } => child.inside(to_local.apply_point(p), eps),
        }
    }
}

/// Primitive description kept on a solid until it takes part in a boolean, used to
/// trace section loops along its generator lines.
#[derive(Debug, Clone)]
enum Prim {
    Cuboid { to_world: Affine, size: Vec3 },
    Cylinder {
        origin: Vec3,
        axis: Vec3,
        radius: f64,
        height: f64,
    },
}

impl Prim {
    fn transformed(&self, t: &Affine) -> Prim {
        match self {
            Prim::Cuboid { to_world, size } => Prim::Cuboid {
                to_world: to_world.then(t),
                size: *size,
            },
            Prim::Cylinder {
                origin,
                axis,
                radius,
                height,
            } => Prim::Cylinder {
                origin: t.apply_point(*origin),
                axis: t.apply_vector(*axis),
                radius: *radius,
                height: *height,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct MockEdge {
    start: Vec3,
    end: Vec3,
    curve: EdgeCurve,
    max_fillet: f64,
}

impl MockEdge {
    fn line(start: Vec3, end: Vec3, max_fillet: f64) -> Self {
        Self {
            start,
            end,
            curve: EdgeCurve::Line,
            max_fillet,
        }
    }

    fn circle(center: Vec3, radius: f64, normal: Vec3, max_fillet: f64) -> Self {
        let p = vec3::add(center, vec3::scale(vec3::any_perpendicular(normal), radius));
        Self {
            start: p,
            end: p,
            curve: EdgeCurve::Circle {
                center,
                radius,
                normal,
            },
            max_fillet,
        }
    }

    fn length(&self) -> f64 {
        match self.curve {
            EdgeCurve::Circle { radius, .. } => 2.0 * PI * radius,
            _ => vec3::distance(self.start, self.end),
        }
    }

    fn samples(&self, n: usize) -> Vec<Vec3> {
        match self.curve {
            EdgeCurve::Circle {
                center,
                radius,
                normal,
            } => {
                let u = vec3::normalize(vec3::sub(self.start, center))
                    .unwrap_or_else(|| vec3::any_perpendicular(normal));
                let v = vec3::cross(normal, u);
                (0..n)
                    .map(|i| {
                        let a = 2.0 * PI * (i as f64 + 0.5) / n as f64;
                        vec3::add(
                            center,
                            vec3::add(vec3::scale(u, radius * a.cos()), vec3::scale(v, radius * a.sin())),
                        )
                    })
                    .collect()
            }
            _ => (0..n)
                .map(|i| vec3::lerp(self.start, self.end, (i as f64 + 0.5) / n as f64))
                .collect(),
        }
    }

    fn transformed(&self, t: &Affine) -> MockEdge {
        let curve = match self.curve {
            EdgeCurve::Circle {
                center,
                radius,
                normal,
            } => EdgeCurve::Circle {
                center: t.apply_point(center),
                radius,
                normal: t.apply_vector(normal),
            },
            ref other => other.clone(),
        };
        MockEdge {
            start: t.apply_point(self.start),
            end: t.apply_point(self.end),
            curve,
            max_fillet: self.max_fillet,
        }
    }

    /// A line meeting a rounded line end-on loses `radius` at the shared end, as the
    /// blend surface takes that corner. `None` when nothing is left.
    fn pulled_back(&self, rounded: &[&MockEdge], radius: f64) -> Option<MockEdge> {
        if self.curve != EdgeCurve::Line {
            return Some(self.clone());
        }
        let Some(dir) = vec3::normalize(vec3::sub(self.end, self.start)) else {
            return Some(self.clone());
        };
        let (mut start_hit, mut end_hit) = (false, false);
        for r in rounded.iter().filter(|r| r.curve == EdgeCurve::Line) {
            let parallel = vec3::normalize(vec3::sub(r.end, r.start))
                .is_some_and(|d| vec3::norm(vec3::cross(d, dir)) < 1e-9);
            if parallel {
                continue;
            }
            let touches = |p: Vec3| {
                vec3::distance(p, r.start) < LOOP_MATCH_TOL || vec3::distance(p, r.end) < LOOP_MATCH_TOL
            };
            start_hit |= touches(self.start);
            end_hit |= touches(self.end);
        }
        let pull = |hit: bool| if hit { radius } else { 0.0 };
        let start = vec3::add(self.start, vec3::scale(dir, pull(start_hit)));
        let end = vec3::sub(self.end, vec3::scale(dir, pull(end_hit)));
        let remaining = vec3::dot(vec3::sub(end, start), dir);
        (remaining > MIN_EDGE_LENGTH).then(|| MockEdge {
            start,
            end,
            ..self.clone()
        })
    }

    /// Pieces of this edge on which `keep` holds. Lines are split at transitions;
    /// closed curves survive whole when most of their samples are kept.
    fn trimmed(&self, keep: impl Fn(Vec3) -> bool) -> Vec<MockEdge> {
        match self.curve {
            EdgeCurve::Line => keep_runs(self.start, self.end, &keep)
                .into_iter()
                .map(|(s, e)| MockEdge::line(s, e, self.max_fillet))
                .collect(),
            _ => {
                let samples = self.samples(CIRCLE_SAMPLES);
                let kept = samples.iter().filter(|p| keep(**p)).count();
                if kept * 2 > samples.len() {
                    vec![self.clone()]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// Bisect the membership change between parameters `lo` (class `lo_in`) and `hi`.
fn bisect(start: Vec3, end: Vec3, mut lo: f64, mut hi: f64, lo_in: bool, f: &impl Fn(Vec3) -> bool) -> f64 {
    for _ in 0..BISECTIONS {
        let mid = 0.5 * (lo + hi);
        if f(vec3::lerp(start, end, mid)) == lo_in {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Parameters in (0, 1) where `f` changes along the segment.
fn transitions(start: Vec3, end: Vec3, f: &impl Fn(Vec3) -> bool) -> Vec<f64> {
    let len = vec3::distance(start, end);
    let n = ((len / SPLIT_PITCH).ceil() as usize).max(MIN_SPLIT_SAMPLES);
    let mut out = Vec::new();
    let mut prev = f(start);
    for i in 1..=n {
        let t = i as f64 / n as f64;
        let cur = f(vec3::lerp(start, end, t));
        if cur != prev {
            out.push(bisect(start, end, (i - 1) as f64 / n as f64, t, prev, f));
            prev = cur;
        }
    }
    out
}

/// Sub-segments of `start..end` whose midpoints satisfy `keep`, merged where adjacent.
fn keep_runs(start: Vec3, end: Vec3, keep: &impl Fn(Vec3) -> bool) -> Vec<(Vec3, Vec3)> {
    let mut cuts = vec![0.0];
    cuts.extend(transitions(start, end, keep));
    cuts.push(1.0);

    let mut runs: Vec<(f64, f64)> = Vec::new();
    for w in cuts.windows(2) {
        let (t0, t1) = (w[0], w[1]);
        if !keep(vec3::lerp(start, end, 0.5 * (t0 + t1))) {
            continue;
        }
        match runs.last_mut() {
            Some(last) if (last.1 - t0).abs() < 1e-12 => last.1 = t1,
            _ => runs.push((t0, t1)),
        }
    }
    runs.into_iter()
        .map(|(t0, t1)| (vec3::lerp(start, end, t0), vec3::lerp(start, end, t1)))
        .filter(|(s, e)| vec3::distance(*s, *e) > MIN_EDGE_LENGTH)
        .collect()
}

/// Section loops where the primitive's lateral faces cross the boundary of `other`.
fn section_loops(prim: &Prim, other: &Csg) -> Vec<MockEdge> {
    let solid = |p: Vec3| other.inside(p, 0.0);
    let mut out = Vec::new();
    match prim {
        Prim::Cuboid { to_world, size } => {
            for k in 0..3 {
                let (i, j) = ((k + 1) % 3, (k + 2) % 3);
                let corner = |a: f64, b: f64, t: f64| {
                    let mut q = [0.0; 3];
                    q[i] = a;
                    q[j] = b;
                    q[k] = t;
                    to_world.apply_point(q)
                };
                let ring = [
                    (0.0, 0.0),
                    (size[i], 0.0),
                    (size[i], size[j]),
                    (0.0, size[j]),
                ];
                let lines: Vec<Vec<f64>> = ring
                    .iter()
                    .map(|&(a, b)| transitions(corner(a, b, 0.0), corner(a, b, size[k]), &solid))
                    .collect();
                let max_fillet = size[i].min(size[j]) / 2.0;
                for t in shared_transitions(&lines) {
                    let h = t * size[k];
                    for n in 0..4 {
                        let (a0, b0) = ring[n];
                        let (a1, b1) = ring[(n + 1) % 4];
                        out.push(MockEdge::line(corner(a0, b0, h), corner(a1, b1, h), max_fillet));
                    }
                }
            }
        }
        Prim::Cylinder {
            origin,
            axis,
            radius,
            height,
        } => {
            let u = vec3::any_perpendicular(*axis);
            let v = vec3::cross(*axis, u);
            let lines: Vec<Vec<f64>> = (0..GENERATOR_LINES)
                .map(|n| {
                    let a = 2.0 * PI * n as f64 / GENERATOR_LINES as f64;
                    let rim = vec3::add(
                        vec3::scale(u, radius * a.cos()),
                        vec3::scale(v, radius * a.sin()),
                    );
                    let s = vec3::add(*origin, rim);
                    transitions(s, vec3::add(s, vec3::scale(*axis, *height)), &solid)
                })
                .collect();
            for t in shared_transitions(&lines) {
                let center = vec3::add(*origin, vec3::scale(*axis, t * height));
                out.push(MockEdge::circle(center, *radius, *axis, *radius));
            }
        }
    }
    out
}

/// Transition parameters present on every generator line.
fn shared_transitions(lines: &[Vec<f64>]) -> Vec<f64> {
    let Some((first, rest)) = lines.split_first() else {
        return Vec::new();
    };
    first
        .iter()
        .copied()
        .filter(|t| {
            rest.iter()
                .all(|l| l.iter().any(|u| (u - t).abs() < LOOP_MATCH_TOL))
        })
        .collect()
}

/// Volume of `a ∩ b`, sampled on a midpoint grid over the overlap of their bounds.
fn overlap_volume(a: &Csg, b: &Csg) -> f64 {
    let Some(region) = a.bounds().intersection(&b.bounds()) else {
        return 0.0;
    };
    let size = region.size();
    let vol = region.volume();
    if vol <= 0.0 {
        return 0.0;
    }
    let scale = (OVERLAP_SAMPLES / vol).cbrt();
    let n = size.map(|d| ((d * scale).ceil() as usize).clamp(MIN_AXIS_SAMPLES, MAX_AXIS_SAMPLES));
    let cell = [
        size[0] / n[0] as f64,
        size[1] / n[1] as f64,
        size[2] / n[2] as f64,
    ];
    let mut hits = 0usize;
    for i in 0..n[0] {
        for j in 0..n[1] {
            for k in 0..n[2] {
                let p = [
                    region.min[0] + (i as f64 + 0.5) * cell[0],
                    region.min[1] + (j as f64 + 0.5) * cell[1],
                    region.min[2] + (k as f64 + 0.5) * cell[2],
                ];
                if b.inside(p, 0.0) && a.inside(p, 0.0) {
                    hits += 1;
                }
            }
        }
    }
    hits as f64 * cell[0] * cell[1] * cell[2]
}

fn cylinder_bounds(origin: Vec3, axis: Vec3, radius: f64, height: f64) -> Aabb {
    let top = vec3::add(origin, vec3::scale(axis, height));
    let reach = axis.map(|a| radius * (1.0 - a * a).max(0.0).sqrt());
    let lo = |c: Vec3| vec3::sub(c, reach);
    let hi = |c: Vec3| vec3::add(c, reach);
    Aabb::from_points([lo(origin), hi(origin), lo(top), hi(top)])
}

#[derive(Debug, Clone)]
struct MockSolid {
    shape: Arc<Csg>,
    edges: Vec<MockEdge>,
    volume: f64,
    prim: Option<Prim>,
}

/// One call to `fillet_edges`, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct FilletAttempt {
    pub edges: usize,
    pub radius: f64,
    pub succeeded: bool,
}

#[derive(Clone, Copy)]
enum Combine {
    Union,
    Difference,
}

/// Deterministic test kernel.
#[derive(Default)]
pub struct MockKernel {
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    fillet_log: Vec<FilletAttempt>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            ..Default::default()
        }
    }

    /// Every fillet attempt so far, in call order.
    pub fn fillet_attempts(&self) -> &[FilletAttempt] {
        &self.fillet_log
    }

    pub fn live_solids(&self) -> usize {
        self.solids.len()
    }

    fn store(&mut self, solid: MockSolid) -> KernelSolidHandle {
        // Default-constructed kernels start at 0; ids must stay non-zero.
        self.next_handle = self.next_handle.max(1);
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(h.id(), solid);
        h
    }

    fn get(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    fn combine(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
        op: Combine,
    ) -> Result<KernelSolidHandle, KernelError> {
        let sa = self.get(a)?;
        let sb = self.get(b)?;
        let overlap = overlap_volume(&sa.shape, &sb.shape);

        let mut edges = Vec::with_capacity(sa.edges.len() + sb.edges.len());
        for e in &sa.edges {
            edges.extend(e.trimmed(|p| !sb.shape.inside(p, EPS)));
        }
        let (shape, volume) = match op {
            Combine::Difference => {
                for e in &sb.edges {
                    edges.extend(e.trimmed(|p| sa.shape.inside(p, -EPS)));
                }
                (
                    Arc::new(Csg::Difference(sa.shape.clone(), sb.shape.clone())),
                    sa.volume - overlap,
                )
            }
            Combine::Union => {
                for e in &sb.edges {
                    edges.extend(e.trimmed(|p| !sa.shape.inside(p, EPS)));
                }
                let bounds = sa.shape.bounds().union(&sb.shape.bounds());
                (
                    Arc::new(Csg::Union(sa.shape.clone(), sb.shape.clone(), bounds)),
                    sa.volume + sb.volume - overlap,
                )
            }
        };
        if let Some(prim) = &sb.prim {
            edges.extend(section_loops(prim, &sa.shape));
        }
        debug!(overlap, edges = edges.len(), "mock boolean");
        Ok(self.store(MockSolid {
            shape,
            edges,
            volume: volume.max(0.0),
            prim: None,
        }))
    }
}

impl Kernel for MockKernel {
    fn make_box(&mut self, size: [f64; 3]) -> Result<KernelSolidHandle, KernelError> {
        if size.iter().any(|s| !(*s > 0.0) || !s.is_finite()) {
            return Err(KernelError::PrimitiveFailed {
                reason: format!("box size must be positive, got {size:?}"),
            });
        }
        let mut edges = Vec::with_capacity(12);
        for k in 0..3 {
            let (i, j) = ((k + 1) % 3, (k + 2) % 3);
            let max_fillet = size[i].min(size[j]) / 2.0;
            for (a, b) in [(0.0, 0.0), (size[i], 0.0), (0.0, size[j]), (size[i], size[j])] {
                let mut s = [0.0; 3];
                s[i] = a;
                s[j] = b;
                let mut e = s;
                e[k] = size[k];
                edges.push(MockEdge::line(s, e, max_fillet));
            }
        }
        Ok(self.store(MockSolid {
            shape: Arc::new(Csg::Cuboid {
                to_local: Affine::IDENTITY,
                size,
                bounds: Aabb::from_origin_size([0.0; 3], size),
            }),
            edges,
            volume: size[0] * size[1] * size[2],
            prim: Some(Prim::Cuboid {
                to_world: Affine::IDENTITY,
                size,
            }),
        }))
    }

    fn make_cylinder(
        &mut self,
        radius: f64,
        height: f64,
        origin: [f64; 3],
        axis: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        if !(radius > 0.0) || !(height > 0.0) {
            return Err(KernelError::PrimitiveFailed {
                reason: format!("cylinder needs positive radius and height, got r={radius} h={height}"),
            });
        }
        let axis = vec3::normalize(axis).ok_or_else(|| KernelError::PrimitiveFailed {
            reason: "cylinder axis has zero length".to_string(),
        })?;
        let max_fillet = radius.min(height) / 2.0;
        let top = vec3::add(origin, vec3::scale(axis, height));
        Ok(self.store(MockSolid {
            shape: Arc::new(Csg::Cylinder {
                origin,
                axis,
                radius,
                height,
                bounds: cylinder_bounds(origin, axis, radius, height),
            }),
            edges: vec![
                MockEdge::circle(origin, radius, axis, max_fillet),
                MockEdge::circle(top, radius, axis, max_fillet),
            ],
            volume: PI * radius * radius * height,
            prim: Some(Prim::Cylinder {
                origin,
                axis,
                radius,
                height,
            }),
        }))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.combine(a, b, Combine::Union)
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.combine(a, b, Combine::Difference)
    }

    fn transform(
        &mut self,
        solid: &KernelSolidHandle,
        transform: &Affine,
    ) -> Result<KernelSolidHandle, KernelError> {
        let inverse = transform.inverse().ok_or_else(|| KernelError::TransformFailed {
            reason: "transform is singular".to_string(),
        })?;
        let s = self.get(solid)?;
        let moved = MockSolid {
            shape: Arc::new(Csg::Transformed {
                to_local: inverse,
                child: s.shape.clone(),
                bounds: s.shape.bounds().transformed(transform),
            }),
            edges: s.edges.iter().map(|e| e.transformed(transform)).collect(),
            volume: s.volume,
            prim: s.prim.as_ref().map(|p| p.transformed(transform)),
        };
        Ok(self.store(moved))
    }

    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let s = self.get(solid)?;
        let mut indices = Vec::with_capacity(edges.len());
        for &id in edges {
            match decode_edge_id(id) {
                Some((owner, idx)) if owner == solid.id() && idx < s.edges.len() => {
                    indices.push(idx)
                }
                _ => return Err(KernelError::EntityNotFound { id }),
            }
        }
        let limit = indices
            .iter()
            .map(|&i| s.edges[i].max_fillet)
            .fold(f64::INFINITY, f64::min);
        let ok = !indices.is_empty() && radius > 0.0 && radius <= limit + 1e-12;

        let result = if ok {
            let removed: f64 = indices.iter().map(|&i| s.edges[i].length()).sum();
            let rounded: Vec<&MockEdge> = indices.iter().map(|&i| &s.edges[i]).collect();
            let mut next = s.clone();
            next.edges = s
                .edges
                .iter()
                .enumerate()
                .filter(|(i, _)| !indices.contains(i))
                .filter_map(|(_, e)| e.pulled_back(&rounded, radius))
                .collect();
            next.volume -= (1.0 - FRAC_PI_4) * radius * radius * removed;
            next.prim = None;
            Ok(next)
        } else {
            Err(KernelError::FilletFailed {
                reason: format!(
                    "radius {radius} exceeds the {limit:.3} mm the {} edge(s) can carry",
                    indices.len()
                ),
            })
        };

        self.fillet_log.push(FilletAttempt {
            edges: indices.len(),
            radius,
            succeeded: ok,
        });
        result.map(|next| self.store(next))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        _quality: &MeshQuality,
    ) -> Result<RenderMesh, KernelError> {
        let bb = self.get(solid)?.shape.bounds();
        let c = bb.corners();
        let vertices = c.iter().flat_map(|p| p.map(|x| x as f32)).collect();
        // Outward winding over the corner order of `Aabb::corners`.
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            2, 3, 7, 2, 7, 6, // back
            1, 2, 6, 1, 6, 5, // right
            3, 0, 4, 3, 4, 7, // left
        ];
        Ok(RenderMesh {
            vertices,
            normals: vec![0.0; 24],
            indices,
            face_ranges: vec![FaceRange {
                face_index: 0,
                start_index: 0,
                end_index: 36,
            }],
        })
    }

    fn volume(&self, solid: &KernelSolidHandle) -> Result<f64, KernelError> {
        Ok(self.get(solid)?.volume)
    }

    fn export_step(&self, solid: &KernelSolidHandle, _name: &str) -> Result<String, KernelError> {
        self.get(solid)?;
        Err(KernelError::NotSupported {
            operation: "export_step".to_string(),
        })
    }

    fn release(&mut self, solid: KernelSolidHandle) {
        self.solids.remove(&solid.id());
    }
}

impl KernelIntrospect for MockKernel {
    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.get(solid)
            .map(|s| (0..s.edges.len()).map(|i| edge_id(solid.id(), i)).collect())
            .unwrap_or_default()
    }

    fn edge_info(&self, edge: KernelId) -> Result<EdgeInfo, KernelError> {
        let (owner, idx) = decode_edge_id(edge).ok_or(KernelError::EntityNotFound { id: edge })?;
        let e = self
            .solids
            .get(&owner)
            .and_then(|s| s.edges.get(idx))
            .ok_or(KernelError::EntityNotFound { id: edge })?;
        Ok(EdgeInfo {
            id: edge,
            start: e.start,
            end: e.end,
            curve: e.curve.clone(),
        })
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<Aabb, KernelError> {
        Ok(self.get(solid)?.shape.bounds())
    }

    fn contains_point(&self, solid: &KernelSolidHandle, point: [f64; 3]) -> Result<bool, KernelError> {
        Ok(self.get(solid)?.shape.inside(point, -EPS))
    }
}
