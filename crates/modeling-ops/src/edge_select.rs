//! Edge Selector: declarative geometric patterns evaluated against the current topology.
//!
//! Predicates look only at an edge's endpoints, so they are pure and can be serialized
//! into recipes. Edge ids die with their solid; selections are re-run after every
//! topology change and tracked across changes by [`EdgeKey`].

use case_types::vec3::{self, Vec3};
use case_types::Rect2;
use geom_kernel::{EdgeCurve, EdgeInfo, KernelIntrospect, KernelSolidHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::OpError;

/// Two coordinates closer than this are the same point.
pub const COINCIDENT_TOL: f64 = 1e-6;
/// Snap tolerance for absolute-coordinate patterns such as corners.
pub const SNAP_TOL: f64 = 0.1;
/// Perimeter tolerance; wide enough to catch edges split by nearby cutouts.
pub const PERIMETER_TOL: f64 = 1.0;

/// How an edge relates to a rectangular zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneMode {
    /// Either endpoint strictly inside the zone.
    AnyEndpoint,
    /// Both endpoints within the zone's x span, or both within its y span.
    BothOnAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgePredicate {
    /// Vertical edge standing on one of the footprint corners `(x[i], y[j])`.
    CornerVertical { x: [f64; 2], y: [f64; 2], tol: f64 },
    /// Both endpoints at height `z`.
    HorizontalAt { z: f64, tol: f64 },
    /// Both endpoints on a side of one of the rectangles.
    OnPerimeter { rects: Vec<Rect2>, tol: f64 },
    InZone { rect: Rect2, mode: ZoneMode },
    /// Endpoints differ in xy. Rejects vertical edges and closed loops.
    NonDegenerate { tol: f64 },
    All { of: Vec<EdgePredicate> },
    Not { inner: Box<EdgePredicate> },
}

fn near(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

impl EdgePredicate {
    pub fn all(of: Vec<EdgePredicate>) -> Self {
        EdgePredicate::All { of }
    }

    pub fn not(inner: EdgePredicate) -> Self {
        EdgePredicate::Not {
            inner: Box::new(inner),
        }
    }

    pub fn matches(&self, edge: &EdgeInfo) -> bool {
        let (s, e) = (edge.start, edge.end);
        match self {
            EdgePredicate::CornerVertical { x, y, tol } => {
                near(s[0], e[0], *tol)
                    && near(s[1], e[1], *tol)
                    && !near(s[2], e[2], *tol)
                    && x.iter().any(|cx| near(s[0], *cx, *tol))
                    && y.iter().any(|cy| near(s[1], *cy, *tol))
            }
            EdgePredicate::HorizontalAt { z, tol } => near(s[2], *z, *tol) && near(e[2], *z, *tol),
            EdgePredicate::OnPerimeter { rects, tol } => {
                let on = |p: Vec3| rects.iter().any(|r| r.on_boundary(p[0], p[1], *tol));
                on(s) && on(e)
            }
            EdgePredicate::InZone { rect, mode } => match mode {
                ZoneMode::AnyEndpoint => {
                    rect.contains_strict(s[0], s[1]) || rect.contains_strict(e[0], e[1])
                }
                ZoneMode::BothOnAxis => {
                    let in_x = |p: Vec3| p[0] >= rect.min[0] && p[0] <= rect.max[0];
                    let in_y = |p: Vec3| p[1] >= rect.min[1] && p[1] <= rect.max[1];
                    (in_x(s) && in_x(e)) || (in_y(s) && in_y(e))
                }
            },
            EdgePredicate::NonDegenerate { tol } => {
                !(near(s[0], e[0], *tol) && near(s[1], e[1], *tol))
            }
            EdgePredicate::All { of } => of.iter().all(|p| p.matches(edge)),
            EdgePredicate::Not { inner } => !inner.matches(edge),
        }
    }

    /// Every tolerance used anywhere in the predicate tree.
    pub fn tolerances(&self) -> Vec<f64> {
        match self {
            EdgePredicate::CornerVertical { tol, .. }
            | EdgePredicate::HorizontalAt { tol, .. }
            | EdgePredicate::OnPerimeter { tol, .. }
            | EdgePredicate::NonDegenerate { tol } => vec![*tol],
            EdgePredicate::InZone { .. } => Vec::new(),
            EdgePredicate::All { of } => of.iter().flat_map(|p| p.tolerances()).collect(),
            EdgePredicate::Not { inner } => inner.tolerances(),
        }
    }

    /// The same pattern for a solid reflected through x = 0.
    pub fn mirrored_x(&self) -> EdgePredicate {
        match self {
            EdgePredicate::CornerVertical { x, y, tol } => EdgePredicate::CornerVertical {
                x: [-x[0], -x[1]],
                y: *y,
                tol: *tol,
            },
            EdgePredicate::OnPerimeter { rects, tol } => EdgePredicate::OnPerimeter {
                rects: rects.iter().map(Rect2::mirrored_x).collect(),
                tol: *tol,
            },
            EdgePredicate::InZone { rect, mode } => EdgePredicate::InZone {
                rect: rect.mirrored_x(),
                mode: *mode,
            },
            EdgePredicate::All { of } => EdgePredicate::All {
                of: of.iter().map(EdgePredicate::mirrored_x).collect(),
            },
            EdgePredicate::Not { inner } => EdgePredicate::not(inner.mirrored_x()),
            other => other.clone(),
        }
    }
}

/// Run `predicate` over the solid's current edges, in kernel order.
pub fn select_edges(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    predicate: &EdgePredicate,
) -> Result<Vec<EdgeInfo>, OpError> {
    let all = introspect.edges(solid)?;
    let total = all.len();
    let selected: Vec<EdgeInfo> = all.into_iter().filter(|e| predicate.matches(e)).collect();
    debug!(total, selected = selected.len(), "edge selection");
    Ok(selected)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Support {
    Line,
    Circle { center: Vec3, radius: f64 },
    Other,
}

/// Geometric identity of an edge: its endpoints without orientation, plus the curve it
/// lies on (circular edges have coincident endpoints).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeKey {
    lo: Vec3,
    hi: Vec3,
    support: Support,
}

impl EdgeKey {
    pub fn of(edge: &EdgeInfo) -> Self {
        let (lo, hi) = if edge.start <= edge.end {
            (edge.start, edge.end)
        } else {
            (edge.end, edge.start)
        };
        let support = match edge.curve {
            EdgeCurve::Line => Support::Line,
            EdgeCurve::Circle { center, radius, .. } => Support::Circle { center, radius },
            EdgeCurve::Other => Support::Other,
        };
        Self { lo, hi, support }
    }

    pub fn same_as(&self, other: &EdgeKey, tol: f64) -> bool {
        let close = |a: Vec3, b: Vec3| vec3::distance(a, b) <= tol;
        let ends = (close(self.lo, other.lo) && close(self.hi, other.hi))
            || (close(self.lo, other.hi) && close(self.hi, other.lo));
        let centers = match (self.support, other.support) {
            (Support::Circle { center: a, .. }, Support::Circle { center: b, .. }) => close(a, b),
            (Support::Circle { .. }, _) | (_, Support::Circle { .. }) => false,
            _ => true,
        };
        ends && centers
    }

    /// `other` lies on this edge's curve and overlaps it: the same circle, or a
    /// collinear line sharing more than `tol` of its length. Holds after a neighbouring
    /// fillet has trimmed the edge back, when the endpoints no longer agree.
    pub fn same_support(&self, other: &EdgeKey, tol: f64) -> bool {
        match (self.support, other.support) {
            (
                Support::Circle { center: a, radius: ra },
                Support::Circle { center: b, radius: rb },
            ) => vec3::distance(a, b) <= tol && (ra - rb).abs() <= tol,
            (Support::Line, Support::Line) => {
                let Some(dir) = vec3::normalize(vec3::sub(self.hi, self.lo)) else {
                    return self.same_as(other, tol);
                };
                let along = |p: Vec3| vec3::dot(vec3::sub(p, self.lo), dir);
                let off = |p: Vec3| {
                    let d = vec3::sub(p, self.lo);
                    vec3::norm(vec3::sub(d, vec3::scale(dir, vec3::dot(d, dir))))
                };
                if off(other.lo) > tol || off(other.hi) > tol {
                    return false;
                }
                let (a, b) = (along(other.lo), along(other.hi));
                let shared = along(self.hi).min(a.max(b)) - a.min(b).max(0.0);
                shared > tol
            }
            _ => self.same_as(other, tol),
        }
    }

    /// First edge in `edges` with this identity.
    pub fn find<'a>(&self, edges: &'a [EdgeInfo], tol: f64) -> Option<&'a EdgeInfo> {
        edges.iter().find(|e| self.same_as(&EdgeKey::of(e), tol))
    }

    /// The edge this one has become: an exact match within `exact_tol`, otherwise the
    /// first edge on the same supporting curve within `support_tol`.
    pub fn find_on_support<'a>(
        &self,
        edges: &'a [EdgeInfo],
        exact_tol: f64,
        support_tol: f64,
    ) -> Option<&'a EdgeInfo> {
        self.find(edges, exact_tol).or_else(|| {
            edges
                .iter()
                .find(|e| self.same_support(&EdgeKey::of(e), support_tol))
        })
    }
}

/// Two selections name the same edges, ignoring order.
pub fn same_edge_set(a: &[EdgeInfo], b: &[EdgeInfo], tol: f64) -> bool {
    a.len() == b.len()
        && a.iter().all(|e| EdgeKey::of(e).find(b, tol).is_some())
        && b.iter().all(|e| EdgeKey::of(e).find(a, tol).is_some())
}
