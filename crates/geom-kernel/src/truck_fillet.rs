//! Straight-edge blends on truck solids, built from booleans.
//!
//! truck has no rolling-ball fillet. A convex, axis-aligned straight edge is rounded
//! by cutting away the sliver between the edge and a cylinder tangent to both of its
//! faces. Any other edge is refused. An inner corner would need a fill ending flush
//! with the end faces, and truck's booleans do not take coplanar faces.

use case_types::vec3::{self, Vec3};
use case_types::Affine;
use tracing::debug;
use truck_modeling::topology::Solid;

use crate::primitives;
use crate::tessellation;
use crate::truck_kernel::subtract_solids;
use crate::types::*;

/// Chord tolerance of the mesh used to sort quadrants into material and air.
const MEMBERSHIP_TOLERANCE: f64 = 0.005;
/// The cylinder is this much wider than the radius so it crosses both faces instead
/// of grazing them.
const BLEND_OVERSIZE: f64 = 0.02;
/// How far the blend tool reaches past the edge faces and past its own ends.
const BLOCK_MARGIN: f64 = 0.25;
/// How far an edge end that opens into air is carried past the solid.
const END_OVERSHOOT: f64 = 1.0;
const AXIS_TOL: f64 = 1e-9;

/// Everything needed to build one blend tool.
#[derive(Debug, Clone)]
struct BlendPlan {
    /// Axis indices: along the edge, then the two across it.
    axes: [usize; 3],
    /// Which way the material lies from the edge along the two cross axes.
    signs: [f64; 2],
    /// Edge position on the two cross axes.
    at: [f64; 2],
    /// Tool extent along the edge.
    span: [f64; 2],
    radius: f64,
}

/// Round every edge in `edges` at `radius`. All edges are planned against the input
/// solid, then the blends are applied one after another.
pub(crate) fn blend_edges(
    solid: &Solid,
    edges: &[EdgeInfo],
    radius: f64,
) -> Result<Solid, KernelError> {
    if edges.is_empty() {
        return Err(KernelError::FilletFailed {
            reason: "no edges to round".to_string(),
        });
    }
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(KernelError::FilletFailed {
            reason: format!("radius must be positive, got {radius}"),
        });
    }
    let mesh = tessellation::mesh_at(solid, MEMBERSHIP_TOLERANCE)?;
    let inside = |p: Vec3| mesh.contains_point(p);
    let plans = edges
        .iter()
        .map(|e| plan(e, radius, &inside))
        .collect::<Result<Vec<_>, _>>()?;

    let mut current = solid.clone();
    for (edge, p) in edges.iter().zip(&plans) {
        let tool = build_tool(p)?;
        current = subtract_solids(&current, &tool).map_err(|e| KernelError::FilletFailed {
            reason: format!("blend at edge {:?}: {e}", edge.id),
        })?;
        debug!(edge = edge.id.0, radius, "edge blended");
    }
    Ok(current)
}

fn failed(reason: &str) -> KernelError {
    KernelError::FilletFailed {
        reason: reason.to_string(),
    }
}

fn unit(axis: usize) -> Vec3 {
    let mut v = [0.0; 3];
    v[axis] = 1.0;
    v
}

/// Offset `p` along the two cross axes.
fn across(p: Vec3, axes: [usize; 3], db: f64, dc: f64) -> Vec3 {
    let mut q = p;
    q[axes[1]] += db;
    q[axes[2]] += dc;
    q
}

fn plan(
    edge: &EdgeInfo,
    radius: f64,
    inside: &impl Fn(Vec3) -> bool,
) -> Result<BlendPlan, KernelError> {
    if edge.curve != EdgeCurve::Line {
        return Err(failed("only straight edges can be blended"));
    }
    let dir = vec3::normalize(vec3::sub(edge.end, edge.start))
        .ok_or_else(|| failed("edge has no length"))?;
    let along = (0..3)
        .find(|&i| dir[i].abs() > 1.0 - AXIS_TOL)
        .ok_or_else(|| failed("edge is not axis-aligned"))?;
    let axes = [along, (along + 1) % 3, (along + 2) % 3];
    let step = (radius / 4.0).min(0.1);
    let mid = vec3::lerp(edge.start, edge.end, 0.5);

    let quadrants = [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)];
    let solid_in: Vec<bool> = quadrants
        .iter()
        .map(|&(sb, sc)| inside(across(mid, axes, sb * step, sc * step)))
        .collect();
    let (sb, sc) = match solid_in.iter().filter(|&&s| s).count() {
        1 => solid_in
            .iter()
            .position(|&s| s)
            .map(|i| quadrants[i])
            .ok_or_else(|| failed("edge is not a corner between two faces"))?,
        3 => return Err(failed("inner corners are not blended")),
        _ => return Err(failed("edge is not a corner between two faces")),
    };

    // Both faces must carry the tangent line of the blend.
    let reach = radius - step;
    let fits = inside(across(mid, axes, sb * step, sc * reach))
        && inside(across(mid, axes, sb * reach, sc * step));
    if !fits {
        return Err(failed("radius exceeds the adjacent face"));
    }

    // An end that runs into further material is cut flush, so the blend does not
    // gouge it.
    let (lo, hi) = {
        let (a, b) = (edge.start[along], edge.end[along]);
        (a.min(b), a.max(b))
    };
    let extend = |value: f64, outward: f64| {
        let mut p = across(mid, axes, sb * step, sc * step);
        p[along] = value + outward * step;
        !inside(p)
    };
    let span = [
        if extend(lo, -1.0) { lo - END_OVERSHOOT } else { lo },
        if extend(hi, 1.0) { hi + END_OVERSHOOT } else { hi },
    ];

    Ok(BlendPlan {
        axes,
        signs: [sb, sc],
        at: [mid[axes[1]], mid[axes[2]]],
        span,
        radius,
    })
}

/// The sliver between the edge and the blend cylinder, as a block minus a cylinder.
fn build_tool(p: &BlendPlan) -> Result<Solid, KernelError> {
    let [ia, ib, ic] = p.axes;
    let mut lo = [0.0; 3];
    let mut hi = [0.0; 3];
    lo[ia] = p.span[0];
    hi[ia] = p.span[1];
    for (k, axis) in [ib, ic].into_iter().enumerate() {
        let near = p.at[k] - p.signs[k] * BLOCK_MARGIN;
        let far = p.at[k] + p.signs[k] * p.radius;
        lo[axis] = near.min(far);
        hi[axis] = near.max(far);
    }
    let block = primitives::transformed(
        &primitives::make_box(vec3::sub(hi, lo))?,
        &Affine::translation(lo),
    );

    let mut origin = [0.0; 3];
    origin[ia] = p.span[0] - BLOCK_MARGIN;
    origin[ib] = p.at[0] + p.signs[0] * p.radius;
    origin[ic] = p.at[1] + p.signs[1] * p.radius;
    let cylinder = primitives::make_cylinder(
        p.radius + BLEND_OVERSIZE,
        p.span[1] - p.span[0] + 2.0 * BLOCK_MARGIN,
        origin,
        unit(ia),
    )?;
    subtract_solids(&block, &cylinder)
}
