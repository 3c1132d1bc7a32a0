//! Helper functions: error type, synthetic recipes, mesh math.

use std::collections::HashMap;

use case_types::{CaseVariant, MirrorPlane};
use feature_engine::{BuildError, FeatureOp, FeatureStep, Recipe, Stage};
use file_format::ExportError;
use geom_kernel::{EdgeCurve, KernelError, KernelIntrospect, KernelSolidHandle, RenderMesh};
use modeling_ops::Tool;

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("no solid built yet")]
    NoSolid,

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("STL error: {reason}")]
    StlError { reason: String },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

// ── Synthetic Recipes ───────────────────────────────────────────────────────

/// The mandatory mirror step, for hand-written recipes.
pub fn mirror_step() -> FeatureStep {
    FeatureStep::new(
        "mirror",
        Stage::Mirrored,
        FeatureOp::Mirror {
            plane: MirrorPlane::default(),
        },
    )
}

/// A `size` box with one vertical through-hole at `(x, y)`, then mirrored.
pub fn plate_with_hole(size: [f64; 3], x: f64, y: f64, radius: f64) -> Recipe {
    let mut r = Recipe::new(CaseVariant::Back, size);
    r.push(FeatureStep::new(
        "hole",
        Stage::CutoutsApplied,
        FeatureOp::Cut {
            tool: Tool::z_cylinder(x, y, -0.5, radius, size[2] + 1.0),
        },
    ));
    r.push(mirror_step());
    r
}

// ── Edge Queries ────────────────────────────────────────────────────────────

/// Centres and radii of every circular edge of a solid.
pub fn circle_edges(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
) -> Result<Vec<([f64; 3], f64)>, HarnessError> {
    Ok(introspect
        .edges(solid)?
        .into_iter()
        .filter_map(|e| match e.curve {
            EdgeCurve::Circle { center, radius, .. } => Some((center, radius)),
            _ => None,
        })
        .collect())
}

// ── Mesh Math ───────────────────────────────────────────────────────────────

/// Compute the axis-aligned bounding box of a mesh.
///
/// Returns ([min_x, min_y, min_z], [max_x, max_y, max_z]).
pub fn mesh_bounding_box(mesh: &RenderMesh) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for v in mesh.vertices.chunks_exact(3) {
        for i in 0..3 {
            min[i] = min[i].min(v[i]);
            max[i] = max[i].max(v[i]);
        }
    }
    (min, max)
}

/// Total surface area of the triangles.
pub fn mesh_surface_area(mesh: &RenderMesh) -> f64 {
    let verts = &mesh.vertices;
    let mut area = 0.0;
    for tri in mesh.indices.chunks_exact(3) {
        let (i0, i1, i2) = (
            tri[0] as usize * 3,
            tri[1] as usize * 3,
            tri[2] as usize * 3,
        );
        if i0 + 2 >= verts.len() || i1 + 2 >= verts.len() || i2 + 2 >= verts.len() {
            continue;
        }

        let ax = verts[i1] as f64 - verts[i0] as f64;
        let ay = verts[i1 + 1] as f64 - verts[i0 + 1] as f64;
        let az = verts[i1 + 2] as f64 - verts[i0 + 2] as f64;
        let bx = verts[i2] as f64 - verts[i0] as f64;
        let by = verts[i2 + 1] as f64 - verts[i0 + 1] as f64;
        let bz = verts[i2 + 2] as f64 - verts[i0 + 2] as f64;

        let cx = ay * bz - az * by;
        let cy = az * bx - ax * bz;
        let cz = ax * by - ay * bx;
        area += (cx * cx + cy * cy + cz * cz).sqrt() / 2.0;
    }
    area
}

/// Count mesh edges: returns (total_edges, boundary_edges).
///
/// A boundary edge is shared by exactly 1 triangle.
pub fn count_mesh_edges(mesh: &RenderMesh) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), usize> = HashMap::new();
    for tri in mesh.indices.chunks_exact(3) {
        for &(a, b) in &[(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            *edge_counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }
    let total = edge_counts.len();
    let boundary = edge_counts.values().filter(|&&c| c == 1).count();
    (total, boundary)
}

#[cfg(test)]
pub(crate) fn unit_cube_mesh() -> RenderMesh {
    RenderMesh {
        vertices: vec![
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0,
            1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
        ],
        normals: vec![0.0; 24],
        indices: vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            2, 3, 7, 2, 7, 6, // back
            1, 2, 6, 1, 6, 5, // right
            3, 0, 4, 3, 4, 7, // left
        ],
        face_ranges: vec![],
    }
}
