use serde::{Deserialize, Serialize};

use case_types::vec3::{self, Vec3};

/// Opaque handle to a solid in the geometry kernel.
///
/// Deliberately not `Clone`: every operation produces a fresh handle and the old one is
/// handed back through [`crate::Kernel::release`], so a stale solid cannot be reused.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Transient kernel entity identifier.
///
/// Edge ids embed the owning solid, so an id taken from one solid is rejected by every
/// other solid, including the solid that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelId(pub u64);

/// Ids per solid. Edges are numbered from [`EDGE_ID_BASE`] within each block.
pub(crate) const ENTITY_STRIDE: u64 = 1_000_000;
pub(crate) const EDGE_ID_BASE: u64 = 1000;

pub(crate) fn edge_id(solid: u64, index: usize) -> KernelId {
    KernelId(solid * ENTITY_STRIDE + EDGE_ID_BASE + index as u64)
}

/// Splits an edge id into (solid, edge index).
pub(crate) fn decode_edge_id(id: KernelId) -> Option<(u64, usize)> {
    let solid = id.0 / ENTITY_STRIDE;
    let local = id.0 % ENTITY_STRIDE;
    local
        .checked_sub(EDGE_ID_BASE)
        .map(|idx| (solid, idx as usize))
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("transform failed: {reason}")]
    TransformFailed { reason: String },

    #[error("primitive construction failed: {reason}")]
    PrimitiveFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("STEP export failed: {reason}")]
    ExportFailed { reason: String },

    #[error("entity not found: {id:?}")]
    EntityNotFound { id: KernelId },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

impl KernelError {
    /// Failures caused by the requested geometry rather than by misuse of the kernel.
    /// Optional feature steps recover from these; lookup errors are always bugs.
    pub fn is_geometry_failure(&self) -> bool {
        matches!(
            self,
            KernelError::BooleanFailed { .. }
                | KernelError::FilletFailed { .. }
                | KernelError::TransformFailed { .. }
                | KernelError::PrimitiveFailed { .. }
                | KernelError::NotSupported { .. }
        )
    }
}

/// Tessellated triangle mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals, parallel to `vertices`.
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
    /// Mapping from triangle ranges to logical faces.
    pub face_ranges: Vec<FaceRange>,
}

impl RenderMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn position(&self, i: u32) -> Vec3 {
        let i = i as usize * 3;
        [
            self.vertices[i] as f64,
            self.vertices[i + 1] as f64,
            self.vertices[i + 2] as f64,
        ]
    }

    /// Enclosed volume by the divergence theorem. Exact for a closed, consistently
    /// oriented mesh.
    pub fn enclosed_volume(&self) -> f64 {
        let v = |i: u32| self.position(i);
        let signed: f64 = self
            .indices
            .chunks_exact(3)
            .map(|t| vec3::dot(v(t[0]), vec3::cross(v(t[1]), v(t[2]))) / 6.0)
            .sum();
        signed.abs()
    }

    /// Point membership by ray parity. Only meaningful for a closed mesh; points on
    /// the surface may land either way.
    pub fn contains_point(&self, p: Vec3) -> bool {
        let crossings = self
            .indices
            .chunks_exact(3)
            .filter(|t| {
                ray_crosses(
                    p,
                    PARITY_RAY,
                    self.position(t[0]),
                    self.position(t[1]),
                    self.position(t[2]),
                )
            })
            .count();
        crossings % 2 == 1
    }
}

/// Skewed off every axis and diagonal so the ray does not graze axis-aligned edges.
const PARITY_RAY: Vec3 = [0.5377, 0.6233, 0.5679];

/// Moller-Trumbore: does the ray from `o` along `d` cross triangle `abc`?
fn ray_crosses(o: Vec3, d: Vec3, a: Vec3, b: Vec3, c: Vec3) -> bool {
    let e1 = vec3::sub(b, a);
    let e2 = vec3::sub(c, a);
    let h = vec3::cross(d, e2);
    let det = vec3::dot(e1, h);
    if det.abs() < 1e-14 {
        return false;
    }
    let inv = 1.0 / det;
    let s = vec3::sub(o, a);
    let u = vec3::dot(s, h) * inv;
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = vec3::cross(s, e1);
    let w = vec3::dot(d, q) * inv;
    if w < 0.0 || u + w > 1.0 {
        return false;
    }
    vec3::dot(e2, q) * inv > 1e-12
}

/// Maps a contiguous range of triangle indices to one kernel face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRange {
    pub face_index: u32,
    /// Start index in the indices array (inclusive).
    pub start_index: u32,
    /// End index in the indices array (exclusive).
    pub end_index: u32,
}

/// Geometric classification of an edge's curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeCurve {
    Line,
    Circle {
        center: Vec3,
        radius: f64,
        normal: Vec3,
    },
    Other,
}

/// One edge of a solid as reported by introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInfo {
    pub id: KernelId,
    pub start: Vec3,
    pub end: Vec3,
    pub curve: EdgeCurve,
}

impl EdgeInfo {
    pub fn is_closed(&self, tol: f64) -> bool {
        vec3::distance(self.start, self.end) < tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_ids_round_trip_and_embed_solid() {
        let id = edge_id(7, 42);
        assert_eq!(decode_edge_id(id), Some((7, 42)));
        assert_ne!(edge_id(8, 42), id);
    }

    #[test]
    fn unit_tetra_volume() {
        let mesh = RenderMesh {
            vertices: vec![0., 0., 0., 1., 0., 0., 0., 1., 0., 0., 0., 1.],
            normals: Vec::new(),
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
            face_ranges: Vec::new(),
        };
        assert!((mesh.enclosed_volume() - 1.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn parity_membership_in_tetra() {
        let mesh = RenderMesh {
            vertices: vec![0., 0., 0., 1., 0., 0., 0., 1., 0., 0., 0., 1.],
            normals: Vec::new(),
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
            face_ranges: Vec::new(),
        };
        assert!(mesh.contains_point([0.1, 0.1, 0.1]));
        assert!(mesh.contains_point([0.2, 0.3, 0.05]));
        assert!(!mesh.contains_point([0.5, 0.5, 0.5]));
        assert!(!mesh.contains_point([-0.1, 0.1, 0.1]));
    }

    #[test]
    fn geometry_failures_are_classified() {
        assert!(KernelError::FilletFailed { reason: "r".into() }.is_geometry_failure());
        assert!(KernelError::NotSupported { operation: "fillet".into() }.is_geometry_failure());
        assert!(!KernelError::EntityNotFound { id: KernelId(1) }.is_geometry_failure());
    }
}
