use case_types::{Aabb, Affine, MeshQuality};

use crate::types::*;

/// Core geometry kernel trait: primitive construction, booleans, transforms, fillets
/// and export. Implemented by TruckKernel (truck B-Rep) and MockKernel (deterministic
/// test double).
///
/// Operations never modify their inputs; each returns a new handle.
pub trait Kernel {
    /// Axis-aligned box with one corner at the origin and the opposite at `size`.
    fn make_box(&mut self, size: [f64; 3]) -> Result<KernelSolidHandle, KernelError>;

    /// Cylinder whose base disc is centred at `origin`, extruded `height` along `axis`.
    fn make_cylinder(
        &mut self,
        radius: f64,
        height: f64,
        origin: [f64; 3],
        axis: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean subtraction: a minus b.
    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Apply a placement (translation, rotation or reflection). Reflected solids keep
    /// outward-facing boundaries.
    fn transform(
        &mut self,
        solid: &KernelSolidHandle,
        transform: &Affine,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Round the given edges. Fails with `FilletFailed` when the local topology cannot
    /// carry the radius.
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Tessellate a solid to a triangle mesh.
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        quality: &MeshQuality,
    ) -> Result<RenderMesh, KernelError>;

    /// Enclosed volume in cubic millimetres.
    fn volume(&self, solid: &KernelSolidHandle) -> Result<f64, KernelError>;

    /// Serialize the exact B-Rep as a STEP document.
    fn export_step(&self, solid: &KernelSolidHandle, name: &str) -> Result<String, KernelError>;

    /// Drop a solid. Releasing an unknown handle is a no-op.
    fn release(&mut self, solid: KernelSolidHandle);
}

/// Read-only topology queries.
pub trait KernelIntrospect {
    /// Edge ids of a solid, in the kernel's stable order.
    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// Endpoints and curve classification of one edge.
    fn edge_info(&self, edge: KernelId) -> Result<EdgeInfo, KernelError>;

    /// Every edge of the solid with its geometry, in `list_edges` order.
    fn edges(&self, solid: &KernelSolidHandle) -> Result<Vec<EdgeInfo>, KernelError> {
        self.list_edges(solid)
            .into_iter()
            .map(|id| self.edge_info(id))
            .collect()
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<Aabb, KernelError>;

    /// Point membership, where the kernel can answer it.
    fn contains_point(
        &self,
        _solid: &KernelSolidHandle,
        _point: [f64; 3],
    ) -> Result<bool, KernelError> {
        Err(KernelError::NotSupported {
            operation: "contains_point".to_string(),
        })
    }
}
