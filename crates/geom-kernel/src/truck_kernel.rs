//! TruckKernel: the production kernel, wrapping truck's B-Rep modeling and boolean ops.
//!
//! Fillets are limited to axis-aligned straight edges, blended through booleans.

use std::collections::HashMap;

use case_types::{Affine, MeshQuality};
use tracing::{debug, instrument};
use truck_modeling::topology::Solid;
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModel};

use crate::primitives;
use crate::tessellation;
use crate::traits::Kernel;
use crate::truck_fillet;
use crate::truck_introspect;
use crate::types::*;

/// Shape-op tolerance handed to truck-shapeops.
const BOOLEAN_TOLERANCE: f64 = 0.05;
/// Chord tolerance for volume estimates. Coarser than print output.
const VOLUME_TOLERANCE: f64 = 0.01;

/// Real geometry kernel backed by the truck B-Rep library.
pub struct TruckKernel {
    next_handle: u64,
    solids: HashMap<u64, Solid>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(h.id(), solid);
        h
    }

    pub(crate) fn get_solid(&self, handle: &KernelSolidHandle) -> Result<&Solid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    pub(crate) fn solid_by_id(&self, id: u64) -> Option<&Solid> {
        self.solids.get(&id)
    }

    /// Number of live solids. Pipelines release intermediates, so this stays small.
    pub fn live_solids(&self) -> usize {
        self.solids.len()
    }
}

fn union_solids(a: &Solid, b: &Solid) -> Result<Solid, KernelError> {
    truck_shapeops::or(a, b, BOOLEAN_TOLERANCE).ok_or_else(|| KernelError::BooleanFailed {
        reason: "truck or() returned None".to_string(),
    })
}

pub(crate) fn subtract_solids(a: &Solid, b: &Solid) -> Result<Solid, KernelError> {
    // a - b = a AND (NOT b)
    let mut tool = b.clone();
    tool.not();
    truck_shapeops::and(a, &tool, BOOLEAN_TOLERANCE).ok_or_else(|| KernelError::BooleanFailed {
        reason: "truck and() returned None for subtraction".to_string(),
    })
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckKernel {
    #[instrument(skip(self))]
    fn make_box(&mut self, size: [f64; 3]) -> Result<KernelSolidHandle, KernelError> {
        let solid = primitives::make_box(size)?;
        Ok(self.store_solid(solid))
    }

    #[instrument(skip(self))]
    fn make_cylinder(
        &mut self,
        radius: f64,
        height: f64,
        origin: [f64; 3],
        axis: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid = primitives::make_cylinder(radius, height, origin, axis)?;
        Ok(self.store_solid(solid))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let result = union_solids(self.get_solid(a)?, self.get_solid(b)?)?;
        debug!(a = a.id(), b = b.id(), "union");
        Ok(self.store_solid(result))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let result = subtract_solids(self.get_solid(a)?, self.get_solid(b)?)?;
        debug!(a = a.id(), b = b.id(), "subtract");
        Ok(self.store_solid(result))
    }

    fn transform(
        &mut self,
        solid: &KernelSolidHandle,
        transform: &Affine,
    ) -> Result<KernelSolidHandle, KernelError> {
        if transform.determinant().abs() < 1e-12 {
            return Err(KernelError::TransformFailed {
                reason: "transform is singular".to_string(),
            });
        }
        let moved = primitives::transformed(self.get_solid(solid)?, transform);
        Ok(self.store_solid(moved))
    }

    #[instrument(skip(self, edges), fields(edges = edges.len()))]
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let body = self.get_solid(solid)?;
        let all = truck_introspect::unique_edges(body);
        let infos = edges
            .iter()
            .map(|&id| match decode_edge_id(id) {
                Some((owner, idx)) if owner == solid.id() && idx < all.len() => {
                    Ok(truck_introspect::describe(id, &all[idx]))
                }
                _ => Err(KernelError::EntityNotFound { id }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rounded = truck_fillet::blend_edges(body, &infos, radius)?;
        Ok(self.store_solid(rounded))
    }

    #[instrument(skip(self, solid))]
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        quality: &MeshQuality,
    ) -> Result<RenderMesh, KernelError> {
        let mesh = tessellation::tessellate_solid(self.get_solid(solid)?, quality)?;
        debug!(triangles = mesh.triangle_count(), "tessellated");
        Ok(mesh)
    }

    fn volume(&self, solid: &KernelSolidHandle) -> Result<f64, KernelError> {
        Ok(tessellation::solid_volume(self.get_solid(solid)?, VOLUME_TOLERANCE))
    }

    fn export_step(&self, solid: &KernelSolidHandle, name: &str) -> Result<String, KernelError> {
        let compressed = self.get_solid(solid)?.compress();
        let model = StepModel::from(&compressed);
        let header = StepHeaderDescriptor {
            file_name: format!("{name}.step"),
            organization_system: "case-forge".to_string(),
            ..Default::default()
        };
        let text = CompleteStepDisplay::new(model, header).to_string();
        if text.is_empty() {
            return Err(KernelError::ExportFailed {
                reason: "STEP writer produced no output".to_string(),
            });
        }
        Ok(text)
    }

    fn release(&mut self, solid: KernelSolidHandle) {
        self.solids.remove(&solid.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::KernelIntrospect;
    use approx::assert_relative_eq;
    use case_types::vec3;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn subtract_hole_reduces_volume() {
        let mut k = TruckKernel::new();
        let plate = k.make_box([10.0, 10.0, 2.0]).unwrap();
        let pin = k
            .make_cylinder(1.0, 4.0, [5.0, 5.0, -1.0], [0.0, 0.0, 1.0])
            .unwrap();
        let drilled = k.boolean_subtract(&plate, &pin).unwrap();
        let v = k.volume(&drilled).unwrap();
        let expected = 200.0 - std::f64::consts::PI * 2.0;
        assert!((v - expected).abs() < 0.1, "volume {v}");
    }

    #[test]
    fn mirror_keeps_volume_positive() {
        let mut k = TruckKernel::new();
        let b = k.make_box([3.0, 2.0, 1.0]).unwrap();
        let m = k
            .transform(&b, &Affine::reflection([0.0; 3], vec3::X))
            .unwrap();
        assert_relative_eq!(k.volume(&m).unwrap(), 6.0, epsilon = 1e-6);
    }

    #[test]
    fn fillet_rounds_vertical_box_corners() {
        let mut k = TruckKernel::new();
        let b = k.make_box([20.0, 10.0, 5.0]).unwrap();
        let vertical: Vec<KernelId> = k
            .edges(&b)
            .unwrap()
            .into_iter()
            .filter(|e| (e.start[2] - e.end[2]).abs() > 1.0)
            .map(|e| e.id)
            .collect();
        assert_eq!(vertical.len(), 4);
        let r = 2.0;
        let rounded = k.fillet_edges(&b, &vertical, r).unwrap();
        let removed = 1000.0 - k.volume(&rounded).unwrap();
        let ideal = 4.0 * (1.0 - FRAC_PI_4) * r * r * 5.0;
        assert!(removed > 0.8 * ideal && removed < 1.05 * ideal, "removed {removed}");
        assert!(!k.contains_point(&rounded, [0.2, 0.2, 2.5]).unwrap());
        assert!(k.contains_point(&rounded, [2.0, 2.0, 2.5]).unwrap());
    }

    #[test]
    fn fillet_refuses_inner_corner() {
        let mut k = TruckKernel::new();
        let plate = k.make_box([6.0, 6.0, 3.0]).unwrap();
        let notch = k.make_box([5.0, 5.0, 5.0]).unwrap();
        let notch = k
            .transform(&notch, &Affine::translation([2.0, 2.0, -1.0]))
            .unwrap();
        let l = k.boolean_subtract(&plate, &notch).unwrap();
        let inner: Vec<KernelId> = k
            .edges(&l)
            .unwrap()
            .into_iter()
            .filter(|e| {
                [e.start, e.end]
                    .iter()
                    .all(|p| (p[0] - 2.0).abs() < 1e-6 && (p[1] - 2.0).abs() < 1e-6)
            })
            .map(|e| e.id)
            .collect();
        assert_eq!(inner.len(), 1);
        let err = k.fillet_edges(&l, &inner, 1.0).unwrap_err();
        assert!(matches!(err, KernelError::FilletFailed { .. }), "{err}");
    }

    #[test]
    fn fillet_refuses_radius_wider_than_face() {
        let mut k = TruckKernel::new();
        // Vertical edges sit between a 20 mm face and a 2 mm face.
        let b = k.make_box([20.0, 2.0, 5.0]).unwrap();
        let edge = k
            .edges(&b)
            .unwrap()
            .into_iter()
            .find(|e| (e.start[2] - e.end[2]).abs() > 1.0)
            .unwrap();
        let err = k.fillet_edges(&b, &[edge.id], 3.0).unwrap_err();
        assert!(matches!(err, KernelError::FilletFailed { .. }), "{err}");
        assert!(err.is_geometry_failure());
        assert_eq!(k.live_solids(), 1);
    }

    #[test]
    fn fillet_refuses_circular_edges() {
        let mut k = TruckKernel::new();
        let c = k
            .make_cylinder(3.0, 2.0, [0.0; 3], [0.0, 0.0, 1.0])
            .unwrap();
        let circle = k
            .edges(&c)
            .unwrap()
            .into_iter()
            .find(|e| matches!(e.curve, EdgeCurve::Circle { .. }))
            .unwrap();
        assert!(matches!(
            k.fillet_edges(&c, &[circle.id], 0.5),
            Err(KernelError::FilletFailed { .. })
        ));
    }

    #[test]
    fn fillet_rejects_edges_of_other_solids() {
        let mut k = TruckKernel::new();
        let a = k.make_box([1.0, 1.0, 1.0]).unwrap();
        let b = k.make_box([1.0, 1.0, 1.0]).unwrap();
        let foreign = k.list_edges(&a)[0];
        assert!(matches!(
            k.fillet_edges(&b, &[foreign], 0.1),
            Err(KernelError::EntityNotFound { .. })
        ));
    }

    #[test]
    fn step_export_has_header() {
        let mut k = TruckKernel::new();
        let b = k.make_box([1.0, 1.0, 1.0]).unwrap();
        let text = k.export_step(&b, "unit").unwrap();
        assert!(text.starts_with("ISO-10303-21;"));
        assert!(text.contains("unit.step"));
    }

    #[test]
    fn release_drops_solid() {
        let mut k = TruckKernel::new();
        let b = k.make_box([1.0, 1.0, 1.0]).unwrap();
        let again = KernelSolidHandle(b.id());
        k.release(b);
        assert_eq!(k.live_solids(), 0);
        assert!(matches!(
            k.volume(&again),
            Err(KernelError::EntityNotFound { .. })
        ));
    }
}
