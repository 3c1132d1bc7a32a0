//! Tessellation of truck solids into flat triangle buffers, plus the mesh volume used for
//! regression checks.

use case_types::MeshQuality;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;
use truck_modeling::{EuclideanSpace, InnerSpace};

use crate::types::*;

type TruckSolid = truck_modeling::Solid;

/// Visit every meshed face with its outward-facing polygon mesh.
fn for_each_face_mesh(solid: &TruckSolid, tolerance: f64, mut visit: impl FnMut(u32, PolygonMesh)) {
    let meshed = solid.triangulation(tolerance);
    let mut face_index = 0u32;
    for shell in meshed.boundaries().iter() {
        for face in shell.face_iter() {
            let index = face_index;
            face_index += 1;
            let Some(mut mesh) = face.surface() else {
                continue;
            };
            if !face.orientation() {
                mesh.invert();
            }
            visit(index, mesh);
        }
    }
}

/// Fan split of the n-gons truck leaves where it could not reduce a face to triangles
/// or quads.
fn fan<T: Copy>(poly: &[T]) -> impl Iterator<Item = [T; 3]> + '_ {
    (1..poly.len().saturating_sub(1)).map(move |i| [poly[0], poly[i], poly[i + 1]])
}

#[derive(Default)]
struct MeshBuffers {
    vertices: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
    face_ranges: Vec<FaceRange>,
}

impl MeshBuffers {
    fn append_face(&mut self, face_index: u32, mesh: &PolygonMesh) {
        let start_index = self.indices.len() as u32;
        let base_vertex = (self.vertices.len() / 3) as u32;

        let positions = mesh.positions();
        for pos in positions {
            self.vertices
                .extend([pos[0] as f32, pos[1] as f32, pos[2] as f32]);
        }
        let mesh_normals = mesh.normals();
        if mesh_normals.len() == positions.len() {
            for n in mesh_normals {
                self.normals.extend([n[0] as f32, n[1] as f32, n[2] as f32]);
            }
        } else {
            self.normals
                .extend(std::iter::repeat(0.0f32).take(positions.len() * 3));
        }

        let index = |v: &StandardVertex| v.pos as u32 + base_vertex;
        for tri in mesh.tri_faces() {
            self.indices.extend(tri.iter().map(index));
        }
        for quad in mesh.quad_faces() {
            for i in [0, 1, 2, 0, 2, 3] {
                self.indices.push(index(&quad[i]));
            }
        }
        for poly in mesh.other_faces() {
            for tri in fan(poly) {
                self.indices.extend(tri.iter().map(index));
            }
        }

        let end_index = self.indices.len() as u32;
        if end_index > start_index {
            self.face_ranges.push(FaceRange {
                face_index,
                start_index,
                end_index,
            });
        }
    }

    fn finish(self) -> Result<RenderMesh, KernelError> {
        if self.indices.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: "no face produced triangles".to_string(),
            });
        }
        Ok(RenderMesh {
            vertices: self.vertices,
            normals: self.normals,
            indices: self.indices,
            face_ranges: self.face_ranges,
        })
    }
}

/// Tessellate a solid for STL output. The chord tolerance is the linear deflection,
/// tightened where the angular deflection is the stricter bound on a 1 mm radius.
pub fn tessellate_solid(
    solid: &TruckSolid,
    quality: &MeshQuality,
) -> Result<RenderMesh, KernelError> {
    mesh_at(solid, quality.chord_tolerance(1.0))
}

/// Mesh at a plain chord tolerance, used for point membership.
pub fn mesh_at(solid: &TruckSolid, tolerance: f64) -> Result<RenderMesh, KernelError> {
    let mut buffers = MeshBuffers::default();
    for_each_face_mesh(solid, tolerance, |face_index, mesh| {
        buffers.append_face(face_index, &mesh)
    });
    buffers.finish()
}

/// Mesh-based volume. Computed in f64 straight from the polygon meshes.
pub fn solid_volume(solid: &TruckSolid, tolerance: f64) -> f64 {
    let mut signed = 0.0;
    for_each_face_mesh(solid, tolerance, |_, mesh| {
        let pos = mesh.positions();
        let tet = |a: usize, b: usize, c: usize| {
            let (p, q, r) = (pos[a], pos[b], pos[c]);
            p.to_vec().dot(q.to_vec().cross(r.to_vec())) / 6.0
        };
        for tri in mesh.tri_faces() {
            signed += tet(tri[0].pos, tri[1].pos, tri[2].pos);
        }
        for quad in mesh.quad_faces() {
            signed += tet(quad[0].pos, quad[1].pos, quad[2].pos);
            signed += tet(quad[0].pos, quad[2].pos, quad[3].pos);
        }
        for [a, b, c] in mesh.other_faces().iter().flat_map(|poly| fan(poly)) {
            signed += tet(a.pos, b.pos, c.pos);
        }
    });
    signed.abs()
}
