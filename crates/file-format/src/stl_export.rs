//! Binary STL encoding of a tessellated shell.
//!
//! Layout: an 80-byte header, a little-endian `u32` triangle count, then 50 bytes per
//! triangle (normal, three vertices as `f32` triples, a zero `u16` attribute).

use geom_kernel::RenderMesh;

use crate::errors::ExportError;

pub const HEADER_LEN: usize = 80;
pub const TRIANGLE_LEN: usize = 50;

/// Encode `mesh` as binary STL. Facet normals are recomputed from the winding.
pub fn render_mesh_to_stl(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, ExportError> {
    let tri_count = mesh.triangle_count();
    if tri_count == 0 {
        return Err(ExportError::Mesh {
            reason: "mesh has no triangles".to_string(),
        });
    }
    let vertex_count = mesh.vertices.len() / 3;
    if let Some(&idx) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ExportError::Mesh {
            reason: format!("index {idx} out of range (vertex count = {vertex_count})"),
        });
    }
    let count = u32::try_from(tri_count).map_err(|_| ExportError::Mesh {
        reason: format!("{tri_count} triangles exceed the STL count field"),
    })?;

    let mut buf = Vec::with_capacity(HEADER_LEN + 4 + tri_count * TRIANGLE_LEN);
    let header = format!("binary STL: {name}");
    let header = header.as_bytes();
    buf.extend_from_slice(&header[..header.len().min(HEADER_LEN)]);
    buf.resize(HEADER_LEN, 0u8);
    buf.extend_from_slice(&count.to_le_bytes());

    let vertex = |i: u32| -> [f32; 3] {
        let i = i as usize * 3;
        [mesh.vertices[i], mesh.vertices[i + 1], mesh.vertices[i + 2]]
    };
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [vertex(tri[0]), vertex(tri[1]), vertex(tri[2])];
        for v in facet_normal(a, b, c).into_iter().chain(a).chain(b).chain(c) {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(buf)
}

fn facet_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_triangle() -> RenderMesh {
        RenderMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0; 9],
            indices: vec![0, 1, 2],
            face_ranges: vec![],
        }
    }

    #[test]
    fn layout_and_normal() {
        let bytes = render_mesh_to_stl(&one_triangle(), "tri").unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 4 + TRIANGLE_LEN);
        assert!(bytes.starts_with(b"binary STL: tri"));
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 1);
        let nz = f32::from_le_bytes([bytes[92], bytes[93], bytes[94], bytes[95]]);
        assert_eq!(nz, 1.0);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let mesh = RenderMesh {
            indices: vec![],
            ..one_triangle()
        };
        assert!(matches!(
            render_mesh_to_stl(&mesh, "x"),
            Err(ExportError::Mesh { .. })
        ));
    }

    #[test]
    fn bad_index_is_rejected() {
        let mesh = RenderMesh {
            indices: vec![0, 1, 7],
            ..one_triangle()
        };
        let err = render_mesh_to_stl(&mesh, "x").unwrap_err();
        assert!(err.to_string().contains("index 7"));
    }
}
