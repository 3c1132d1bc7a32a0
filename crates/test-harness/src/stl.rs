//! Binary STL read-back, for checking what the exporter actually wrote.

use crate::helpers::HarnessError;

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StlTriangle {
    pub normal: [f32; 3],
    pub vertices: [[f32; 3]; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct StlMesh {
    /// Header text up to the first NUL.
    pub header: String,
    pub triangles: Vec<StlTriangle>,
}

impl StlMesh {
    pub fn bounding_box(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in self.triangles.iter().flat_map(|t| t.vertices.iter()) {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        (min, max)
    }

    /// Signed enclosed volume; positive for outward winding.
    pub fn volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.vertices.map(|v| v.map(f64::from));
                let cross = [
                    b[1] * c[2] - b[2] * c[1],
                    b[2] * c[0] - b[0] * c[2],
                    b[0] * c[1] - b[1] * c[0],
                ];
                (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]) / 6.0
            })
            .sum()
    }
}

fn read_f32(buf: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_vec(buf: &[u8], at: usize) -> [f32; 3] {
    [read_f32(buf, at), read_f32(buf, at + 4), read_f32(buf, at + 8)]
}

/// Parse a binary STL. The byte length must match the triangle count exactly.
pub fn parse_binary_stl(bytes: &[u8]) -> Result<StlMesh, HarnessError> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(HarnessError::StlError {
            reason: format!("{} bytes is shorter than the STL header", bytes.len()),
        });
    }
    let header_end = bytes[..HEADER_LEN]
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(HEADER_LEN);
    let header = String::from_utf8_lossy(&bytes[..header_end]).into_owned();

    let count = u32::from_le_bytes([
        bytes[HEADER_LEN],
        bytes[HEADER_LEN + 1],
        bytes[HEADER_LEN + 2],
        bytes[HEADER_LEN + 3],
    ]) as usize;
    let expected = HEADER_LEN + 4 + count * TRIANGLE_LEN;
    if bytes.len() != expected {
        return Err(HarnessError::StlError {
            reason: format!(
                "{count} triangles need {expected} bytes, file has {}",
                bytes.len()
            ),
        });
    }

    let triangles = bytes[HEADER_LEN + 4..]
        .chunks_exact(TRIANGLE_LEN)
        .map(|t| StlTriangle {
            normal: read_vec(t, 0),
            vertices: [read_vec(t, 12), read_vec(t, 24), read_vec(t, 36)],
        })
        .collect();
    Ok(StlMesh { header, triangles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::unit_cube_mesh;
    use file_format::render_mesh_to_stl;

    #[test]
    fn reads_back_the_exported_cube() {
        let bytes = render_mesh_to_stl(&unit_cube_mesh(), "cube").unwrap();
        let stl = parse_binary_stl(&bytes).unwrap();
        assert_eq!(stl.header, "binary STL: cube");
        assert_eq!(stl.triangles.len(), 12);
        assert!((stl.volume() - 1.0).abs() < 1e-6);
        assert_eq!(stl.bounding_box(), ([0.0; 3], [1.0; 3]));
        // Bottom face normals point down.
        assert_eq!(stl.triangles[0].normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn truncated_file_is_rejected() {
        let bytes = render_mesh_to_stl(&unit_cube_mesh(), "cube").unwrap();
        let err = parse_binary_stl(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(err.to_string().contains("12 triangles"));
    }
}
