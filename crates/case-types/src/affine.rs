use serde::{Deserialize, Serialize};

use crate::vec3::{self, Vec3};

/// Rigid or reflective placement: a 3x3 linear part plus a translation, stored row-major.
///
/// Rotations take degrees, matching how placements are written in the case recipes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub rows: [[f64; 4]; 3],
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    pub fn translation(v: Vec3) -> Self {
        let mut a = Self::IDENTITY;
        a.rows[0][3] = v[0];
        a.rows[1][3] = v[1];
        a.rows[2][3] = v[2];
        a
    }

    /// Rotation about an axis through the origin (Rodrigues).
    /// A zero axis yields the identity.
    pub fn rotation(axis: Vec3, degrees: f64) -> Self {
        let Some(k) = vec3::normalize(axis) else {
            return Self::IDENTITY;
        };
        let (s, c) = degrees.to_radians().sin_cos();
        let t = 1.0 - c;
        let [x, y, z] = k;
        Affine {
            rows: [
                [c + x * x * t, x * y * t - z * s, x * z * t + y * s, 0.0],
                [y * x * t + z * s, c + y * y * t, y * z * t - x * s, 0.0],
                [z * x * t - y * s, z * y * t + x * s, c + z * z * t, 0.0],
            ],
        }
    }

    /// Rotation taking the direction `from` onto the direction `to`.
    pub fn rotation_between(from: Vec3, to: Vec3) -> Self {
        let (Some(f), Some(t)) = (vec3::normalize(from), vec3::normalize(to)) else {
            return Self::IDENTITY;
        };
        let cos = vec3::dot(f, t).clamp(-1.0, 1.0);
        let axis = vec3::cross(f, t);
        if vec3::norm(axis) < 1e-12 {
            if cos > 0.0 {
                return Self::IDENTITY;
            }
            return Self::rotation(vec3::any_perpendicular(f), 180.0);
        }
        Self::rotation(axis, cos.acos().to_degrees())
    }

    /// Reflection through the plane with the given point and normal.
    pub fn reflection(origin: Vec3, normal: Vec3) -> Self {
        let Some(n) = vec3::normalize(normal) else {
            return Self::IDENTITY;
        };
        let d = 2.0 * vec3::dot(origin, n);
        let mut rows = [[0.0; 4]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().take(3).enumerate() {
                let id = if i == j { 1.0 } else { 0.0 };
                *cell = id - 2.0 * n[i] * n[j];
            }
            row[3] = d * n[i];
        }
        Affine { rows }
    }

    /// `self` followed by `next`.
    pub fn then(&self, next: &Affine) -> Affine {
        let a = &next.rows;
        let b = &self.rows;
        let mut rows = [[0.0; 4]; 3];
        for i in 0..3 {
            for j in 0..4 {
                let mut v = 0.0;
                for k in 0..3 {
                    v += a[i][k] * b[k][j];
                }
                if j == 3 {
                    v += a[i][3];
                }
                rows[i][j] = v;
            }
        }
        Affine { rows }
    }

    pub fn then_translate(&self, v: Vec3) -> Affine {
        self.then(&Affine::translation(v))
    }

    pub fn then_rotate(&self, axis: Vec3, degrees: f64) -> Affine {
        self.then(&Affine::rotation(axis, degrees))
    }

    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        let r = &self.rows;
        [
            r[0][0] * p[0] + r[0][1] * p[1] + r[0][2] * p[2] + r[0][3],
            r[1][0] * p[0] + r[1][1] * p[1] + r[1][2] * p[2] + r[1][3],
            r[2][0] * p[0] + r[2][1] * p[1] + r[2][2] * p[2] + r[2][3],
        ]
    }

    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        [
            r[0][0] * v[0] + r[0][1] * v[1] + r[0][2] * v[2],
            r[1][0] * v[0] + r[1][1] * v[1] + r[1][2] * v[2],
            r[2][0] * v[0] + r[2][1] * v[1] + r[2][2] * v[2],
        ]
    }

    pub fn determinant(&self) -> f64 {
        let r = &self.rows;
        r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0])
    }

    /// True when the transform flips handedness.
    pub fn is_reflection(&self) -> bool {
        self.determinant() < 0.0
    }

    pub fn is_identity(&self) -> bool {
        self.rows
            .iter()
            .flatten()
            .zip(Self::IDENTITY.rows.iter().flatten())
            .all(|(a, b)| (a - b).abs() < 1e-15)
    }

    pub fn inverse(&self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() < 1e-15 {
            return None;
        }
        let r = &self.rows;
        let inv_det = 1.0 / det;
        let m = [
            [
                (r[1][1] * r[2][2] - r[1][2] * r[2][1]) * inv_det,
                (r[0][2] * r[2][1] - r[0][1] * r[2][2]) * inv_det,
                (r[0][1] * r[1][2] - r[0][2] * r[1][1]) * inv_det,
            ],
            [
                (r[1][2] * r[2][0] - r[1][0] * r[2][2]) * inv_det,
                (r[0][0] * r[2][2] - r[0][2] * r[2][0]) * inv_det,
                (r[0][2] * r[1][0] - r[0][0] * r[1][2]) * inv_det,
            ],
            [
                (r[1][0] * r[2][1] - r[1][1] * r[2][0]) * inv_det,
                (r[0][1] * r[2][0] - r[0][0] * r[2][1]) * inv_det,
                (r[0][0] * r[1][1] - r[0][1] * r[1][0]) * inv_det,
            ],
        ];
        let t = [r[0][3], r[1][3], r[2][3]];
        let mut rows = [[0.0; 4]; 3];
        for i in 0..3 {
            rows[i][..3].copy_from_slice(&m[i]);
            rows[i][3] = -(m[i][0] * t[0] + m[i][1] * t[1] + m[i][2] * t[2]);
        }
        Some(Affine { rows })
    }

    /// Column-major 4x4 layout, as expected by cgmath-style `Matrix4::new`.
    pub fn to_columns(&self) -> [[f64; 4]; 4] {
        let r = &self.rows;
        [
            [r[0][0], r[1][0], r[2][0], 0.0],
            [r[0][1], r[1][1], r[2][1], 0.0],
            [r[0][2], r[1][2], r[2][2], 0.0],
            [r[0][3], r[1][3], r[2][3], 1.0],
        ]
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_point_eq(a: Vec3, b: Vec3) {
        for i in 0..3 {
            assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn rotation_about_z_quarter_turn() {
        let r = Affine::rotation(vec3::Z, 90.0);
        assert_point_eq(r.apply_point([1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
        assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_about_x_lays_slot_flat() {
        // A slot standing along +Z lies along -Y after a quarter turn about X.
        let r = Affine::rotation(vec3::X, 90.0);
        assert_point_eq(r.apply_point([0.0, 0.0, 1.0]), [0.0, -1.0, 0.0]);
        assert_point_eq(r.apply_point([0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn then_applies_in_order() {
        let a = Affine::translation([1.0, 0.0, 0.0]).then_rotate(vec3::Z, 90.0);
        assert_point_eq(a.apply_point([0.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn reflection_negates_x_for_yz_plane() {
        let m = Affine::reflection([0.0; 3], vec3::X);
        assert_point_eq(m.apply_point([3.0, 4.0, 5.0]), [-3.0, 4.0, 5.0]);
        assert!(m.is_reflection());
    }

    #[test]
    fn reflection_through_offset_plane() {
        let m = Affine::reflection([2.0, 0.0, 0.0], vec3::X);
        assert_point_eq(m.apply_point([3.0, 1.0, 1.0]), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn inverse_undoes_placement() {
        let a = Affine::rotation([1.0, 2.0, 3.0], 37.0).then_translate([4.0, -5.0, 6.0]);
        let inv = a.inverse().unwrap();
        let p = [0.3, -7.0, 11.0];
        assert_point_eq(inv.apply_point(a.apply_point(p)), p);
    }

    #[test]
    fn rotation_between_handles_antiparallel() {
        let r = Affine::rotation_between(vec3::Z, [0.0, 0.0, -1.0]);
        assert_point_eq(r.apply_vector(vec3::Z), [0.0, 0.0, -1.0]);
        let r = Affine::rotation_between(vec3::Z, vec3::X);
        assert_point_eq(r.apply_vector(vec3::Z), vec3::X);
    }

    #[test]
    fn columns_are_transposed_rows() {
        let a = Affine::translation([1.0, 2.0, 3.0]);
        assert_eq!(a.to_columns()[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
