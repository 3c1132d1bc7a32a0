//! Small helpers over `[f64; 3]`, the point/vector representation shared by every crate.

pub type Vec3 = [f64; 3];

pub const X: Vec3 = [1.0, 0.0, 0.0];
pub const Y: Vec3 = [0.0, 1.0, 0.0];
pub const Z: Vec3 = [0.0, 0.0, 1.0];

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

pub fn distance(a: Vec3, b: Vec3) -> f64 {
    norm(sub(a, b))
}

/// Unit vector along `a`, or `None` for a (near) zero vector.
pub fn normalize(a: Vec3) -> Option<Vec3> {
    let n = norm(a);
    if n < 1e-12 {
        None
    } else {
        Some(scale(a, 1.0 / n))
    }
}

pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    scale(add(a, b), 0.5)
}

pub fn lerp(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    add(a, scale(sub(b, a), t))
}

/// Any unit vector perpendicular to the unit vector `n`.
pub fn any_perpendicular(n: Vec3) -> Vec3 {
    // Cross with the world axis least aligned with n.
    let helper = if n[0].abs() <= n[1].abs() && n[0].abs() <= n[2].abs() {
        X
    } else if n[1].abs() <= n[2].abs() {
        Y
    } else {
        Z
    };
    normalize(cross(n, helper)).unwrap_or(X)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_is_orthogonal_unit() {
        for n in [X, Y, Z, [0.6, 0.8, 0.0], [-1.0, 0.0, 0.0]] {
            let p = any_perpendicular(n);
            assert!(dot(p, n).abs() < 1e-12);
            assert!((norm(p) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn normalize_rejects_zero() {
        assert!(normalize([0.0, 0.0, 0.0]).is_none());
        assert_eq!(normalize([0.0, 2.0, 0.0]), Some(Y));
    }
}
