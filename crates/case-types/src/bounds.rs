use serde::{Deserialize, Serialize};

use crate::affine::Affine;
use crate::vec3::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box spanning the given corner and extents; negative extents are normalized.
    pub fn from_origin_size(origin: Vec3, size: Vec3) -> Self {
        Self::from_points([origin, crate::vec3::add(origin, size)])
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for p in points {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.max[i] < self.min[i])
    }

    pub fn size(&self) -> Vec3 {
        [
            (self.max[0] - self.min[0]).max(0.0),
            (self.max[1] - self.min[1]).max(0.0),
            (self.max[2] - self.min[2]).max(0.0),
        ]
    }

    pub fn center(&self) -> Vec3 {
        crate::vec3::midpoint(self.min, self.max)
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s[0] * s[1] * s[2]
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    /// Overlap of two boxes; `None` when they are disjoint or only touch.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].max(other.min[i]);
            out.max[i] = out.max[i].min(other.max[i]);
            if out.max[i] <= out.min[i] {
                return None;
            }
        }
        Some(out)
    }

    /// Closed containment with a tolerance.
    pub fn contains(&self, p: Vec3, tol: f64) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - tol && p[i] <= self.max[i] + tol)
    }

    pub fn expanded(&self, margin: f64) -> Aabb {
        Aabb {
            min: [self.min[0] - margin, self.min[1] - margin, self.min[2] - margin],
            max: [self.max[0] + margin, self.max[1] + margin, self.max[2] + margin],
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            [a[0], a[1], a[2]],
            [b[0], a[1], a[2]],
            [b[0], b[1], a[2]],
            [a[0], b[1], a[2]],
            [a[0], a[1], b[2]],
            [b[0], a[1], b[2]],
            [b[0], b[1], b[2]],
            [a[0], b[1], b[2]],
        ]
    }

    /// Bounds of the transformed box (conservative under rotation).
    pub fn transformed(&self, t: &Affine) -> Aabb {
        Aabb::from_points(self.corners().map(|c| t.apply_point(c)))
    }
}

/// Axis-aligned rectangle in the XY plane, used for footprints and exclusion zones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Rect2 {
    pub fn from_corners(a: [f64; 2], b: [f64; 2]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1])],
            max: [a[0].max(b[0]), a[1].max(b[1])],
        }
    }

    pub fn from_origin_size(origin: [f64; 2], size: [f64; 2]) -> Self {
        Self::from_corners(origin, [origin[0] + size[0], origin[1] + size[1]])
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    pub fn expanded(&self, margin: f64) -> Rect2 {
        Rect2 {
            min: [self.min[0] - margin, self.min[1] - margin],
            max: [self.max[0] + margin, self.max[1] + margin],
        }
    }

    /// Strictly inside (open rectangle).
    pub fn contains_strict(&self, x: f64, y: f64) -> bool {
        x > self.min[0] && x < self.max[0] && y > self.min[1] && y < self.max[1]
    }

    /// Inside or on the boundary, widened by `tol`.
    pub fn contains(&self, x: f64, y: f64, tol: f64) -> bool {
        x >= self.min[0] - tol
            && x <= self.max[0] + tol
            && y >= self.min[1] - tol
            && y <= self.max[1] + tol
    }

    /// Within `tol` of one of the four sides (and not far outside the rectangle).
    pub fn on_boundary(&self, x: f64, y: f64, tol: f64) -> bool {
        if !self.contains(x, y, tol) {
            return false;
        }
        (x - self.min[0]).abs() < tol
            || (x - self.max[0]).abs() < tol
            || (y - self.min[1]).abs() < tol
            || (y - self.max[1]).abs() < tol
    }

    /// Image under `x -> -x`.
    pub fn mirrored_x(&self) -> Rect2 {
        Rect2::from_corners([-self.max[0], self.min[1]], [-self.min[0], self.max[1]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_normalizes_corners() {
        let r = Rect2::from_corners([5.0, 9.0], [-1.0, 2.0]);
        assert_eq!(r.min, [-1.0, 2.0]);
        assert_eq!(r.max, [5.0, 9.0]);
    }

    #[test]
    fn rect_boundary_and_strict_interior() {
        let r = Rect2::from_origin_size([0.0, 0.0], [10.0, 4.0]);
        assert!(r.on_boundary(10.0, 2.0, 1e-6));
        assert!(r.on_boundary(3.0, 0.5, 1.0));
        assert!(!r.on_boundary(3.0, 2.0, 1e-6));
        assert!(!r.on_boundary(20.0, 0.0, 1e-6));
        assert!(r.contains_strict(5.0, 2.0));
        assert!(!r.contains_strict(10.0, 2.0));
    }

    #[test]
    fn mirrored_rect_swaps_x_span() {
        let r = Rect2::from_origin_size([2.0, 1.0], [3.0, 1.0]).mirrored_x();
        assert_eq!(r.min, [-5.0, 1.0]);
        assert_eq!(r.max, [-2.0, 2.0]);
    }

    #[test]
    fn aabb_intersection_excludes_touching() {
        let a = Aabb::from_origin_size([0.0; 3], [1.0; 3]);
        let b = Aabb::from_origin_size([1.0, 0.0, 0.0], [1.0; 3]);
        assert!(a.intersection(&b).is_none());
        let c = Aabb::from_origin_size([0.5, 0.5, 0.5], [1.0; 3]);
        let i = a.intersection(&c).unwrap();
        assert_eq!(i.min, [0.5; 3]);
        assert_eq!(i.max, [1.0; 3]);
    }

    #[test]
    fn aabb_transformed_by_mirror() {
        let a = Aabb::from_origin_size([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let m = Affine::reflection([0.0; 3], [1.0, 0.0, 0.0]);
        let t = a.transformed(&m);
        assert_eq!(t.min[0], -3.0);
        assert_eq!(t.max[0], -1.0);
    }
}
