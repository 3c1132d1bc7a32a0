use std::fmt;

use serde::{Deserialize, Serialize};

use crate::affine::Affine;
use crate::vec3::{self, Vec3};

/// Coordinate frame a placement is written in, relative to the single mirror step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frame {
    PreMirror,
    PostMirror,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::PreMirror => f.write_str("pre-mirror"),
            Frame::PostMirror => f.write_str("post-mirror"),
        }
    }
}

/// Plane the accumulated shell is reflected through.
///
/// The default is the YZ plane through the origin, so a final-frame point maps back
/// to the pre-mirror frame by negating x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MirrorPlane {
    pub origin: Vec3,
    pub normal: Vec3,
}

impl Default for MirrorPlane {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            normal: vec3::X,
        }
    }
}

impl MirrorPlane {
    pub fn to_affine(&self) -> Affine {
        Affine::reflection(self.origin, self.normal)
    }

    /// Reflection is an involution, so the same map converts in both directions.
    pub fn reflect_point(&self, p: Vec3) -> Vec3 {
        self.to_affine().apply_point(p)
    }

    /// Pre-mirror x of a final-frame x coordinate on the plane's normal axis.
    pub fn to_pre_mirror_x(&self, x_final: f64) -> f64 {
        self.reflect_point([x_final, 0.0, 0.0])[0]
    }

    /// Pre-mirror span `[lo, hi]` of a final-frame x span.
    pub fn to_pre_mirror_span(&self, x0_final: f64, x1_final: f64) -> (f64, f64) {
        let a = self.to_pre_mirror_x(x0_final);
        let b = self.to_pre_mirror_x(x1_final);
        (a.min(b), a.max(b))
    }
}

/// The two enclosure shells generated for the assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseVariant {
    Front,
    Back,
}

impl CaseVariant {
    /// Fixed artifact file stem for the variant.
    pub fn file_stem(&self) -> &'static str {
        match self {
            CaseVariant::Front => "front_case_display",
            CaseVariant::Back => "back_case_wall",
        }
    }
}

impl fmt::Display for CaseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseVariant::Front => f.write_str("front"),
            CaseVariant::Back => f.write_str("back"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plane_negates_x() {
        let m = MirrorPlane::default();
        assert_eq!(m.to_pre_mirror_x(-24.0), 24.0);
        assert_eq!(m.reflect_point([1.0, 2.0, 3.0]), [-1.0, 2.0, 3.0]);
    }

    #[test]
    fn span_conversion_orders_bounds() {
        let m = MirrorPlane::default();
        assert_eq!(m.to_pre_mirror_span(-25.5, -24.0), (24.0, 25.5));
    }

    #[test]
    fn file_stems_are_fixed() {
        assert_eq!(CaseVariant::Front.file_stem(), "front_case_display");
        assert_eq!(CaseVariant::Back.file_stem(), "back_case_wall");
    }
}
