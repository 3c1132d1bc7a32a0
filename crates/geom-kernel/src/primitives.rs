//! Box and cylinder builders on top of truck's sweep API.
//!
//! truck has no built-in box or cylinder; everything is successive sweeps.

use std::f64::consts::PI;

use case_types::vec3;
use case_types::Affine;
use truck_modeling::builder;
use truck_modeling::topology::Solid;
use truck_modeling::{Matrix4, Point3, Rad, Vector3};

use crate::types::KernelError;

fn check_positive(name: &str, value: f64) -> Result<(), KernelError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(KernelError::PrimitiveFailed {
            reason: format!("{name} must be positive, got {value}"),
        })
    }
}

/// Box with one corner at the origin, extending to `size`.
pub fn make_box(size: [f64; 3]) -> Result<Solid, KernelError> {
    for (name, v) in ["length", "width", "height"].iter().zip(size) {
        check_positive(name, v)?;
    }
    let v = builder::vertex(Point3::new(0.0, 0.0, 0.0));
    let edge = builder::tsweep(&v, Vector3::new(size[0], 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, size[1], 0.0));
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, size[2])))
}

/// Cylinder: circle wire around `axis` through `origin`, capped, then swept along the axis.
pub fn make_cylinder(
    radius: f64,
    height: f64,
    origin: [f64; 3],
    axis: [f64; 3],
) -> Result<Solid, KernelError> {
    check_positive("radius", radius)?;
    check_positive("height", height)?;
    let dir = vec3::normalize(axis).ok_or_else(|| KernelError::PrimitiveFailed {
        reason: "cylinder axis has zero length".to_string(),
    })?;
    let start = vec3::add(origin, vec3::scale(vec3::any_perpendicular(dir), radius));

    let v = builder::vertex(Point3::from(start));
    let wire = builder::rsweep(&v, Point3::from(origin), Vector3::from(dir), Rad(2.0 * PI));
    let face =
        builder::try_attach_plane(&[wire]).map_err(|e| KernelError::PrimitiveFailed {
            reason: format!("failed to cap cylinder: {e}"),
        })?;
    Ok(builder::tsweep(&face, Vector3::from(dir) * height))
}

pub(crate) fn to_matrix(t: &Affine) -> Matrix4 {
    let c = t.to_columns();
    Matrix4::new(
        c[0][0], c[0][1], c[0][2], c[0][3], c[1][0], c[1][1], c[1][2], c[1][3], c[2][0],
        c[2][1], c[2][2], c[2][3], c[3][0], c[3][1], c[3][2], c[3][3],
    )
}

/// Apply a placement. A reflection turns the boundary inside out, so its orientation
/// is flipped back afterwards.
pub fn transformed(solid: &Solid, t: &Affine) -> Solid {
    let mut out = builder::transformed(solid, to_matrix(t));
    if t.is_reflection() {
        out.not();
    }
    out
}
