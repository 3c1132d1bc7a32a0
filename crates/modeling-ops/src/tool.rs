//! Cutting and fusing tools: small primitive trees placed in the case frame.

use case_types::vec3::{self, Vec3};
use case_types::{Aabb, Affine};
use geom_kernel::KernelSolidHandle;
use serde::{Deserialize, Serialize};

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// A primitive placement tree. Realized in the kernel only when a feature step runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tool {
    /// Box with one corner at the local origin, moved by `placement`.
    Box { size: Vec3, placement: Affine },
    Cylinder {
        radius: f64,
        height: f64,
        origin: Vec3,
        axis: Vec3,
    },
    Union { parts: Vec<Tool> },
    Difference { base: Box<Tool>, minus: Box<Tool> },
    Transformed {
        tool: Box<Tool>,
        transform: Affine,
    },
}

impl Tool {
    /// Axis-aligned box spanning `origin .. origin + size`.
    pub fn block(origin: Vec3, size: Vec3) -> Tool {
        Tool::Box {
            size,
            placement: Affine::translation(origin),
        }
    }

    pub fn cylinder(radius: f64, height: f64, origin: Vec3, axis: Vec3) -> Tool {
        Tool::Cylinder {
            radius,
            height,
            origin,
            axis,
        }
    }

    /// Vertical cylinder through `(x, y)` starting at `z0`.
    pub fn z_cylinder(x: f64, y: f64, z0: f64, radius: f64, height: f64) -> Tool {
        Tool::cylinder(radius, height, [x, y, z0], vec3::Z)
    }

    /// Apply `t` after the tool's own placement. Boxes fold it into their placement.
    pub fn then(self, t: Affine) -> Tool {
        match self {
            Tool::Box { size, placement } => Tool::Box {
                size,
                placement: placement.then(&t),
            },
            Tool::Transformed { tool, transform } => Tool::Transformed {
                tool,
                transform: transform.then(&t),
            },
            other => Tool::Transformed {
                tool: Box::new(other),
                transform: t,
            },
        }
    }

    pub fn minus(self, other: Tool) -> Tool {
        Tool::Difference {
            base: Box::new(self),
            minus: Box::new(other),
        }
    }

    /// Conservative bounds, computed without the kernel.
    pub fn bounding_box(&self) -> Aabb {
        match self {
            Tool::Box { size, placement } => {
                Aabb::from_origin_size([0.0; 3], *size).transformed(placement)
            }
            Tool::Cylinder {
                radius,
                height,
                origin,
                axis,
            } => {
                let dir = vec3::normalize(*axis).unwrap_or(vec3::Z);
                let top = vec3::add(*origin, vec3::scale(dir, *height));
                let reach = dir.map(|a| radius * (1.0 - a * a).max(0.0).sqrt());
                Aabb::from_points([
                    vec3::sub(*origin, reach),
                    vec3::add(*origin, reach),
                    vec3::sub(top, reach),
                    vec3::add(top, reach),
                ])
            }
            Tool::Union { parts } => parts
                .iter()
                .map(Tool::bounding_box)
                .reduce(|a, b| a.union(&b))
                .unwrap_or(Aabb::from_points([])),
            Tool::Difference { base, .. } => base.bounding_box(),
            Tool::Transformed { tool, transform } => tool.bounding_box().transformed(transform),
        }
    }

    /// Number of kernel primitives the tool expands to.
    pub fn primitive_count(&self) -> usize {
        match self {
            Tool::Box { .. } | Tool::Cylinder { .. } => 1,
            Tool::Union { parts } => parts.iter().map(Tool::primitive_count).sum(),
            Tool::Difference { base, minus } => base.primitive_count() + minus.primitive_count(),
            Tool::Transformed { tool, .. } => tool.primitive_count(),
        }
    }

    /// Build the tool in the kernel. Intermediate solids are released; the caller owns
    /// the returned handle.
    pub fn realize(&self, kb: &mut dyn KernelBundle) -> Result<KernelSolidHandle, OpError> {
        match self {
            Tool::Box { size, placement } => {
                let raw = kb.make_box(*size)?;
                if placement.is_identity() {
                    return Ok(raw);
                }
                let placed = kb.transform(&raw, placement);
                kb.release(raw);
                Ok(placed?)
            }
            Tool::Cylinder {
                radius,
                height,
                origin,
                axis,
            } => Ok(kb.make_cylinder(*radius, *height, *origin, *axis)?),
            Tool::Union { parts } => {
                let mut iter = parts.iter();
                let first = iter.next().ok_or_else(|| OpError::InvalidParameter {
                    reason: "union tool has no parts".to_string(),
                })?;
                let mut acc = first.realize(kb)?;
                for part in iter {
                    let next = match part.realize(kb) {
                        Ok(h) => h,
                        Err(e) => {
                            kb.release(acc);
                            return Err(e);
                        }
                    };
                    let fused = kb.boolean_union(&acc, &next);
                    kb.release(acc);
                    kb.release(next);
                    acc = fused?;
                }
                Ok(acc)
            }
            Tool::Difference { base, minus } => {
                let a = base.realize(kb)?;
                let b = match minus.realize(kb) {
                    Ok(h) => h,
                    Err(e) => {
                        kb.release(a);
                        return Err(e);
                    }
                };
                let out = kb.boolean_subtract(&a, &b);
                kb.release(a);
                kb.release(b);
                Ok(out?)
            }
            Tool::Transformed { tool, transform } => {
                let inner = tool.realize(kb)?;
                let out = kb.transform(&inner, transform);
                kb.release(inner);
                Ok(out?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geom_kernel::{Kernel, MockKernel};

    #[test]
    fn block_bounds() {
        let t = Tool::block([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
        let bb = t.bounding_box();
        assert_eq!(bb.min, [1.0, 2.0, 3.0]);
        assert_eq!(bb.max, [5.0, 7.0, 9.0]);
    }

    #[test]
    fn cylinder_bounds_along_x() {
        let t = Tool::cylinder(1.0, 10.0, [-2.0, 5.0, 5.0], vec3::X);
        let bb = t.bounding_box();
        assert_relative_eq!(bb.min[0], -2.0);
        assert_relative_eq!(bb.max[0], 8.0);
        assert_relative_eq!(bb.min[1], 4.0);
        assert_relative_eq!(bb.max[2], 6.0);
    }

    #[test]
    fn tube_realizes_to_ring_volume() {
        let mut k = MockKernel::new();
        let tube = Tool::z_cylinder(0.0, 0.0, 0.0, 4.0, 10.0)
            .minus(Tool::z_cylinder(0.0, 0.0, -1.0, 3.0, 12.0));
        let h = tube.realize(&mut k).unwrap();
        let expected = std::f64::consts::PI * (16.0 - 9.0) * 10.0;
        let v = k.volume(&h).unwrap();
        assert!((v - expected).abs() / expected < 0.05, "volume {v}");
        // Only the result survives.
        assert_eq!(k.live_solids(), 1);
    }

    #[test]
    fn union_releases_intermediates() {
        let mut k = MockKernel::new();
        let t = Tool::Union {
            parts: vec![
                Tool::block([0.0; 3], [1.0; 3]),
                Tool::block([2.0, 0.0, 0.0], [1.0; 3]),
                Tool::block([4.0, 0.0, 0.0], [1.0; 3]),
            ],
        };
        let h = t.realize(&mut k).unwrap();
        assert_relative_eq!(k.volume(&h).unwrap(), 3.0, epsilon = 1e-9);
        assert_eq!(k.live_solids(), 1);
        assert_eq!(t.primitive_count(), 3);
    }

    #[test]
    fn empty_union_is_rejected() {
        let mut k = MockKernel::new();
        let err = Tool::Union { parts: vec![] }.realize(&mut k).unwrap_err();
        assert!(!err.is_geometry_failure());
    }

    #[test]
    fn then_folds_into_box_placement() {
        let t = Tool::block([0.0; 3], [2.0, 1.0, 1.0]).then(Affine::rotation(vec3::Z, 90.0));
        match &t {
            Tool::Box { placement, .. } => {
                let p = placement.apply_point([2.0, 0.0, 0.0]);
                assert_relative_eq!(p[1], 2.0, epsilon = 1e-12);
            }
            other => panic!("expected box, got {other:?}"),
        }
    }
}
