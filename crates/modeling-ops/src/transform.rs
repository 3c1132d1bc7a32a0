use std::time::Instant;

use case_types::vec3;
use case_types::{Affine, MirrorPlane};
use geom_kernel::KernelSolidHandle;

use crate::kernel_ext::KernelBundle;
use crate::types::{elapsed_ms, Diagnostics, OpError, OpResult};

/// Place a solid with a rigid or reflective transform.
pub fn execute_transform(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    transform: &Affine,
) -> Result<OpResult, OpError> {
    let start = Instant::now();
    let handle = kb.transform(solid, transform)?;
    Ok(OpResult {
        handle,
        diagnostics: Diagnostics {
            warnings: Vec::new(),
            kernel_time_ms: elapsed_ms(start),
        },
    })
}

/// Reflect the whole solid through `plane`.
pub fn execute_mirror(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    plane: &MirrorPlane,
) -> Result<OpResult, OpError> {
    if vec3::normalize(plane.normal).is_none() {
        return Err(OpError::InvalidParameter {
            reason: "mirror plane normal has zero length".to_string(),
        });
    }
    execute_transform(kb, solid, &plane.to_affine())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom_kernel::{Kernel, KernelIntrospect, MockKernel};

    #[test]
    fn mirror_negates_x() {
        let mut k = MockKernel::new();
        let b = k.make_box([5.0, 2.0, 1.0]).unwrap();
        let m = execute_mirror(&mut k, &b, &MirrorPlane::default()).unwrap();
        let bb = k.bounding_box(&m.handle).unwrap();
        assert_eq!(bb.min[0], -5.0);
        assert_eq!(bb.max[0], 0.0);
        assert_eq!(bb.max[1], 2.0);
    }

    #[test]
    fn degenerate_plane_is_rejected() {
        let mut k = MockKernel::new();
        let b = k.make_box([1.0, 1.0, 1.0]).unwrap();
        let plane = MirrorPlane {
            origin: [0.0; 3],
            normal: [0.0; 3],
        };
        assert!(matches!(
            execute_mirror(&mut k, &b, &plane),
            Err(OpError::InvalidParameter { .. })
        ));
    }
}
