use std::time::Instant;

use geom_kernel::KernelSolidHandle;
use tracing::debug;

use crate::kernel_ext::KernelBundle;
use crate::tool::Tool;
use crate::types::{elapsed_ms, Diagnostics, OpError, OpResult};

/// Boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanKind {
    Union,
    Subtract,
}

/// Execute a boolean between two solids. Both inputs stay alive.
pub fn execute_boolean(
    kb: &mut dyn KernelBundle,
    body_a: &KernelSolidHandle,
    body_b: &KernelSolidHandle,
    kind: BooleanKind,
) -> Result<OpResult, OpError> {
    let start = Instant::now();
    let handle = match kind {
        BooleanKind::Union => kb.boolean_union(body_a, body_b)?,
        BooleanKind::Subtract => kb.boolean_subtract(body_a, body_b)?,
    };
    Ok(OpResult {
        handle,
        diagnostics: Diagnostics {
            warnings: Vec::new(),
            kernel_time_ms: elapsed_ms(start),
        },
    })
}

/// Realize `tool`, combine it with `body`, and release the tool solid.
pub fn apply_tool(
    kb: &mut dyn KernelBundle,
    body: &KernelSolidHandle,
    tool: &Tool,
    kind: BooleanKind,
) -> Result<OpResult, OpError> {
    let start = Instant::now();
    let tool_solid = tool.realize(kb)?;
    let result = execute_boolean(kb, body, &tool_solid, kind);
    kb.release(tool_solid);
    let mut result = result?;
    result.diagnostics.kernel_time_ms = elapsed_ms(start);
    debug!(?kind, primitives = tool.primitive_count(), "tool applied");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geom_kernel::{Kernel, MockKernel};

    #[test]
    fn subtract_pocket() {
        let mut k = MockKernel::new();
        let body = k.make_box([10.0, 10.0, 10.0]).unwrap();
        let r = apply_tool(
            &mut k,
            &body,
            &Tool::block([2.0, 2.0, 5.0], [6.0, 6.0, 6.0]),
            BooleanKind::Subtract,
        )
        .unwrap();
        assert_relative_eq!(k.volume(&r.handle).unwrap(), 1000.0 - 180.0, epsilon = 1e-9);
        // body + result; the tool is gone.
        assert_eq!(k.live_solids(), 2);
        assert!(r.diagnostics.kernel_time_ms >= 0.0);
    }

    #[test]
    fn union_adds_boss() {
        let mut k = MockKernel::new();
        let body = k.make_box([10.0, 10.0, 1.0]).unwrap();
        let r = apply_tool(
            &mut k,
            &body,
            &Tool::block([4.0, 4.0, 1.0], [2.0, 2.0, 3.0]),
            BooleanKind::Union,
        )
        .unwrap();
        assert_relative_eq!(k.volume(&r.handle).unwrap(), 112.0, epsilon = 1e-9);
    }
}
