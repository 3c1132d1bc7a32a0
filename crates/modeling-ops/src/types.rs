use geom_kernel::{KernelError, KernelSolidHandle};
use serde::{Deserialize, Serialize};

/// Result of a modeling operation: the new solid plus what happened on the way.
#[derive(Debug)]
pub struct OpResult {
    /// Handle to the produced solid. The inputs are untouched and still owned by the caller.
    pub handle: KernelSolidHandle,
    pub diagnostics: Diagnostics,
}

/// Non-fatal diagnostics from an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    /// Wall time spent inside the kernel, in milliseconds.
    pub kernel_time_ms: f64,
}

impl Diagnostics {
    pub fn absorb(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        self.kernel_time_ms += other.kernel_time_ms;
    }
}

/// Errors from modeling operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}

impl OpError {
    /// True when the failure comes from the requested geometry, not from misuse.
    pub fn is_geometry_failure(&self) -> bool {
        match self {
            OpError::Kernel(e) => e.is_geometry_failure(),
            OpError::InvalidParameter { .. } => false,
        }
    }
}

pub(crate) fn elapsed_ms(start: std::time::Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
