use geom_kernel::{Kernel, KernelSolidHandle};
use tracing::{debug, instrument};

use crate::errors::ExportError;

/// Serialize the exact solid as a STEP document.
#[instrument(skip(kb, solid))]
pub fn export_step(
    kb: &dyn Kernel,
    solid: &KernelSolidHandle,
    name: &str,
) -> Result<String, ExportError> {
    let text = kb.export_step(solid, name).map_err(ExportError::Step)?;
    debug!(bytes = text.len(), "STEP document ready");
    Ok(text)
}
