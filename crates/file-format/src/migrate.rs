use serde_json::Value;

use crate::errors::LoadError;

/// Bring stored parameters from `from_version` up to `to_version`, one version at a
/// time.
///
/// Version 1 is the first released format, so there is nothing to step through yet.
pub fn migrate(parameters: Value, from_version: u32, to_version: u32) -> Result<Value, LoadError> {
    let mut current = parameters;
    for version in from_version..to_version {
        current = match version {
            // Pre-release files carried no version-specific layout.
            0 => current,
            _ => {
                return Err(LoadError::MigrationFailed {
                    from: version,
                    to: version + 1,
                    reason: format!("no migration path from v{} to v{}", version, version + 1),
                })
            }
        };
    }
    Ok(current)
}
