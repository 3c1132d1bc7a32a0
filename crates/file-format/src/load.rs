use case_types::CaseVariant;
use feature_engine::BuildReport;
use serde::Deserialize;

use crate::errors::LoadError;
use crate::metadata::ProjectMetadata;
use crate::save::{CaseParameters, CaseProject, FORMAT_NAME, FORMAT_VERSION};

/// The file as read, before the parameters are tied to a variant.
#[derive(Debug, Clone, Deserialize)]
struct CaseFileRaw {
    format: String,
    version: u32,
    project: ProjectMetadata,
    variant: CaseVariant,
    #[serde(default)]
    parameters: serde_json::Value,
    #[serde(default)]
    report: Option<BuildReport>,
}

/// Deserialize a project from a JSON string.
///
/// Checks the format identifier and version, migrates older files, then reads the
/// parameters as the set belonging to the recorded variant. Missing parameters take
/// their defaults.
pub fn load_project(json: &str) -> Result<CaseProject, LoadError> {
    let raw: CaseFileRaw = serde_json::from_str(json)?;

    if raw.format != FORMAT_NAME {
        return Err(LoadError::UnknownFormat(raw.format));
    }
    if raw.version > FORMAT_VERSION {
        return Err(LoadError::FutureVersion {
            file_version: raw.version,
            supported_version: FORMAT_VERSION,
        });
    }

    let value = if raw.version < FORMAT_VERSION {
        crate::migrate::migrate(raw.parameters, raw.version, FORMAT_VERSION)?
    } else {
        raw.parameters
    };
    let value = if value.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        value
    };

    let parameters = match raw.variant {
        CaseVariant::Front => CaseParameters::Front(serde_json::from_value(value)?),
        CaseVariant::Back => CaseParameters::Back(serde_json::from_value(value)?),
    };

    Ok(CaseProject {
        metadata: raw.project,
        parameters,
        report: raw.report,
    })
}
