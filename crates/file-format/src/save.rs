use case_types::CaseVariant;
use feature_engine::{BackParams, BuildReport, FrontParams};
use serde::Serialize;

use crate::errors::ExportError;
use crate::metadata::ProjectMetadata;

/// Format identifier written into every project file.
pub const FORMAT_NAME: &str = "enclosure-case";

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// The primary inputs of one shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaseParameters {
    Front(FrontParams),
    Back(BackParams),
}

impl CaseParameters {
    pub fn variant(&self) -> CaseVariant {
        match self {
            CaseParameters::Front(_) => CaseVariant::Front,
            CaseParameters::Back(_) => CaseVariant::Back,
        }
    }
}

/// Everything the native project file records about one generated shell.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseProject {
    pub metadata: ProjectMetadata,
    pub parameters: CaseParameters,
    /// Absent when the file was written before a build ran.
    pub report: Option<BuildReport>,
}

impl CaseProject {
    pub fn variant(&self) -> CaseVariant {
        self.parameters.variant()
    }
}

#[derive(Serialize)]
struct CaseFile<'a> {
    format: &'static str,
    version: u32,
    project: &'a ProjectMetadata,
    variant: CaseVariant,
    parameters: &'a CaseParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a BuildReport>,
}

/// Serialize a project to pretty-printed JSON.
pub fn save_project(project: &CaseProject) -> Result<String, ExportError> {
    let file = CaseFile {
        format: FORMAT_NAME,
        version: FORMAT_VERSION,
        project: &project.metadata,
        variant: project.variant(),
        parameters: &project.parameters,
        report: project.report.as_ref(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}
