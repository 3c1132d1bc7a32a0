//! Output boundary: STL and STEP payloads, the native project file, and the atomic
//! placement of a case's files on disk.

pub mod artifacts;
pub mod errors;
pub mod load;
pub mod metadata;
pub mod migrate;
pub mod save;
pub mod step_export;
pub mod stl_export;

pub use artifacts::{write_case_artifacts, CaseArtifacts, RenderedCase};
pub use errors::{ExportError, LoadError};
pub use load::load_project;
pub use metadata::ProjectMetadata;
pub use save::{save_project, CaseParameters, CaseProject, FORMAT_NAME, FORMAT_VERSION};
pub use step_export::export_step;
pub use stl_export::render_mesh_to_stl;
