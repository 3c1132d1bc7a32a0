use std::path::PathBuf;

use geom_kernel::KernelError;

/// Errors while reading a project file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown file format: {0}")]
    UnknownFormat(String),

    #[error("file version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },

    #[error("migration failed from version {from} to {to}: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },
}

/// Errors while producing or writing a case's output files.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("STEP export failed: {0}")]
    Step(#[source] KernelError),

    #[error("tessellation failed: {0}")]
    Tessellation(#[source] KernelError),

    #[error("mesh is not writable as STL: {reason}")]
    Mesh { reason: String },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}
