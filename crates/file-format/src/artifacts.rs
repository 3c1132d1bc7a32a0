//! Writing one case's three output files.
//!
//! All payloads are rendered in memory before anything touches the disk. Each file is
//! written to a hidden sibling and renamed into place; if any step fails, every file
//! already placed for that case is removed again.

use std::fs;
use std::path::{Path, PathBuf};

use case_types::{CaseVariant, MeshQuality};
use geom_kernel::{Kernel, KernelSolidHandle};
use tracing::{info, instrument, warn};

use crate::errors::ExportError;
use crate::save::{save_project, CaseProject};
use crate::step_export::export_step;
use crate::stl_export::render_mesh_to_stl;

/// Final locations of a case's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseArtifacts {
    pub step: PathBuf,
    pub stl: PathBuf,
    pub project: PathBuf,
}

impl CaseArtifacts {
    pub fn in_dir(out_dir: &Path, variant: CaseVariant) -> Self {
        let stem = variant.file_stem();
        Self {
            step: out_dir.join(format!("{stem}.step")),
            stl: out_dir.join(format!("{stem}.stl")),
            project: out_dir.join(format!("{stem}.case.json")),
        }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [&self.step, &self.stl, &self.project]
    }
}

/// A case's payloads, ready to write.
#[derive(Debug, Clone)]
pub struct RenderedCase {
    pub variant: CaseVariant,
    pub step: String,
    pub stl: Vec<u8>,
    pub project: String,
}

impl RenderedCase {
    /// Export, tessellate at print quality and serialize the project file.
    #[instrument(skip_all, fields(variant = %project.variant()))]
    pub fn render(
        kb: &mut dyn Kernel,
        solid: &KernelSolidHandle,
        project: &CaseProject,
    ) -> Result<Self, ExportError> {
        let variant = project.variant();
        let stem = variant.file_stem();
        let step = export_step(kb, solid, stem)?;
        let mesh = kb
            .tessellate(solid, &MeshQuality::PRINT)
            .map_err(ExportError::Tessellation)?;
        let stl = render_mesh_to_stl(&mesh, stem)?;
        let project = save_project(project)?;
        Ok(Self {
            variant,
            step,
            stl,
            project,
        })
    }

    /// Place the three files under `out_dir`, creating it if needed.
    #[instrument(skip(self), fields(variant = %self.variant))]
    pub fn write_to(&self, out_dir: &Path) -> Result<CaseArtifacts, ExportError> {
        fs::create_dir_all(out_dir).map_err(|e| ExportError::io(out_dir, e))?;
        let paths = CaseArtifacts::in_dir(out_dir, self.variant);
        let payloads: [(&Path, &[u8]); 3] = [
            (&paths.step, self.step.as_bytes()),
            (&paths.stl, &self.stl),
            (&paths.project, self.project.as_bytes()),
        ];

        let mut placed: Vec<&Path> = Vec::with_capacity(payloads.len());
        for (path, bytes) in payloads {
            if let Err(e) = write_atomic(path, bytes) {
                for done in placed {
                    if let Err(rm) = fs::remove_file(done) {
                        warn!(path = %done.display(), error = %rm, "could not remove partial output");
                    }
                }
                return Err(e);
            }
            placed.push(path);
        }
        info!(dir = %out_dir.display(), "artifacts written");
        Ok(paths)
    }
}

/// Render and write one case.
pub fn write_case_artifacts(
    kb: &mut dyn Kernel,
    solid: &KernelSolidHandle,
    project: &CaseProject,
    out_dir: &Path,
) -> Result<CaseArtifacts, ExportError> {
    RenderedCase::render(kb, solid, project)?.write_to(out_dir)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let tmp = temp_sibling(path);
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(ExportError::io(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ExportError::io(path, e));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
