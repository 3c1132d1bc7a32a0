//! CaseBench: one kernel plus the most recent build, for scripting scenarios in tests.

use std::path::Path;

use case_types::{Aabb, MeshQuality};
use feature_engine::{
    build, build_back, build_front, BackParametrics, BackParams, BuildOptions, BuildOutput,
    BuildReport, FrontParametrics, FrontParams, Recipe,
};
use file_format::{CaseArtifacts, CaseParameters, CaseProject, ProjectMetadata, RenderedCase};
use geom_kernel::{KernelSolidHandle, MockKernel, RenderMesh, TruckKernel};
use modeling_ops::KernelBundle;

use crate::helpers::{circle_edges, HarnessError};
use crate::oracle::{self, OracleVerdict};

/// Owns a kernel and the last built shell. A new build releases the previous one.
pub struct CaseBench {
    kernel: Box<dyn KernelBundle>,
    options: BuildOptions,
    last: Option<BuildOutput>,
    parameters: Option<CaseParameters>,
}

impl CaseBench {
    /// Deterministic mock kernel.
    pub fn mock() -> Self {
        Self::with_kernel(Box::new(MockKernel::new()))
    }

    /// Real B-Rep geometry.
    pub fn truck() -> Self {
        Self::with_kernel(Box::new(TruckKernel::new()))
    }

    fn with_kernel(kernel: Box<dyn KernelBundle>) -> Self {
        Self {
            kernel,
            options: BuildOptions::default(),
            last: None,
            parameters: None,
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    fn replace(&mut self, out: BuildOutput, parameters: Option<CaseParameters>) -> &BuildReport {
        if let Some(prev) = self.last.take() {
            self.kernel.release(prev.solid);
        }
        self.parameters = parameters;
        &self.last.insert(out).report
    }

    pub fn front(&mut self, params: FrontParams) -> Result<&BuildReport, HarnessError> {
        let p = FrontParametrics::new(params.clone());
        let out = build_front(self.kernel.as_mut(), &p, &self.options)?;
        Ok(self.replace(out, Some(CaseParameters::Front(params))))
    }

    pub fn back(&mut self, params: BackParams) -> Result<&BuildReport, HarnessError> {
        let p = BackParametrics::new(params.clone());
        let out = build_back(self.kernel.as_mut(), &p, &self.options)?;
        Ok(self.replace(out, Some(CaseParameters::Back(params))))
    }

    /// Run a hand-written recipe.
    pub fn recipe(&mut self, recipe: &Recipe) -> Result<&BuildReport, HarnessError> {
        let out = build(self.kernel.as_mut(), recipe, &self.options)?;
        Ok(self.replace(out, None))
    }

    pub fn solid(&self) -> Result<&KernelSolidHandle, HarnessError> {
        self.last.as_ref().map(|o| &o.solid).ok_or(HarnessError::NoSolid)
    }

    pub fn report(&self) -> Result<&BuildReport, HarnessError> {
        self.last.as_ref().map(|o| &o.report).ok_or(HarnessError::NoSolid)
    }

    pub fn bounding_box(&self) -> Result<Aabb, HarnessError> {
        Ok(self.kernel.bounding_box(self.solid()?)?)
    }

    pub fn volume(&self) -> Result<f64, HarnessError> {
        Ok(self.kernel.volume(self.solid()?)?)
    }

    pub fn circles(&self) -> Result<Vec<([f64; 3], f64)>, HarnessError> {
        circle_edges(self.kernel.as_introspect(), self.solid()?)
    }

    pub fn tessellate(&mut self) -> Result<RenderMesh, HarnessError> {
        let solid = self.last.as_ref().map(|o| &o.solid).ok_or(HarnessError::NoSolid)?;
        Ok(self.kernel.tessellate(solid, &MeshQuality::PRINT)?)
    }

    pub fn export_stl(&mut self) -> Result<Vec<u8>, HarnessError> {
        let mesh = self.tessellate()?;
        Ok(file_format::render_mesh_to_stl(&mesh, "bench")?)
    }

    /// Write the last case's three files into `dir`.
    pub fn write_artifacts(&mut self, dir: &Path) -> Result<CaseArtifacts, HarnessError> {
        let out = self.last.as_ref().ok_or(HarnessError::NoSolid)?;
        let parameters = self.parameters.clone().ok_or_else(|| HarnessError::AssertionFailed {
            detail: "hand-written recipes have no parameter set to save".to_string(),
        })?;
        let project = CaseProject {
            metadata: ProjectMetadata::new("bench"),
            parameters,
            report: Some(out.report.clone()),
        };
        let rendered = RenderedCase::render(self.kernel.as_kernel_mut(), &out.solid, &project)?;
        Ok(rendered.write_to(dir)?)
    }

    /// Mesh oracles over the current shell, failing on the first bad verdict.
    pub fn check_mesh(&mut self) -> Result<Vec<OracleVerdict>, HarnessError> {
        let mesh = self.tessellate()?;
        let verdicts = oracle::run_all_mesh_checks(&mesh);
        if let Some(bad) = verdicts.iter().find(|v| !v.passed) {
            return Err(HarnessError::OracleFailure {
                oracle: bad.oracle_name.clone(),
                detail: bad.detail.clone(),
            });
        }
        Ok(verdicts)
    }

    pub fn kernel(&self) -> &dyn KernelBundle {
        self.kernel.as_ref()
    }

    pub fn kernel_mut(&mut self) -> &mut dyn KernelBundle {
        self.kernel.as_mut()
    }
}
