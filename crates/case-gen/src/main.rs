//! case-gen: builds the front display case and the wall back case and writes STEP, STL
//! and project files for each.
//!
//! Set `RUST_LOG` to control log output (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use case_types::CaseVariant;
use feature_engine::{
    build_back, build_front, check_mating, BackParametrics, BuildOptions, BuildOutput,
    FrontParametrics,
};
use file_format::{write_case_artifacts, CaseArtifacts, CaseParameters, CaseProject, ProjectMetadata};
use geom_kernel::{Kernel, TruckKernel};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::GenConfig;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

/// Build one case on its own kernel and write its files.
fn generate(
    parameters: CaseParameters,
    opts: &BuildOptions,
    metadata: &ProjectMetadata,
    out_dir: &Path,
) -> Result<CaseArtifacts> {
    let variant = parameters.variant();
    let mut kernel = TruckKernel::new();
    let BuildOutput { solid, report } = match &parameters {
        CaseParameters::Front(p) => build_front(&mut kernel, &FrontParametrics::new(p.clone()), opts),
        CaseParameters::Back(p) => build_back(&mut kernel, &BackParametrics::new(p.clone()), opts),
    }
    .with_context(|| format!("building {variant}"))?;

    for step in report.degraded_steps() {
        warn!(%variant, step = %step.name, outcome = ?step.outcome, "cosmetic step degraded");
    }
    if !report.regressions.is_empty() {
        warn!(%variant, steps = ?report.regressions, "required cuts removed no material");
    }

    let project = CaseProject {
        metadata: ProjectMetadata {
            name: variant.file_stem().to_string(),
            ..metadata.touched()
        },
        parameters,
        report: Some(report),
    };
    let written = write_case_artifacts(&mut kernel, &solid, &project, out_dir)
        .with_context(|| format!("writing {variant} outputs to {}", out_dir.display()));
    kernel.release(solid);
    written
}

fn main() -> Result<()> {
    init_tracing();

    let config = GenConfig::from_env()?;
    let out_dir: PathBuf = config.out_dir();
    let opts = config.build_options();

    let front = FrontParametrics::new(config.front.clone());
    let back = BackParametrics::new(config.back.clone());
    for w in check_mating(&front, &back) {
        warn!(quantity = w.quantity, front = w.front, back = w.back, "{}", w.note);
    }

    let mut metadata = ProjectMetadata::new("enclosure");
    metadata.generator = concat!("case-gen ", env!("CARGO_PKG_VERSION")).to_string();
    info!(build_id = %metadata.build_id, out_dir = %out_dir.display(), "generating cases");

    let (front_result, back_result) = rayon::join(
        || generate(CaseParameters::Front(config.front.clone()), &opts, &metadata, &out_dir),
        || generate(CaseParameters::Back(config.back.clone()), &opts, &metadata, &out_dir),
    );

    let mut failed = 0;
    for (variant, result) in [
        (CaseVariant::Front, front_result),
        (CaseVariant::Back, back_result),
    ] {
        match result {
            Ok(paths) => info!(
                %variant,
                step = %paths.step.display(),
                stl = %paths.stl.display(),
                project = %paths.project.display(),
                "case written"
            ),
            Err(e) => {
                error!(%variant, "{e:#}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of 2 cases failed");
    }
    Ok(())
}
