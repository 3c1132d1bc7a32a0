//! The feature pipeline: a validated recipe driven through the stages in order.
//!
//! Each step takes the current shell and either replaces it (the old handle is
//! released at once) or leaves it untouched. Geometry failures in optional steps are
//! recorded and skipped; everything else ends the build.

use geom_kernel::KernelSolidHandle;
use modeling_ops::{
    apply_tool, execute_mirror, fillet_with_fallback, BooleanKind, Diagnostics, FilletSpec,
    KernelBundle, OpError, Tool,
};
use tracing::{debug, info, instrument, warn};

use crate::report::{BuildReport, StepOutcome, StepRecord};
use crate::types::{BuildError, BuildOptions, BuildOutput, FeatureOp, FeatureStep, Recipe, Stage};

/// A required cut must lower the volume by more than this.
pub const VOLUME_EPS: f64 = 1e-9;

struct StepRun {
    /// `None` when the shell is unchanged.
    handle: Option<KernelSolidHandle>,
    outcome: StepOutcome,
    diagnostics: Diagnostics,
}

impl StepRun {
    fn applied(handle: KernelSolidHandle, diagnostics: Diagnostics) -> Self {
        Self {
            handle: Some(handle),
            outcome: StepOutcome::Applied,
            diagnostics,
        }
    }

    fn skipped(reason: String) -> Self {
        Self {
            handle: None,
            outcome: StepOutcome::Skipped {
                reason: reason.clone(),
            },
            diagnostics: Diagnostics {
                warnings: vec![reason],
                kernel_time_ms: 0.0,
            },
        }
    }
}

/// Build the shell described by `recipe`.
///
/// The recipe is validated first. On error every solid the build created is released.
#[instrument(skip_all, fields(variant = %recipe.variant, steps = recipe.steps.len()))]
pub fn build(
    kb: &mut dyn KernelBundle,
    recipe: &Recipe,
    opts: &BuildOptions,
) -> Result<BuildOutput, BuildError> {
    recipe.validate()?;
    let mut current = kb
        .make_box(recipe.base)
        .map_err(|e| BuildError::RequiredStepFailed {
            step: "base".to_string(),
            source: e.into(),
        })?;
    let mut report = BuildReport::new(recipe.variant);
    match run_steps(kb, recipe, opts, &mut current, &mut report) {
        Ok(()) => {
            info!(
                final_stage = %report.final_stage,
                degraded = report.degraded_steps().count(),
                "build finished"
            );
            Ok(BuildOutput {
                solid: current,
                report,
            })
        }
        Err(e) => {
            kb.release(current);
            Err(e)
        }
    }
}

fn run_steps(
    kb: &mut dyn KernelBundle,
    recipe: &Recipe,
    opts: &BuildOptions,
    current: &mut KernelSolidHandle,
    report: &mut BuildReport,
) -> Result<(), BuildError> {
    let mut stage = Stage::Base;
    let mut halted = false;
    for step in &recipe.steps {
        if opts.halt_after.is_some_and(|h| step.stage > h) {
            debug!(%stage, "halting before {}", step.name);
            halted = true;
            break;
        }
        if step.stage != stage {
            debug!(from = %stage, to = %step.stage, "entering stage");
            stage = step.stage;
        }

        let verify = opts.verify_volumes && step.is_required() && step.op.is_cut();
        let volume_before = if verify {
            Some(measure(kb, current, step)?)
        } else {
            None
        };

        let run = run_step(kb, current, step)?;
        if let Some(next) = run.handle {
            let old = std::mem::replace(current, next);
            kb.release(old);
        }

        let volume_after = if verify {
            Some(measure(kb, current, step)?)
        } else {
            None
        };
        if let (Some(before), Some(after)) = (volume_before, volume_after) {
            if after >= before - VOLUME_EPS {
                warn!(step = %step.name, before, after, "required cut removed no material");
                report.regressions.push(step.name.clone());
            }
        }

        log_outcome(step, &run.outcome, report);
        report.steps.push(StepRecord {
            name: step.name.clone(),
            stage: step.stage,
            frame: step.frame,
            requirement: step.requirement,
            outcome: run.outcome,
            kernel_time_ms: run.diagnostics.kernel_time_ms,
            volume_before,
            volume_after,
            warnings: run.diagnostics.warnings,
        });
    }
    // A halted build ends in the stage of its last executed step, which may lie
    // before `halt_after` when the recipe has no steps in between.
    report.final_stage = if halted { stage } else { Stage::Finalized };
    Ok(())
}

fn log_outcome(step: &FeatureStep, outcome: &StepOutcome, report: &mut BuildReport) {
    match outcome {
        StepOutcome::Applied => {
            info!(step = %step.name, stage = %step.stage, op = step.op.kind(), "applied");
        }
        StepOutcome::Degraded { radius } => {
            warn!(step = %step.name, radius, "applied at fallback radius");
            report
                .warnings
                .push(format!("{}: degraded to radius {radius}", step.name));
        }
        StepOutcome::Partial { applied, skipped } => {
            warn!(step = %step.name, applied, skipped, "partially applied");
            report
                .warnings
                .push(format!("{}: {applied} applied, {skipped} skipped", step.name));
        }
        StepOutcome::Skipped { reason } => {
            warn!(step = %step.name, %reason, "skipped");
            report.warnings.push(format!("{}: skipped ({reason})", step.name));
        }
    }
}

fn measure(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    step: &FeatureStep,
) -> Result<f64, BuildError> {
    kb.volume(solid).map_err(|e| BuildError::Operation {
        step: step.name.clone(),
        source: e.into(),
    })
}

/// Sort an operation error: an optional step's geometry failure becomes a skip reason,
/// everything else stops the build.
fn skip_reason(step: &FeatureStep, e: OpError) -> Result<String, BuildError> {
    if !e.is_geometry_failure() {
        return Err(BuildError::Operation {
            step: step.name.clone(),
            source: e,
        });
    }
    if step.is_required() {
        return Err(BuildError::RequiredStepFailed {
            step: step.name.clone(),
            source: e,
        });
    }
    Ok(e.to_string())
}

fn run_step(
    kb: &mut dyn KernelBundle,
    current: &KernelSolidHandle,
    step: &FeatureStep,
) -> Result<StepRun, BuildError> {
    match &step.op {
        FeatureOp::Cut { tool } => run_single(kb, current, step, tool, BooleanKind::Subtract),
        FeatureOp::Fuse { tool } => run_single(kb, current, step, tool, BooleanKind::Union),
        FeatureOp::CutEach { tools } => run_each(kb, current, step, tools, BooleanKind::Subtract),
        FeatureOp::FuseEach { tools } => run_each(kb, current, step, tools, BooleanKind::Union),
        FeatureOp::Fillet { spec } => run_fillet(kb, current, step, spec),
        FeatureOp::Mirror { plane } => {
            // The mirror is never optional, so any failure ends the build.
            let r = execute_mirror(kb, current, plane).map_err(|e| {
                BuildError::RequiredStepFailed {
                    step: step.name.clone(),
                    source: e,
                }
            })?;
            debug!("placements now in the post-mirror frame");
            Ok(StepRun::applied(r.handle, r.diagnostics))
        }
    }
}

fn run_single(
    kb: &mut dyn KernelBundle,
    current: &KernelSolidHandle,
    step: &FeatureStep,
    tool: &Tool,
    kind: BooleanKind,
) -> Result<StepRun, BuildError> {
    match apply_tool(kb, current, tool, kind) {
        Ok(r) => Ok(StepRun::applied(r.handle, r.diagnostics)),
        Err(e) => Ok(StepRun::skipped(skip_reason(step, e)?)),
    }
}

fn run_each(
    kb: &mut dyn KernelBundle,
    current: &KernelSolidHandle,
    step: &FeatureStep,
    tools: &[Tool],
    kind: BooleanKind,
) -> Result<StepRun, BuildError> {
    let mut acc: Option<KernelSolidHandle> = None;
    let mut diagnostics = Diagnostics::default();
    let (mut applied, mut skipped) = (0usize, 0usize);

    for (i, tool) in tools.iter().enumerate() {
        let body = acc.as_ref().unwrap_or(current);
        match apply_tool(kb, body, tool, kind) {
            Ok(r) => {
                applied += 1;
                diagnostics.absorb(r.diagnostics);
                if let Some(old) = acc.replace(r.handle) {
                    kb.release(old);
                }
            }
            Err(e) => match skip_reason(step, e) {
                Ok(reason) => {
                    skipped += 1;
                    diagnostics.warnings.push(format!("tool {i}: {reason}"));
                }
                Err(err) => {
                    if let Some(h) = acc.take() {
                        kb.release(h);
                    }
                    return Err(err);
                }
            },
        }
    }

    let outcome = match (applied, skipped) {
        (_, 0) => StepOutcome::Applied,
        (0, n) => StepOutcome::Skipped {
            reason: format!("all {n} tools failed"),
        },
        (applied, skipped) => StepOutcome::Partial { applied, skipped },
    };
    Ok(StepRun {
        handle: acc,
        outcome,
        diagnostics,
    })
}

fn run_fillet(
    kb: &mut dyn KernelBundle,
    current: &KernelSolidHandle,
    step: &FeatureStep,
    spec: &FilletSpec,
) -> Result<StepRun, BuildError> {
    let r = fillet_with_fallback(kb, current, spec).map_err(|e| BuildError::Operation {
        step: step.name.clone(),
        source: e,
    })?;
    debug!(
        step = %step.name,
        selected = r.selected,
        nominal = r.nominal,
        fallback = r.fallback,
        skipped = r.skipped,
        "fillet pass"
    );
    let rounded = r.nominal + r.fallback;
    let outcome = if rounded == 0 {
        StepOutcome::Skipped {
            reason: r
                .diagnostics
                .warnings
                .first()
                .cloned()
                .unwrap_or_else(|| "no edge could be rounded".to_string()),
        }
    } else if r.skipped > 0 {
        StepOutcome::Partial {
            applied: rounded,
            skipped: r.skipped,
        }
    } else if r.fallback > 0 {
        StepOutcome::Degraded {
            radius: r.fallback_radius.unwrap_or(spec.radius),
        }
    } else {
        StepOutcome::Applied
    };
    Ok(StepRun {
        handle: r.handle,
        outcome,
        diagnostics: r.diagnostics,
    })
}
