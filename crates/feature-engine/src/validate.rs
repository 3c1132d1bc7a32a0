//! Recipe checks that run before any geometry is built.

use std::collections::HashSet;

use case_types::Frame;

use crate::types::{BuildError, FeatureOp, FeatureStep, Recipe, Stage};

impl Recipe {
    /// Check step names, stage order, frames, the single mirror, cut-after-fuse
    /// dependencies, clearances and selector tolerances.
    pub fn validate(&self) -> Result<(), BuildError> {
        self.check_names()?;
        self.check_stages()?;
        let mirror_at = self.check_mirror()?;
        self.check_frames(mirror_at)?;
        self.check_dependencies()?;
        self.check_tolerances()
    }

    fn check_names(&self) -> Result<(), BuildError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(BuildError::DuplicateStep {
                    step: step.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_stages(&self) -> Result<(), BuildError> {
        let mut current = Stage::Base;
        for step in &self.steps {
            if matches!(step.stage, Stage::Base | Stage::Finalized) {
                return Err(BuildError::OrderingViolation {
                    step: step.name.clone(),
                    reason: format!("no step may run in the {} stage", step.stage),
                });
            }
            if step.stage < current {
                return Err(BuildError::StageRegression {
                    step: step.name.clone(),
                    stage: step.stage,
                    previous: current,
                });
            }
            current = step.stage;

            let is_fillet = matches!(step.op, FeatureOp::Fillet { .. });
            if is_fillet && step.is_required() {
                return Err(BuildError::RequiredFillet {
                    step: step.name.clone(),
                });
            }
            // Corners are rounded on the bare box, before cutouts change its edges.
            if step.stage == Stage::CornersRounded && !is_fillet {
                return Err(BuildError::OrderingViolation {
                    step: step.name.clone(),
                    reason: "only fillets may run before the cutouts".to_string(),
                });
            }
            if step.stage == Stage::PostMirrorFilleted && !is_fillet {
                return Err(BuildError::OrderingViolation {
                    step: step.name.clone(),
                    reason: "only fillets may run after the mirror".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Exactly one mirror, alone in the mirrored stage. Returns its index.
    fn check_mirror(&self) -> Result<usize, BuildError> {
        let mirrors: Vec<usize> = self
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s.op, FeatureOp::Mirror { .. }))
            .map(|(i, _)| i)
            .collect();
        let &[at] = mirrors.as_slice() else {
            return Err(BuildError::MirrorCount {
                found: mirrors.len(),
            });
        };
        for (i, step) in self.steps.iter().enumerate() {
            if (i == at) != (step.stage == Stage::Mirrored) {
                return Err(BuildError::OrderingViolation {
                    step: step.name.clone(),
                    reason: "the mirrored stage holds the mirror step and nothing else"
                        .to_string(),
                });
            }
        }
        if !self.steps[at].is_required() {
            return Err(BuildError::OrderingViolation {
                step: self.steps[at].name.clone(),
                reason: "the mirror cannot be optional".to_string(),
            });
        }
        Ok(at)
    }

    /// Steps up to and including the mirror are written pre-mirror; later ones post-mirror.
    fn check_frames(&self, mirror_at: usize) -> Result<(), BuildError> {
        for (i, step) in self.steps.iter().enumerate() {
            let expected = if i <= mirror_at {
                Frame::PreMirror
            } else {
                Frame::PostMirror
            };
            if step.frame != expected {
                return Err(BuildError::FrameMismatch {
                    step: step.name.clone(),
                    expected,
                    found: step.frame,
                });
            }
        }
        Ok(())
    }

    fn check_dependencies(&self) -> Result<(), BuildError> {
        for (i, step) in self.steps.iter().enumerate() {
            if let Some(target) = &step.penetrates {
                let earlier = self.fuse_before(i, target).ok_or_else(|| {
                    BuildError::OrderingViolation {
                        step: step.name.clone(),
                        reason: format!("must run after the fuse step '{target}'"),
                    }
                })?;
                if !step.op.is_cut() {
                    return Err(BuildError::OrderingViolation {
                        step: step.name.clone(),
                        reason: format!("only a cut can penetrate '{}'", earlier.name),
                    });
                }
            }
            if let Some(clearance) = &step.clears {
                let feature = self.fuse_before(i, &clearance.feature).ok_or_else(|| {
                    BuildError::OrderingViolation {
                        step: step.name.clone(),
                        reason: format!(
                            "must run after '{}' to clear it",
                            clearance.feature
                        ),
                    }
                })?;
                let needed = feature.op.top().unwrap_or(f64::NEG_INFINITY) + clearance.margin;
                let top = step.op.top().unwrap_or(f64::NEG_INFINITY);
                if top < needed - 1e-9 {
                    return Err(BuildError::ClearanceTooShort {
                        step: step.name.clone(),
                        feature: clearance.feature.clone(),
                        top,
                        needed,
                    });
                }
            }
        }
        Ok(())
    }

    /// Fuse step named `name` declared before index `before`.
    fn fuse_before(&self, before: usize, name: &str) -> Option<&FeatureStep> {
        self.steps[..before]
            .iter()
            .find(|s| s.name == name && s.op.is_fuse())
    }

    fn check_tolerances(&self) -> Result<(), BuildError> {
        let limit = self.min_feature_spacing / 2.0;
        for step in &self.steps {
            let FeatureOp::Fillet { spec } = &step.op else {
                continue;
            };
            if let Some(tol) = spec.predicate.tolerances().into_iter().find(|t| *t >= limit) {
                return Err(BuildError::ToleranceTooLoose {
                    step: step.name.clone(),
                    tol,
                    limit,
                });
            }
        }
        Ok(())
    }
}
