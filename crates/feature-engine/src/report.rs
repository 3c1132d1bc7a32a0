//! Structured build log: one record per feature step.

use case_types::{CaseVariant, Frame};
use serde::{Deserialize, Serialize};

use crate::types::{Requirement, Stage};

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    /// Every selected edge rounded, some only at the fallback radius.
    Degraded { radius: f64 },
    /// Some tools or edges applied, the rest skipped.
    Partial { applied: usize, skipped: usize },
    /// Nothing applied; the shell is unchanged.
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, StepOutcome::Applied)
    }

    pub fn changed_shell(&self) -> bool {
        !matches!(self, StepOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub stage: Stage,
    pub frame: Frame,
    pub requirement: Requirement,
    pub outcome: StepOutcome,
    pub kernel_time_ms: f64,
    /// Only measured when volume verification is on.
    pub volume_before: Option<f64>,
    pub volume_after: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub variant: CaseVariant,
    pub steps: Vec<StepRecord>,
    /// Build-level warnings, including every degraded or skipped step.
    pub warnings: Vec<String>,
    /// Required cuts that did not reduce the volume.
    pub regressions: Vec<String>,
    pub final_stage: Stage,
}

impl BuildReport {
    pub fn new(variant: CaseVariant) -> Self {
        Self {
            variant,
            steps: Vec::new(),
            warnings: Vec::new(),
            regressions: Vec::new(),
            final_stage: Stage::Base,
        }
    }

    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Steps that did not apply cleanly.
    pub fn degraded_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| !s.outcome.is_applied())
    }

    pub fn total_kernel_time_ms(&self) -> f64 {
        self.steps.iter().map(|s| s.kernel_time_ms).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
