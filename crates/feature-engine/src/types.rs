use std::fmt;

use case_types::vec3::Vec3;
use case_types::{CaseVariant, Frame, MirrorPlane};
use geom_kernel::KernelSolidHandle;
use modeling_ops::{FilletSpec, OpError, Tool};
use serde::{Deserialize, Serialize};

use crate::report::BuildReport;

/// Pipeline states, in the only order they may be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Base,
    CornersRounded,
    CutoutsApplied,
    RibsAndLipsAdded,
    Mirrored,
    PostMirrorFilleted,
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Base => "base",
            Stage::CornersRounded => "corners_rounded",
            Stage::CutoutsApplied => "cutouts_applied",
            Stage::RibsAndLipsAdded => "ribs_and_lips_added",
            Stage::Mirrored => "mirrored",
            Stage::PostMirrorFilleted => "post_mirror_filleted",
            Stage::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

/// Whether a geometry failure aborts the build or is reported and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    Optional,
}

/// What a feature step does to the running shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FeatureOp {
    Cut { tool: Tool },
    Fuse { tool: Tool },
    /// Independent cuts; with an optional step a failing tool is skipped alone.
    CutEach { tools: Vec<Tool> },
    FuseEach { tools: Vec<Tool> },
    Fillet { spec: FilletSpec },
    Mirror { plane: MirrorPlane },
}

impl FeatureOp {
    pub fn is_cut(&self) -> bool {
        matches!(self, FeatureOp::Cut { .. } | FeatureOp::CutEach { .. })
    }

    pub fn is_fuse(&self) -> bool {
        matches!(self, FeatureOp::Fuse { .. } | FeatureOp::FuseEach { .. })
    }

    pub fn tools(&self) -> &[Tool] {
        match self {
            FeatureOp::Cut { tool } | FeatureOp::Fuse { tool } => std::slice::from_ref(tool),
            FeatureOp::CutEach { tools } | FeatureOp::FuseEach { tools } => tools,
            FeatureOp::Fillet { .. } | FeatureOp::Mirror { .. } => &[],
        }
    }

    /// Highest z reached by any of the op's tools.
    pub fn top(&self) -> Option<f64> {
        self.tools()
            .iter()
            .map(|t| t.bounding_box().max[2])
            .reduce(f64::max)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeatureOp::Cut { .. } => "cut",
            FeatureOp::Fuse { .. } => "fuse",
            FeatureOp::CutEach { .. } => "cut_each",
            FeatureOp::FuseEach { .. } => "fuse_each",
            FeatureOp::Fillet { .. } => "fillet",
            FeatureOp::Mirror { .. } => "mirror",
        }
    }
}

/// A cut that must reach above a fused feature, e.g. a screw channel through a lip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clearance {
    /// Name of the fuse step to clear.
    pub feature: String,
    /// Required height above that feature's top.
    pub margin: f64,
}

/// A named step of a case recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStep {
    pub name: String,
    pub stage: Stage,
    /// Frame the step's placement numbers are written in.
    pub frame: Frame,
    pub requirement: Requirement,
    pub op: FeatureOp,
    /// Earlier fuse step this cut has to go through.
    #[serde(default)]
    pub penetrates: Option<String>,
    #[serde(default)]
    pub clears: Option<Clearance>,
}

impl FeatureStep {
    /// A required pre-mirror step.
    pub fn new(name: impl Into<String>, stage: Stage, op: FeatureOp) -> Self {
        Self {
            name: name.into(),
            stage,
            frame: Frame::PreMirror,
            requirement: Requirement::Required,
            op,
            penetrates: None,
            clears: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.requirement = Requirement::Optional;
        self
    }

    pub fn in_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    pub fn penetrating(mut self, feature: impl Into<String>) -> Self {
        self.penetrates = Some(feature.into());
        self
    }

    pub fn clearing(mut self, feature: impl Into<String>, margin: f64) -> Self {
        self.clears = Some(Clearance {
            feature: feature.into(),
            margin,
        });
        self
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }
}

/// Ordered feature steps applied to a base box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub variant: CaseVariant,
    /// Base box size, corner at the origin.
    pub base: Vec3,
    pub steps: Vec<FeatureStep>,
    /// Smallest gap between distinct features the selectors must tell apart.
    pub min_feature_spacing: f64,
}

impl Recipe {
    pub const DEFAULT_MIN_FEATURE_SPACING: f64 = 4.0;

    pub fn new(variant: CaseVariant, base: Vec3) -> Self {
        Self {
            variant,
            base,
            steps: Vec::new(),
            min_feature_spacing: Self::DEFAULT_MIN_FEATURE_SPACING,
        }
    }

    pub fn push(&mut self, step: FeatureStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn step(&self, name: &str) -> Option<&FeatureStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn step_index(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }
}

/// Switches for a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Measure the volume around every required cut and flag cuts that remove nothing.
    pub verify_volumes: bool,
    /// Stop once this stage is complete.
    pub halt_after: Option<Stage>,
}

/// The finished shell and what happened while building it.
#[derive(Debug)]
pub struct BuildOutput {
    pub solid: KernelSolidHandle,
    pub report: BuildReport,
}

/// Errors that stop a build.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error("required step '{step}' failed: {source}")]
    RequiredStepFailed {
        step: String,
        #[source]
        source: OpError,
    },

    #[error("step '{step}' failed: {source}")]
    Operation {
        step: String,
        #[source]
        source: OpError,
    },

    #[error("step '{step}' is written in the {found} frame but runs {expected}")]
    FrameMismatch {
        step: String,
        expected: Frame,
        found: Frame,
    },

    #[error("step '{step}' belongs to stage {stage}, after stage {previous} was entered")]
    StageRegression {
        step: String,
        stage: Stage,
        previous: Stage,
    },

    #[error("recipe must mirror exactly once, found {found} mirror steps")]
    MirrorCount { found: usize },

    #[error("step '{step}' is out of order: {reason}")]
    OrderingViolation { step: String, reason: String },

    #[error("step '{step}' tops out at {top:.3} but must reach {needed:.3} to clear '{feature}'")]
    ClearanceTooShort {
        step: String,
        feature: String,
        top: f64,
        needed: f64,
    },

    #[error("duplicate step name '{step}'")]
    DuplicateStep { step: String },

    #[error("step '{step}' uses tolerance {tol} which is not below {limit}")]
    ToleranceTooLoose { step: String, tol: f64, limit: f64 },

    #[error("fillet step '{step}' must be optional")]
    RequiredFillet { step: String },
}
