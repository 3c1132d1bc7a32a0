//! Parametric feature pipeline for the two enclosure shells.
//!
//! [`params`] derives every dimension once, [`front`] and [`back`] turn those into
//! ordered recipes of feature steps, and [`pipeline::build`] drives a recipe through
//! the stages against any kernel.

pub mod back;
pub mod front;
pub mod layout;
pub mod mating;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod types;
mod validate;

pub use back::back_recipe;
pub use front::front_recipe;
pub use layout::{vent_positions, VentParams, WallSide};
pub use mating::{check_mating, MatingWarning};
pub use params::{
    envelope, BackDims, BackParametrics, BackParams, Derive, FrontDims, FrontParametrics,
    FrontParams, Parametrics,
};
pub use pipeline::build;
pub use report::{BuildReport, StepOutcome, StepRecord};
pub use types::*;

use modeling_ops::KernelBundle;

/// Build the front display shell.
pub fn build_front(
    kb: &mut dyn KernelBundle,
    params: &FrontParametrics,
    opts: &BuildOptions,
) -> Result<BuildOutput, BuildError> {
    build(kb, &front_recipe(params), opts)
}

/// Build the wall-mounted back shell.
pub fn build_back(
    kb: &mut dyn KernelBundle,
    params: &BackParametrics,
    opts: &BuildOptions,
) -> Result<BuildOutput, BuildError> {
    build(kb, &back_recipe(params), opts)
}
