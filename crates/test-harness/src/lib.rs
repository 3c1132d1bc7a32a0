//! Test harness for the enclosure pipeline.
//!
//! - [`CaseBench`]: build cases or hand-written recipes on either kernel and inspect the result
//! - [`oracle`]: verification functions returning pass/fail verdicts
//! - [`stl`]: binary STL read-back
//! - [`helpers`]: error type, synthetic recipes, mesh math
//! - [`assertions`]: assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod stl;
pub mod workflow;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use workflow::CaseBench;
