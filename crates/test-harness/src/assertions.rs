//! Assertion helpers that fail with a diagnostic instead of panicking.

use case_types::Aabb;
use feature_engine::{BuildReport, StepOutcome};
use geom_kernel::{KernelIntrospect, KernelSolidHandle};

use crate::helpers::{circle_edges, HarnessError};

/// Assert a solid's bounds match `expected` within `tol` on every axis.
pub fn assert_bounds(actual: &Aabb, expected: &Aabb, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    for i in 0..3 {
        for (label, a, e) in [
            ("min", actual.min[i], expected.min[i]),
            ("max", actual.max[i], expected.max[i]),
        ] {
            if (a - e).abs() > tol {
                return Err(HarnessError::AssertionFailed {
                    detail: format!(
                        "[{ctx}] bounding box {label}[{i}]: expected {e:.3}, got {a:.3} (tol={tol})"
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Assert the named step ended with an outcome accepted by `check`.
pub fn assert_outcome(
    report: &BuildReport,
    step: &str,
    check: impl Fn(&StepOutcome) -> bool,
    ctx: &str,
) -> Result<(), HarnessError> {
    let Some(record) = report.step(step) else {
        let known: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
        return Err(HarnessError::AssertionFailed {
            detail: format!("[{ctx}] no step '{step}' in report. Steps: [{}]", known.join(", ")),
        });
    };
    if check(&record.outcome) {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("[{ctx}] step '{step}' ended {:?}", record.outcome),
        })
    }
}

/// Assert the solid has a circular edge of `radius` centred at `center`.
pub fn assert_circle_at(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    center: [f64; 3],
    radius: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let circles = circle_edges(introspect, solid)?;
    let hit = circles.iter().any(|(c, r)| {
        (r - radius).abs() <= tol && (0..3).all(|i| (c[i] - center[i]).abs() <= tol)
    });
    if hit {
        Ok(())
    } else {
        let found: Vec<String> = circles
            .iter()
            .map(|(c, r)| format!("r={r:.3} at ({:.3}, {:.3}, {:.3})", c[0], c[1], c[2]))
            .collect();
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{ctx}] no circle r={radius} at {center:?}. Found: [{}]",
                found.join(", ")
            ),
        })
    }
}

/// Assert `after` is smaller than `before` by more than `eps`.
pub fn assert_volume_decreased(
    before: f64,
    after: f64,
    eps: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    if after < before - eps {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("[{ctx}] volume went from {before:.3} to {after:.3}"),
        })
    }
}
