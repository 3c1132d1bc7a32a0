//! Best-effort edge rounding: nominal radius, one fallback radius, then skip.

use std::time::Instant;

use geom_kernel::{KernelId, KernelSolidHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::edge_select::{select_edges, EdgeKey, EdgePredicate, COINCIDENT_TOL, SNAP_TOL};
use crate::kernel_ext::KernelBundle;
use crate::types::{elapsed_ms, Diagnostics, OpError, OpResult};

/// Execute a single fillet on specified edges of a solid.
pub fn execute_fillet(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    edges: &[KernelId],
    radius: f64,
) -> Result<OpResult, OpError> {
    if radius <= 0.0 {
        return Err(OpError::InvalidParameter {
            reason: "fillet radius must be positive".to_string(),
        });
    }
    let start = Instant::now();
    let handle = kb.fillet_edges(solid, edges, radius)?;
    Ok(OpResult {
        handle,
        diagnostics: Diagnostics {
            warnings: Vec::new(),
            kernel_time_ms: elapsed_ms(start),
        },
    })
}

/// Whether edges are rounded together or one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilletMode {
    /// One kernel call for the whole selection.
    Batch,
    /// One kernel call per edge; a failing edge does not hold back the others.
    PerEdge,
}

/// Smaller radius to retry with after the nominal radius fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    pub factor: f64,
    pub floor: f64,
    pub ceiling: Option<f64>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            factor: 0.5,
            floor: 0.3,
            ceiling: Some(0.8),
        }
    }
}

impl FallbackPolicy {
    /// `max(floor, min(nominal * factor, ceiling))`
    pub fn radius(&self, nominal: f64) -> f64 {
        let scaled = nominal * self.factor;
        let capped = self.ceiling.map_or(scaled, |c| scaled.min(c));
        capped.max(self.floor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilletSpec {
    pub predicate: EdgePredicate,
    pub radius: f64,
    pub fallback: Option<FallbackPolicy>,
    pub mode: FilletMode,
}

/// What a best-effort fillet pass did.
#[derive(Debug)]
pub struct FilletReport {
    /// The rounded solid, or `None` when no edge could be rounded and the input stands.
    pub handle: Option<KernelSolidHandle>,
    pub selected: usize,
    /// Edges rounded at the nominal radius.
    pub nominal: usize,
    /// Edges rounded at the fallback radius.
    pub fallback: usize,
    pub skipped: usize,
    pub fallback_radius: Option<f64>,
    pub diagnostics: Diagnostics,
}

impl FilletReport {
    fn empty(selected: usize) -> Self {
        Self {
            handle: None,
            selected,
            nominal: 0,
            fallback: 0,
            skipped: 0,
            fallback_radius: None,
            diagnostics: Diagnostics::default(),
        }
    }
}

enum Attempt {
    Nominal(OpResult),
    Fallback(OpResult),
    Failed(String),
}

/// Nominal radius, then the fallback radius exactly once. Geometry failures become
/// `Attempt::Failed`; anything else propagates.
fn attempt(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    edges: &[KernelId],
    spec: &FilletSpec,
) -> Result<Attempt, OpError> {
    let first = match execute_fillet(kb, solid, edges, spec.radius) {
        Ok(r) => return Ok(Attempt::Nominal(r)),
        Err(e) if e.is_geometry_failure() => e,
        Err(e) => return Err(e),
    };
    let Some(policy) = spec.fallback else {
        return Ok(Attempt::Failed(first.to_string()));
    };
    let r = policy.radius(spec.radius);
    debug!(nominal = spec.radius, fallback = r, "retrying fillet");
    match execute_fillet(kb, solid, edges, r) {
        Ok(res) => Ok(Attempt::Fallback(res)),
        Err(e) if e.is_geometry_failure() => Ok(Attempt::Failed(format!("{first}; fallback {r}: {e}"))),
        Err(e) => Err(e),
    }
}

/// Round the edges matching `spec.predicate` on a best-effort basis. The input solid is
/// never released; intermediate solids are.
pub fn fillet_with_fallback(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    spec: &FilletSpec,
) -> Result<FilletReport, OpError> {
    let start = Instant::now();
    let selection = select_edges(kb.as_introspect(), solid, &spec.predicate)?;
    let mut report = FilletReport::empty(selection.len());
    report.fallback_radius = spec.fallback.map(|p| p.radius(spec.radius));
    if selection.is_empty() {
        report
            .diagnostics
            .warnings
            .push("no edges matched the fillet pattern".to_string());
        return Ok(report);
    }

    match spec.mode {
        FilletMode::Batch => {
            let ids: Vec<KernelId> = selection.iter().map(|e| e.id).collect();
            match attempt(kb, solid, &ids, spec)? {
                Attempt::Nominal(r) => {
                    report.nominal = ids.len();
                    report.diagnostics.absorb(r.diagnostics);
                    report.handle = Some(r.handle);
                }
                Attempt::Fallback(r) => {
                    report.fallback = ids.len();
                    report.diagnostics.absorb(r.diagnostics);
                    report.handle = Some(r.handle);
                }
                Attempt::Failed(reason) => {
                    warn!(edges = ids.len(), %reason, "fillet skipped");
                    report.skipped = ids.len();
                    report.diagnostics.warnings.push(reason);
                }
            }
        }
        FilletMode::PerEdge => {
            let keys: Vec<EdgeKey> = selection.iter().map(EdgeKey::of).collect();
            let mut current: Option<KernelSolidHandle> = None;
            for key in keys {
                let body = current.as_ref().unwrap_or(solid);
                let edges = select_edges(kb.as_introspect(), body, &spec.predicate)?;
                // Earlier fillets trim neighbouring edges back, so endpoints may have moved.
                let Some(edge) = key.find_on_support(&edges, COINCIDENT_TOL, SNAP_TOL) else {
                    report.skipped += 1;
                    report
                        .diagnostics
                        .warnings
                        .push("edge no longer present after an earlier fillet".to_string());
                    continue;
                };
                let id = edge.id;
                let next = match attempt(kb, body, &[id], spec) {
                    Ok(a) => a,
                    Err(e) => {
                        if let Some(h) = current.take() {
                            kb.release(h);
                        }
                        return Err(e);
                    }
                };
                let applied = match next {
                    Attempt::Nominal(r) => {
                        report.nominal += 1;
                        r
                    }
                    Attempt::Fallback(r) => {
                        report.fallback += 1;
                        r
                    }
                    Attempt::Failed(reason) => {
                        report.skipped += 1;
                        report.diagnostics.warnings.push(reason);
                        continue;
                    }
                };
                report.diagnostics.absorb(applied.diagnostics);
                if let Some(old) = current.replace(applied.handle) {
                    kb.release(old);
                }
            }
            if report.skipped > 0 {
                warn!(
                    skipped = report.skipped,
                    selected = report.selected,
                    "fillet skipped on some edges"
                );
            }
            report.handle = current;
        }
    }
    report.diagnostics.kernel_time_ms = elapsed_ms(start);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geom_kernel::{Kernel, KernelIntrospect, MockKernel};

    fn corners(l: f64, w: f64) -> EdgePredicate {
        EdgePredicate::CornerVertical {
            x: [0.0, l],
            y: [0.0, w],
            tol: SNAP_TOL,
        }
    }

    #[test]
    fn fallback_radius_policy() {
        let p = FallbackPolicy::default();
        assert_relative_eq!(p.radius(0.5), 0.3);
        assert_relative_eq!(p.radius(1.2), 0.6);
        assert_relative_eq!(p.radius(4.0), 0.8);
        let uncapped = FallbackPolicy {
            factor: 0.5,
            floor: 0.1,
            ceiling: None,
        };
        assert_relative_eq!(uncapped.radius(4.0), 2.0);
    }

    #[test]
    fn batch_corners_at_nominal() {
        let mut k = MockKernel::new();
        let b = k.make_box([20.0, 10.0, 5.0]).unwrap();
        let spec = FilletSpec {
            predicate: corners(20.0, 10.0),
            radius: 4.0,
            fallback: Some(FallbackPolicy::default()),
            mode: FilletMode::Batch,
        };
        let r = fillet_with_fallback(&mut k, &b, &spec).unwrap();
        assert_eq!((r.selected, r.nominal, r.fallback, r.skipped), (4, 4, 0, 0));
        let h = r.handle.unwrap();
        assert_eq!(k.list_edges(&h).len(), 8);
        assert_eq!(k.fillet_attempts().len(), 1);
    }

    #[test]
    fn per_edge_falls_back_once_then_skips() {
        let mut k = MockKernel::new();
        // Vertical edges of a 0.4 mm plate carry at most 0.2 mm.
        let b = k.make_box([0.4, 0.4, 10.0]).unwrap();
        let spec = FilletSpec {
            predicate: corners(0.4, 0.4),
            radius: 1.0,
            fallback: Some(FallbackPolicy::default()),
            mode: FilletMode::PerEdge,
        };
        let r = fillet_with_fallback(&mut k, &b, &spec).unwrap();
        assert_eq!(r.selected, 4);
        assert_eq!(r.skipped, 4);
        assert!(r.handle.is_none());
        // Nominal then fallback per edge, never a third try.
        let log = k.fillet_attempts();
        assert_eq!(log.len(), 8);
        for pair in log.chunks(2) {
            assert_relative_eq!(pair[0].radius, 1.0);
            assert_relative_eq!(pair[1].radius, 0.5);
        }
        assert_eq!(k.live_solids(), 1);
    }

    #[test]
    fn per_edge_fallback_succeeds() {
        let mut k = MockKernel::new();
        // 1.2 mm cross-section: 0.6 max, nominal 1.0 fails, fallback 0.5 fits.
        let b = k.make_box([1.2, 1.2, 10.0]).unwrap();
        let spec = FilletSpec {
            predicate: corners(1.2, 1.2),
            radius: 1.0,
            fallback: Some(FallbackPolicy::default()),
            mode: FilletMode::PerEdge,
        };
        let r = fillet_with_fallback(&mut k, &b, &spec).unwrap();
        assert_eq!((r.nominal, r.fallback, r.skipped), (0, 4, 0));
        let h = r.handle.unwrap();
        // Input plus the final result; per-edge intermediates are released.
        assert_eq!(k.live_solids(), 2);
        assert_eq!(k.list_edges(&h).len(), 8);
    }

    #[test]
    fn no_fallback_means_single_attempt() {
        let mut k = MockKernel::new();
        let b = k.make_box([0.4, 0.4, 10.0]).unwrap();
        let spec = FilletSpec {
            predicate: corners(0.4, 0.4),
            radius: 1.0,
            fallback: None,
            mode: FilletMode::Batch,
        };
        let r = fillet_with_fallback(&mut k, &b, &spec).unwrap();
        assert_eq!(r.skipped, 4);
        assert_eq!(k.fillet_attempts().len(), 1);
    }

    #[test]
    fn empty_selection_is_a_warning() {
        let mut k = MockKernel::new();
        let b = k.make_box([1.0, 1.0, 1.0]).unwrap();
        let spec = FilletSpec {
            predicate: EdgePredicate::HorizontalAt { z: 50.0, tol: 0.1 },
            radius: 1.0,
            fallback: None,
            mode: FilletMode::Batch,
        };
        let r = fillet_with_fallback(&mut k, &b, &spec).unwrap();
        assert_eq!(r.selected, 0);
        assert_eq!(r.diagnostics.warnings.len(), 1);
        assert!(k.fillet_attempts().is_empty());
    }

    #[test]
    fn zero_radius_is_invalid() {
        let mut k = MockKernel::new();
        let b = k.make_box([1.0, 1.0, 1.0]).unwrap();
        let ids = k.list_edges(&b);
        assert!(matches!(
            execute_fillet(&mut k, &b, &ids, 0.0),
            Err(OpError::InvalidParameter { .. })
        ));
    }
}
