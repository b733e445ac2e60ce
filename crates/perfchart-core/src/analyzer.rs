//! Error analysis and corrective adjustments.
//!
//! Inspects the failed cases of a validation run, classifies the failure
//! pattern and proposes corrections. [`apply_adjustments`] is the only way a
//! dataset changes: it always returns a fresh copy.

use serde::{Deserialize, Serialize};

use crate::domain::adjustment::AdjustmentProposal;
use crate::domain::dataset::{AbacDataset, AxisName, QueryPoint, COORD_EPSILON};
use crate::domain::testing::{CaseOutcome, TestResult};
use crate::interpolation;

/// Bias is systematic when |mean signed| exceeds this share of mean |error|.
const BIAS_RATIO: f64 = 0.5;
/// Mean relative error above which a scale error is reported.
const SCALE_THRESHOLD: f64 = 0.10;
/// Maximum relative spread of per-case axis offsets for a consistent shift.
const AXIS_SPREAD_LIMIT: f64 = 0.25;
/// Step used for slope estimation, as a share of the axis range.
const SLOPE_STEP_FRACTION: f64 = 0.01;

/// A consistent offset along one axis that explains the failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisShift {
    pub axis: AxisName,
    pub delta: f64,
    /// `max - min` of per-case offsets over `|mean|`.
    pub spread: f64,
}

/// Failure statistics over the failed, evaluated cases of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub failed_cases: usize,
    /// Mean of `expected - predicted`.
    pub mean_signed_error: f64,
    pub mean_abs_error: f64,
    /// Mean of `(predicted - expected) / expected` over non-zero expectations.
    pub mean_relative_error: f64,
    pub systematic_bias: bool,
    pub scale_error: bool,
    pub axis_shift: Option<AxisShift>,
}

/// Compute failure statistics for `result`.
///
/// Cases the engine could not evaluate carry no prediction and are skipped.
pub fn analyze_errors(result: &TestResult, dataset: &AbacDataset) -> ErrorAnalysis {
    let failed: Vec<(&CaseOutcome, f64)> = result
        .failed_cases()
        .filter_map(|d| d.pred.map(|pred| (d, pred)))
        .collect();

    let mut analysis = ErrorAnalysis {
        failed_cases: failed.len(),
        mean_signed_error: 0.0,
        mean_abs_error: 0.0,
        mean_relative_error: 0.0,
        systematic_bias: false,
        scale_error: false,
        axis_shift: None,
    };
    if failed.is_empty() {
        return analysis;
    }

    let n = failed.len() as f64;
    analysis.mean_signed_error = failed.iter().map(|(d, pred)| d.exp - pred).sum::<f64>() / n;
    analysis.mean_abs_error = failed.iter().map(|(d, pred)| (d.exp - pred).abs()).sum::<f64>() / n;

    let relative: Vec<f64> = failed
        .iter()
        .filter(|(d, _)| d.exp != 0.0)
        .map(|(d, pred)| (pred - d.exp) / d.exp)
        .collect();
    if !relative.is_empty() {
        analysis.mean_relative_error = relative.iter().sum::<f64>() / relative.len() as f64;
    }

    analysis.systematic_bias = analysis.mean_abs_error > 0.0
        && analysis.mean_signed_error.abs() > BIAS_RATIO * analysis.mean_abs_error;
    analysis.scale_error = analysis.mean_relative_error.abs() > SCALE_THRESHOLD;

    if !analysis.systematic_bias && !analysis.scale_error {
        analysis.axis_shift = detect_axis_shift(dataset, &failed);
    }
    analysis
}

/// Propose corrections for a failed run, best first.
///
/// The plan is meant to be applied whole, so proposals never overlap: a
/// proportional error also looks like a same-signed bias, and only the scale
/// correction is kept for it.
pub fn propose_adjustments(result: &TestResult, dataset: &AbacDataset) -> Vec<AdjustmentProposal> {
    let analysis = analyze_errors(result, dataset);
    let mut proposals = Vec::new();

    if analysis.systematic_bias && !analysis.scale_error {
        proposals.push(AdjustmentProposal::ShiftOutput {
            delta: analysis.mean_signed_error,
            confidence: (1.0 - analysis.mean_signed_error.abs() / analysis.mean_abs_error)
                .clamp(0.0, 1.0),
        });
    }

    let denom = 1.0 + analysis.mean_relative_error;
    if analysis.scale_error && denom.abs() > COORD_EPSILON {
        proposals.push(AdjustmentProposal::ScaleOutput {
            factor: 1.0 / denom,
            confidence: (analysis.mean_relative_error.abs() * 10.0).min(1.0),
        });
    }

    if let Some(shift) = analysis.axis_shift {
        proposals.push(AdjustmentProposal::ShiftAxis {
            axis: shift.axis,
            delta: shift.delta,
            confidence: (1.0 - shift.spread).clamp(0.0, 1.0),
        });
    }

    proposals.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));
    proposals
}

/// Return a new dataset with `adjustments` applied to every sample, in order.
///
/// `shift_axis` moves the declared axis ticks along with the samples.
pub fn apply_adjustments(dataset: &AbacDataset, adjustments: &[AdjustmentProposal]) -> AbacDataset {
    let mut revised = dataset.clone();
    for adj in adjustments {
        match *adj {
            AdjustmentProposal::ShiftOutput { delta, .. } => {
                for p in &mut revised.grid.values {
                    p.value += delta;
                }
            }
            AdjustmentProposal::ScaleOutput { factor, .. } => {
                for p in &mut revised.grid.values {
                    p.value *= factor;
                }
            }
            AdjustmentProposal::ShiftAxis { axis, delta, .. } => {
                for p in &mut revised.grid.values {
                    *p.coordinate_mut(axis) += delta;
                }
                if let Some(spec) = revised.axes.get_mut(&axis) {
                    for tick in &mut spec.ticks {
                        *tick += delta;
                    }
                }
            }
        }
    }
    revised
}

// ---------------------------------------------------------------------------
// Axis shift
// ---------------------------------------------------------------------------

/// For each iterated axis, the offset that moves every sample so the dataset
/// matches each failed case. The most consistent axis wins.
fn detect_axis_shift(dataset: &AbacDataset, failed: &[(&CaseOutcome, f64)]) -> Option<AxisShift> {
    let axes = dataset.iteration_axes().ok()?;
    let mut best: Option<AxisShift> = None;

    for &axis in axes {
        let Some(step) = slope_step(dataset, axis) else {
            continue;
        };
        let mut offsets = Vec::with_capacity(failed.len());
        for (case, pred) in failed {
            let Some(slope) = local_slope(dataset, &case.inputs, axis, step) else {
                break;
            };
            // A sample moved by delta reads f(x - delta) ~= f(x) - slope * delta.
            offsets.push((pred - case.exp) / slope);
        }
        if offsets.len() != failed.len() {
            continue;
        }
        if let Some(shift) = consistent_offset(axis, &offsets) {
            if best.map_or(true, |b| shift.spread < b.spread) {
                best = Some(shift);
            }
        }
    }
    best
}

fn slope_step(dataset: &AbacDataset, axis: AxisName) -> Option<f64> {
    let ticks = interpolation::unique_ticks(&dataset.grid.values, axis);
    let range = ticks.last()? - ticks.first()?;
    (range > COORD_EPSILON).then_some(range * SLOPE_STEP_FRACTION)
}

/// Finite-difference slope of the dataset at `inputs` along `axis`, central
/// when both sides are in domain, one-sided otherwise.
fn local_slope(dataset: &AbacDataset, inputs: &QueryPoint, axis: AxisName, step: f64) -> Option<f64> {
    let at = |delta: f64| interpolation::interpolate(dataset, &inputs.offset(axis, delta)).ok();
    let slope = match (at(step), at(-step)) {
        (Some(hi), Some(lo)) => (hi - lo) / (2.0 * step),
        (Some(hi), None) => (hi - at(0.0)?) / step,
        (None, Some(lo)) => (at(0.0)? - lo) / step,
        (None, None) => return None,
    };
    (slope.abs() > COORD_EPSILON).then_some(slope)
}

fn consistent_offset(axis: AxisName, offsets: &[f64]) -> Option<AxisShift> {
    let first = *offsets.first()?;
    if first == 0.0 || !offsets.iter().all(|o| o.signum() == first.signum() && *o != 0.0) {
        return None;
    }
    let mean = offsets.iter().sum::<f64>() / offsets.len() as f64;
    let max = offsets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = offsets.iter().copied().fold(f64::INFINITY, f64::min);
    let spread = (max - min) / mean.abs();
    (spread < AXIS_SPREAD_LIMIT).then_some(AxisShift {
        axis,
        delta: mean,
        spread,
    })
}
