//! Interpolation engine.
//!
//! Evaluates a dataset at an arbitrary input point. The algorithm is chosen
//! by `dataset.interpolation.method`; when no enclosing cell exists the
//! dataset's [`ExtrapolationPolicy`] decides between failing, extrapolating
//! along altitude with a warning, or clamping to the nearest sample.
//!
//! No unit conversion happens here: inputs must already be expressed in the
//! dataset's units.

mod bilinear;
mod fallback;
mod multilinear;
mod trilinear;

use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::domain::dataset::{
    AbacDataset, AxisName, ExtrapolationPolicy, GridPoint, InterpolationMethod, QueryPoint,
    COORD_EPSILON,
};
use crate::domain::error::InterpolationError;
use crate::metrics::METRICS;
use crate::obs;

pub use fallback::{linear_extrapolate, nearest};

/// Half-width of the open mass band used to pick the bilinear slice.
pub const MASS_WINDOW_KG: f64 = 50.0;

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Inside the sampled domain.
    Interpolated,
    /// Declared `nearest` method.
    Nearest,
    /// Out of domain, clamped to the nearest sample.
    Clamped,
    /// Out of domain, linearly extrapolated. Callers should surface a warning.
    Extrapolated,
}

/// Value produced by the engine together with how it was produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub value: f64,
    pub mode: EvaluationMode,
}

impl Evaluation {
    pub fn is_extrapolated(&self) -> bool {
        self.mode == EvaluationMode::Extrapolated
    }
}

/// Evaluate `dataset` at `inputs`, returning only the value.
///
/// # Errors
///
/// - `InterpolationError::OutOfDomain` when the point lies outside the sampled
///   region and the policy is `forbid`, or when any coordinate is not finite.
/// - `InterpolationError::EmptyGrid` when the dataset has no samples.
pub fn interpolate(dataset: &AbacDataset, inputs: &QueryPoint) -> Result<f64, InterpolationError> {
    evaluate(dataset, inputs).map(|e| e.value)
}

/// Evaluate `dataset` at `inputs`.
pub fn evaluate(
    dataset: &AbacDataset,
    inputs: &QueryPoint,
) -> Result<Evaluation, InterpolationError> {
    let values = &dataset.grid.values;
    if values.is_empty() {
        return Err(InterpolationError::EmptyGrid);
    }
    // No policy can place a NaN or infinite coordinate on the grid.
    if AxisName::ALL
        .iter()
        .any(|&axis| inputs.get(axis).is_some_and(|v| !v.is_finite()))
    {
        return Err(InterpolationError::OutOfDomain { inputs: *inputs });
    }

    let found = match dataset.interpolation.method {
        InterpolationMethod::Bilinear => bilinear::interpolate(values, inputs),
        InterpolationMethod::Trilinear => trilinear::interpolate(values, inputs),
        InterpolationMethod::Multilinear => {
            let axes = dataset.iteration_axes()?;
            multilinear::interpolate(values, inputs, axes)
        }
        InterpolationMethod::Nearest => {
            let point = nearest(values, inputs).ok_or(InterpolationError::EmptyGrid)?;
            return Ok(Evaluation {
                value: point.value,
                mode: EvaluationMode::Nearest,
            });
        }
    };

    match found {
        Some(value) => Ok(Evaluation {
            value,
            mode: EvaluationMode::Interpolated,
        }),
        None => handle_out_of_domain(dataset, inputs),
    }
}

fn handle_out_of_domain(
    dataset: &AbacDataset,
    inputs: &QueryPoint,
) -> Result<Evaluation, InterpolationError> {
    let values = &dataset.grid.values;
    match dataset.interpolation.extrapolation_policy {
        ExtrapolationPolicy::Forbid => Err(InterpolationError::OutOfDomain { inputs: *inputs }),
        ExtrapolationPolicy::LinearWarn => {
            let value = linear_extrapolate(values, inputs).ok_or(InterpolationError::EmptyGrid)?;
            METRICS.inc_extrapolations();
            obs::emit_extrapolation(&dataset.id, inputs, value);
            Ok(Evaluation {
                value,
                mode: EvaluationMode::Extrapolated,
            })
        }
        ExtrapolationPolicy::Clamp => {
            let point = nearest(values, inputs).ok_or(InterpolationError::EmptyGrid)?;
            Ok(Evaluation {
                value: point.value,
                mode: EvaluationMode::Clamped,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Shared numeric helpers
// ---------------------------------------------------------------------------

/// Linear blend of `v0` at `x0` and `v1` at `x1`, evaluated at `x`.
///
/// A degenerate range returns `v0` instead of NaN.
pub(crate) fn lerp(x: f64, x0: f64, x1: f64, v0: f64, v1: f64) -> f64 {
    let span = x1 - x0;
    if span.abs() < COORD_EPSILON {
        return v0;
    }
    v0 + (v1 - v0) * ((x - x0) / span)
}

/// Sorted, deduplicated coordinates of `points` on `axis`.
pub(crate) fn unique_ticks<'a, I>(points: I, axis: AxisName) -> Vec<f64>
where
    I: IntoIterator<Item = &'a GridPoint>,
{
    let set: BTreeSet<OrderedFloat<f64>> = points
        .into_iter()
        .map(|p| OrderedFloat(p.coordinate(axis)))
        .collect();
    let mut ticks: Vec<f64> = Vec::with_capacity(set.len());
    for t in set {
        if ticks.last().is_some_and(|&last| (t.0 - last).abs() <= COORD_EPSILON) {
            continue;
        }
        ticks.push(t.0);
    }
    ticks
}

/// Enclosing ticks of `x`: the nearest tick at-or-below and the nearest tick
/// above. An exact hit returns the same tick twice.
///
/// Returns `None` when `x` lies outside `[min, max]` of `ticks`.
pub(crate) fn bracket(ticks: &[f64], x: f64) -> Option<(f64, f64)> {
    let first = *ticks.first()?;
    let last = *ticks.last()?;
    if x < first - COORD_EPSILON || x > last + COORD_EPSILON {
        return None;
    }
    if let Some(&hit) = ticks.iter().find(|&&t| (t - x).abs() <= COORD_EPSILON) {
        return Some((hit, hit));
    }
    let lower = ticks.iter().rev().find(|&&t| t < x).copied().unwrap_or(first);
    let upper = ticks.iter().find(|&&t| t > x).copied().unwrap_or(last);
    Some((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::purpose::Purpose;

    fn point(alt: f64, oat: f64, mass: f64, value: f64) -> GridPoint {
        GridPoint {
            pressure_alt_ft: alt,
            oat_c: oat,
            mass_kg: mass,
            headwind_kt: 0.0,
            slope_percent: 0.0,
            value,
        }
    }

    fn square() -> AbacDataset {
        AbacDataset::from_points(
            "abac_square",
            Purpose::DistanceGroundRoll,
            vec![
                point(0.0, 0.0, 1000.0, 300.0),
                point(0.0, 20.0, 1000.0, 340.0),
                point(2000.0, 0.0, 1000.0, 360.0),
                point(2000.0, 20.0, 1000.0, 400.0),
            ],
        )
    }

    #[test]
    fn test_lerp_degenerate_range_returns_first_value() {
        assert_eq!(lerp(5.0, 3.0, 3.0, 10.0, 20.0), 10.0);
        assert_eq!(lerp(5.0, 0.0, 10.0, 10.0, 20.0), 15.0);
    }

    #[test]
    fn test_bracket_inside_exact_and_outside() {
        let ticks = [0.0, 1000.0, 2000.0];
        assert_eq!(bracket(&ticks, 1500.0), Some((1000.0, 2000.0)));
        assert_eq!(bracket(&ticks, 1000.0), Some((1000.0, 1000.0)));
        assert_eq!(bracket(&ticks, 2000.0), Some((2000.0, 2000.0)));
        assert_eq!(bracket(&ticks, -1.0), None);
        assert_eq!(bracket(&ticks, 2000.5), None);
        assert_eq!(bracket(&[], 0.0), None);
    }

    #[test]
    fn test_unique_ticks_sorted_and_deduplicated() {
        let pts = [
            point(2000.0, 0.0, 1000.0, 1.0),
            point(0.0, 0.0, 1000.0, 1.0),
            point(2000.0, 20.0, 1000.0, 1.0),
        ];
        assert_eq!(
            unique_ticks(pts.iter(), AxisName::PressureAltFt),
            vec![0.0, 2000.0]
        );
    }

    #[test]
    fn test_empty_grid_is_an_error() {
        let ds = AbacDataset::from_points("abac_empty", Purpose::Tas, vec![]);
        assert_eq!(
            interpolate(&ds, &QueryPoint::new()),
            Err(InterpolationError::EmptyGrid)
        );
    }

    #[test]
    fn test_policies_outside_domain() {
        let outside = QueryPoint::new()
            .with_altitude(3000.0)
            .with_oat(10.0)
            .with_mass(1000.0);

        let forbid = square();
        assert!(matches!(
            evaluate(&forbid, &outside),
            Err(InterpolationError::OutOfDomain { .. })
        ));

        let clamp = square().with_policy(ExtrapolationPolicy::Clamp);
        let clamped = evaluate(&clamp, &outside).expect("clamp");
        assert_eq!(clamped.mode, EvaluationMode::Clamped);

        let warn = square().with_policy(ExtrapolationPolicy::LinearWarn);
        let extrapolated = evaluate(&warn, &outside).expect("extrapolate");
        assert!(extrapolated.is_extrapolated());
        assert!(extrapolated.value.is_finite());
    }

    #[test]
    fn test_nearest_method_ignores_policy() {
        let ds = square().with_method(InterpolationMethod::Nearest);
        let q = QueryPoint::new()
            .with_altitude(5000.0)
            .with_oat(25.0)
            .with_mass(1000.0);
        let e = evaluate(&ds, &q).expect("nearest");
        assert_eq!(e.mode, EvaluationMode::Nearest);
        assert_eq!(e.value, 400.0);
    }

    #[test]
    fn test_non_finite_inputs_are_out_of_domain_under_any_policy() {
        let queries = [
            QueryPoint::new().with_altitude(f64::NAN).with_oat(10.0),
            QueryPoint::new().with_altitude(1000.0).with_oat(f64::INFINITY),
            QueryPoint::new().with_altitude(1000.0).with_mass(f64::NEG_INFINITY),
        ];
        for policy in [
            ExtrapolationPolicy::Forbid,
            ExtrapolationPolicy::Clamp,
            ExtrapolationPolicy::LinearWarn,
        ] {
            for method in [InterpolationMethod::Bilinear, InterpolationMethod::Nearest] {
                let ds = square().with_method(method).with_policy(policy);
                for q in &queries {
                    assert!(
                        matches!(evaluate(&ds, q), Err(InterpolationError::OutOfDomain { .. })),
                        "{method:?}/{policy:?} accepted {q:?}"
                    );
                }
            }
        }
    }
}
