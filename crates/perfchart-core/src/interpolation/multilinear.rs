//! Generic N-dimensional interpolation by recursive hypercube splitting.

use crate::domain::dataset::{same_coord, AxisName, GridPoint, QueryPoint};

use super::{bracket, lerp, unique_ticks};

pub(super) fn interpolate(
    values: &[GridPoint],
    inputs: &QueryPoint,
    axes: &[AxisName],
) -> Option<f64> {
    debug_assert!(axes.len() <= AxisName::ALL.len());
    let candidates: Vec<&GridPoint> = values.iter().collect();
    recurse(&candidates, inputs, axes)
}

/// Split `candidates` on the first axis into the hyperplane at-or-below and
/// the hyperplane above the query, interpolate each over the remaining axes,
/// then blend the two results.
fn recurse(candidates: &[&GridPoint], inputs: &QueryPoint, axes: &[AxisName]) -> Option<f64> {
    let Some((&axis, rest)) = axes.split_first() else {
        return candidates.first().map(|p| p.value);
    };

    let q = inputs.coordinate(axis);
    let (lower, upper) = bracket(&unique_ticks(candidates.iter().copied(), axis), q)?;

    let hyperplane = |tick: f64| {
        candidates
            .iter()
            .copied()
            .filter(|p| same_coord(p.coordinate(axis), tick))
            .collect::<Vec<_>>()
    };

    let lower_value = recurse(&hyperplane(lower), inputs, rest)?;
    if same_coord(lower, upper) {
        return Some(lower_value);
    }
    let upper_value = recurse(&hyperplane(upper), inputs, rest)?;
    Some(lerp(q, lower, upper, lower_value, upper_value))
}
