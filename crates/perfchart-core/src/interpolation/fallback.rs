//! Out-of-domain fallbacks: nearest sample and altitude-slope extrapolation.

use crate::domain::dataset::{AxisName, GridPoint, QueryPoint, COORD_EPSILON};

/// Euclidean distance over altitude, temperature and mass. Other axes are
/// not weighted.
fn distance(point: &GridPoint, inputs: &QueryPoint) -> f64 {
    let dx = point.pressure_alt_ft - inputs.coordinate(AxisName::PressureAltFt);
    let dy = point.oat_c - inputs.coordinate(AxisName::OatC);
    let dz = point.mass_kg - inputs.coordinate(AxisName::MassKg);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// The sample closest to `inputs`. Ties keep the earliest sample.
pub fn nearest<'a>(values: &'a [GridPoint], inputs: &QueryPoint) -> Option<&'a GridPoint> {
    let mut best: Option<(&GridPoint, f64)> = None;
    for p in values {
        let d = distance(p, inputs);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((p, d));
        }
    }
    best.map(|(p, _)| p)
}

/// Two-point linear extrapolation along the altitude axis, anchored on the two
/// samples nearest to `inputs`.
///
/// Falls back to the nearest value when only one sample exists or the two
/// anchors share the same altitude.
pub fn linear_extrapolate(values: &[GridPoint], inputs: &QueryPoint) -> Option<f64> {
    let mut ranked: Vec<(&GridPoint, f64)> = values.iter().map(|p| (p, distance(p, inputs))).collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let (p1, _) = *ranked.first()?;
    let Some(&(p2, _)) = ranked.get(1) else {
        return Some(p1.value);
    };

    let dx = p2.pressure_alt_ft - p1.pressure_alt_ft;
    if dx.abs() < COORD_EPSILON {
        return Some(p1.value);
    }
    let slope = (p2.value - p1.value) / dx;
    Some(p1.value + slope * (inputs.coordinate(AxisName::PressureAltFt) - p1.pressure_alt_ft))
}
