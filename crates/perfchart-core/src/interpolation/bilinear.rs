//! Bilinear interpolation over altitude x temperature at the nearest mass.

use crate::domain::dataset::{same_coord, AxisName, GridPoint, QueryPoint};

use super::{bracket, lerp, unique_ticks, MASS_WINDOW_KG};

/// Interpolate in the (pressure altitude, OAT) plane of the mass slice
/// closest to the query.
///
/// A query without a mass is accepted only when the grid holds a single
/// mass slice.
///
/// Returns `None` when no slice is strictly closer than [`MASS_WINDOW_KG`], when the query
/// is outside the slice's altitude or temperature range, or when one of the
/// four enclosing corners has no sample.
pub(super) fn interpolate(values: &[GridPoint], inputs: &QueryPoint) -> Option<f64> {
    let slice_mass = match inputs.mass_kg {
        Some(mass) => {
            let nearest = values
                .iter()
                .map(|p| p.mass_kg)
                .min_by(|a, b| (a - mass).abs().total_cmp(&(b - mass).abs()))?;
            if (nearest - mass).abs() >= MASS_WINDOW_KG {
                return None;
            }
            nearest
        }
        None => match unique_ticks(values, AxisName::MassKg).as_slice() {
            [only] => *only,
            _ => return None,
        },
    };
    let slice: Vec<&GridPoint> = values
        .iter()
        .filter(|p| same_coord(p.mass_kg, slice_mass))
        .collect();

    let x = inputs.coordinate(AxisName::PressureAltFt);
    let y = inputs.coordinate(AxisName::OatC);
    let (x1, x2) = bracket(
        &unique_ticks(slice.iter().copied(), AxisName::PressureAltFt),
        x,
    )?;
    let (y1, y2) = bracket(&unique_ticks(slice.iter().copied(), AxisName::OatC), y)?;

    let corner = |px: f64, py: f64| {
        slice
            .iter()
            .find(|p| same_coord(p.pressure_alt_ft, px) && same_coord(p.oat_c, py))
            .map(|p| p.value)
    };
    let q11 = corner(x1, y1)?;
    let q12 = corner(x1, y2)?;
    let q21 = corner(x2, y1)?;
    let q22 = corner(x2, y2)?;

    let fy1 = lerp(x, x1, x2, q11, q21);
    let fy2 = lerp(x, x1, x2, q12, q22);
    Some(lerp(y, y1, y2, fy1, fy2))
}
