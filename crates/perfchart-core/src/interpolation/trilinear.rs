//! Trilinear interpolation over altitude, temperature and mass.

use crate::domain::dataset::{same_coord, AxisName, GridPoint, QueryPoint};

use super::{bracket, lerp, unique_ticks};

pub(super) fn interpolate(values: &[GridPoint], inputs: &QueryPoint) -> Option<f64> {
    let x = inputs.coordinate(AxisName::PressureAltFt);
    let y = inputs.coordinate(AxisName::OatC);
    let z = inputs.coordinate(AxisName::MassKg);

    let (x0, x1) = bracket(&unique_ticks(values, AxisName::PressureAltFt), x)?;
    let (y0, y1) = bracket(&unique_ticks(values, AxisName::OatC), y)?;
    let (z0, z1) = bracket(&unique_ticks(values, AxisName::MassKg), z)?;

    let corner = |px: f64, py: f64, pz: f64| {
        values
            .iter()
            .find(|p| {
                same_coord(p.pressure_alt_ft, px) && same_coord(p.oat_c, py) && same_coord(p.mass_kg, pz)
            })
            .map(|p| p.value)
    };

    // c{y}{z}: blended along x first.
    let c00 = lerp(x, x0, x1, corner(x0, y0, z0)?, corner(x1, y0, z0)?);
    let c01 = lerp(x, x0, x1, corner(x0, y0, z1)?, corner(x1, y0, z1)?);
    let c10 = lerp(x, x0, x1, corner(x0, y1, z0)?, corner(x1, y1, z0)?);
    let c11 = lerp(x, x0, x1, corner(x0, y1, z1)?, corner(x1, y1, z1)?);

    let c0 = lerp(y, y0, y1, c00, c10);
    let c1 = lerp(y, y0, y1, c01, c11);

    Some(lerp(z, z0, z1, c0, c1))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// value = 100 + 0.1 * alt + 2 * oat + 0.5 * mass, sampled on a 2x2x2 cube.
    fn cube() -> Vec<GridPoint> {
        let mut pts = Vec::new();
        for alt in [0.0, 2000.0] {
            for oat in [0.0, 20.0] {
                for mass in [800.0, 1200.0] {
                    pts.push(GridPoint {
                        pressure_alt_ft: alt,
                        oat_c: oat,
                        mass_kg: mass,
                        headwind_kt: 0.0,
                        slope_percent: 0.0,
                        value: 100.0 + 0.1 * alt + 2.0 * oat + 0.5 * mass,
                    });
                }
            }
        }
        pts
    }

    #[test]
    fn test_reproduces_linear_field() {
        let q = QueryPoint::new()
            .with_altitude(500.0)
            .with_oat(5.0)
            .with_mass(1100.0);
        let v = interpolate(&cube(), &q).expect("inside");
        let expected = 100.0 + 50.0 + 10.0 + 550.0;
        assert!((v - expected).abs() < 1e-9, "{v} != {expected}");
    }

    #[test]
    fn test_exact_corner() {
        let q = QueryPoint::new()
            .with_altitude(2000.0)
            .with_oat(0.0)
            .with_mass(800.0);
        assert_eq!(interpolate(&cube(), &q), Some(100.0 + 200.0 + 400.0));
    }

    #[test]
    fn test_outside_mass_range() {
        let q = QueryPoint::new()
            .with_altitude(500.0)
            .with_oat(5.0)
            .with_mass(1300.0);
        assert_eq!(interpolate(&cube(), &q), None);
    }
}
