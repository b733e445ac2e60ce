//! Canonical in-memory representation of one performance chart.
//!
//! An [`AbacDataset`] carries the axes, the digitized grid, the interpolation
//! configuration and the validation tests of a single chart. Datasets are
//! value objects: the only sanctioned way to change one is
//! [`crate::analyzer::apply_adjustments`], which returns a new dataset.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::InterpolationError;
use super::purpose::Purpose;
use super::testing::TestCase;

/// Tolerance used when comparing coordinates of grid samples.
pub const COORD_EPSILON: f64 = 1e-9;

/// Returns true when two coordinates denote the same tick.
pub fn same_coord(a: f64, b: f64) -> bool {
    (a - b).abs() <= COORD_EPSILON
}

// ---------------------------------------------------------------------------
// Axes and points
// ---------------------------------------------------------------------------

/// Named input axis of a performance chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisName {
    PressureAltFt,
    OatC,
    MassKg,
    HeadwindKt,
    SlopePercent,
}

impl AxisName {
    /// Every axis a grid point carries, in canonical order.
    pub const ALL: [AxisName; 5] = [
        Self::PressureAltFt,
        Self::OatC,
        Self::MassKg,
        Self::HeadwindKt,
        Self::SlopePercent,
    ];

    /// Axes every dataset is expected to declare.
    pub const MANDATORY: [AxisName; 3] = [Self::PressureAltFt, Self::OatC, Self::MassKg];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PressureAltFt => "pressure_alt_ft",
            Self::OatC => "oat_c",
            Self::MassKg => "mass_kg",
            Self::HeadwindKt => "headwind_kt",
            Self::SlopePercent => "slope_percent",
        }
    }

    /// Parse a wire axis name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.as_str() == name)
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::PressureAltFt => "ft",
            Self::OatC => "C",
            Self::MassKg => "kg",
            Self::HeadwindKt => "kt",
            Self::SlopePercent => "%",
        }
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit and ordered tick values of one axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisSpec {
    pub unit: String,
    pub ticks: Vec<f64>,
}

/// A single digitized sample: conditions plus the dependent value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridPoint {
    pub pressure_alt_ft: f64,
    pub oat_c: f64,
    pub mass_kg: f64,
    #[serde(default)]
    pub headwind_kt: f64,
    #[serde(default)]
    pub slope_percent: f64,
    pub value: f64,
}

impl GridPoint {
    /// Coordinate of this sample on `axis`.
    pub fn coordinate(&self, axis: AxisName) -> f64 {
        match axis {
            AxisName::PressureAltFt => self.pressure_alt_ft,
            AxisName::OatC => self.oat_c,
            AxisName::MassKg => self.mass_kg,
            AxisName::HeadwindKt => self.headwind_kt,
            AxisName::SlopePercent => self.slope_percent,
        }
    }

    pub(crate) fn coordinate_mut(&mut self, axis: AxisName) -> &mut f64 {
        match axis {
            AxisName::PressureAltFt => &mut self.pressure_alt_ft,
            AxisName::OatC => &mut self.oat_c,
            AxisName::MassKg => &mut self.mass_kg,
            AxisName::HeadwindKt => &mut self.headwind_kt,
            AxisName::SlopePercent => &mut self.slope_percent,
        }
    }

    /// Full coordinate tuple of this sample as a query.
    pub fn coordinates(&self) -> QueryPoint {
        QueryPoint {
            pressure_alt_ft: Some(self.pressure_alt_ft),
            oat_c: Some(self.oat_c),
            mass_kg: Some(self.mass_kg),
            headwind_kt: Some(self.headwind_kt),
            slope_percent: Some(self.slope_percent),
        }
    }
}

/// A partial input point. Absent coordinates resolve to `0.0`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_alt_ft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oat_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headwind_kt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope_percent: Option<f64>,
}

impl QueryPoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_altitude(mut self, ft: f64) -> Self {
        self.pressure_alt_ft = Some(ft);
        self
    }

    pub fn with_oat(mut self, celsius: f64) -> Self {
        self.oat_c = Some(celsius);
        self
    }

    pub fn with_mass(mut self, kg: f64) -> Self {
        self.mass_kg = Some(kg);
        self
    }

    pub fn with_headwind(mut self, kt: f64) -> Self {
        self.headwind_kt = Some(kt);
        self
    }

    pub fn with_slope(mut self, percent: f64) -> Self {
        self.slope_percent = Some(percent);
        self
    }

    /// Explicitly supplied coordinate on `axis`, if any.
    pub fn get(&self, axis: AxisName) -> Option<f64> {
        match axis {
            AxisName::PressureAltFt => self.pressure_alt_ft,
            AxisName::OatC => self.oat_c,
            AxisName::MassKg => self.mass_kg,
            AxisName::HeadwindKt => self.headwind_kt,
            AxisName::SlopePercent => self.slope_percent,
        }
    }

    /// Coordinate on `axis`, defaulting to `0.0` when absent.
    pub fn coordinate(&self, axis: AxisName) -> f64 {
        self.get(axis).unwrap_or(0.0)
    }

    pub fn set(&mut self, axis: AxisName, value: f64) {
        let slot = match axis {
            AxisName::PressureAltFt => &mut self.pressure_alt_ft,
            AxisName::OatC => &mut self.oat_c,
            AxisName::MassKg => &mut self.mass_kg,
            AxisName::HeadwindKt => &mut self.headwind_kt,
            AxisName::SlopePercent => &mut self.slope_percent,
        };
        *slot = Some(value);
    }

    /// Copy of this point moved by `delta` along `axis`.
    pub fn offset(&self, axis: AxisName, delta: f64) -> Self {
        let mut moved = *self;
        moved.set(axis, self.coordinate(axis) + delta);
        moved
    }
}

impl fmt::Display for QueryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for axis in AxisName::ALL {
            if let Some(v) = self.get(axis) {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{}={}", axis, v)?;
                first = false;
            }
        }
        if first {
            f.write_str("<empty>")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Grid and configuration
// ---------------------------------------------------------------------------

/// Name and unit of the dependent quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridOutput {
    pub name: String,
    pub unit: String,
}

/// The digitized samples of a chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grid {
    /// Axes walked by N-dimensional interpolation, outermost first.
    pub order_of_iteration: Vec<AxisName>,
    pub output: GridOutput,
    pub values: Vec<GridPoint>,
    /// Confidence in the digitization, in `[0, 1]`.
    pub reconstruction_confidence: f64,
    #[serde(default)]
    pub digitization_notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    Bilinear,
    Trilinear,
    Multilinear,
    Nearest,
}

impl InterpolationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bilinear => "bilinear",
            Self::Trilinear => "trilinear",
            Self::Multilinear => "multilinear",
            Self::Nearest => "nearest",
        }
    }
}

/// What to do when a query falls outside the sampled domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    Forbid,
    LinearWarn,
    Clamp,
}

impl ExtrapolationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forbid => "forbid",
            Self::LinearWarn => "linear_warn",
            Self::Clamp => "clamp",
        }
    }
}

/// Pass criteria for a test case. Both bounds must hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative_percent: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            absolute: 20.0,
            relative_percent: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InterpolationConfig {
    pub method: InterpolationMethod,
    pub extrapolation_policy: ExtrapolationPolicy,
    pub tolerance: Tolerance,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            method: InterpolationMethod::Bilinear,
            extrapolation_policy: ExtrapolationPolicy::Forbid,
            tolerance: Tolerance::default(),
        }
    }
}

/// Operating conditions assumed by the chart unless stated otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionsDefaults {
    pub runway_condition: String,
    pub obstacle_ft: f64,
    pub wind_component_head_kt: f64,
    pub slope_percent: f64,
    #[serde(default)]
    pub assumptions: Vec<String>,
}

impl Default for ConditionsDefaults {
    fn default() -> Self {
        Self {
            runway_condition: "dry_paved".to_string(),
            obstacle_ft: 50.0,
            wind_component_head_kt: 0.0,
            slope_percent: 0.0,
            assumptions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationTests {
    pub description: String,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Something the chart does not cover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataGap {
    pub item: String,
    pub reason: String,
}

/// Provenance of a dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbacMeta {
    pub title: String,
    pub purpose: Purpose,
    #[serde(default)]
    pub source_pages: Vec<u32>,
    #[serde(default)]
    pub source_fig_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// A structured performance chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbacDataset {
    pub id: String,
    pub meta: AbacMeta,
    pub units_convention: String,
    pub conditions_defaults: ConditionsDefaults,
    pub axes: BTreeMap<AxisName, AxisSpec>,
    pub grid: Grid,
    pub interpolation: InterpolationConfig,
    #[serde(default)]
    pub validation_tests: ValidationTests,
    #[serde(default)]
    pub data_gaps: Vec<DataGap>,
}

impl AbacDataset {
    /// Build a dataset from raw samples, deriving axes from the samples.
    ///
    /// Iteration order defaults to altitude, temperature, mass.
    pub fn from_points(id: impl Into<String>, purpose: Purpose, values: Vec<GridPoint>) -> Self {
        let mut axes = BTreeMap::new();
        for axis in AxisName::MANDATORY {
            let mut ticks: Vec<f64> = values.iter().map(|p| p.coordinate(axis)).collect();
            ticks.sort_by(f64::total_cmp);
            ticks.dedup_by(|a, b| same_coord(*a, *b));
            axes.insert(
                axis,
                AxisSpec {
                    unit: axis.unit().to_string(),
                    ticks,
                },
            );
        }

        Self {
            id: id.into(),
            meta: AbacMeta {
                title: purpose.as_str().to_string(),
                purpose,
                source_pages: Vec::new(),
                source_fig_ids: Vec::new(),
            },
            units_convention: "SI_with_aviation_mixed".to_string(),
            conditions_defaults: ConditionsDefaults::default(),
            axes,
            grid: Grid {
                order_of_iteration: AxisName::MANDATORY.to_vec(),
                output: GridOutput {
                    name: purpose.output_name().to_string(),
                    unit: purpose.unit().to_string(),
                },
                values,
                reconstruction_confidence: 1.0,
                digitization_notes: None,
            },
            interpolation: InterpolationConfig::default(),
            validation_tests: ValidationTests::default(),
            data_gaps: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: InterpolationMethod) -> Self {
        self.interpolation.method = method;
        self
    }

    pub fn with_policy(mut self, policy: ExtrapolationPolicy) -> Self {
        self.interpolation.extrapolation_policy = policy;
        self
    }

    pub fn with_iteration_order(mut self, order: Vec<AxisName>) -> Self {
        self.grid.order_of_iteration = order;
        self
    }

    pub fn purpose(&self) -> Purpose {
        self.meta.purpose
    }

    /// Declared axis, if present.
    pub fn axis(&self, name: AxisName) -> Option<&AxisSpec> {
        self.axes.get(&name)
    }

    /// Sample whose coordinates on every iterated axis equal `query`'s.
    pub fn point_at(&self, query: &QueryPoint) -> Option<&GridPoint> {
        self.grid.values.iter().find(|p| {
            self.grid
                .order_of_iteration
                .iter()
                .all(|&axis| same_coord(p.coordinate(axis), query.coordinate(axis)))
        })
    }

    /// The iteration axes, checked to be a duplicate-free subset of [`AxisName::ALL`].
    pub fn iteration_axes(&self) -> Result<&[AxisName], InterpolationError> {
        let order = &self.grid.order_of_iteration;
        if order.is_empty() {
            return Err(InterpolationError::InvalidIterationOrder(
                "no axes declared".to_string(),
            ));
        }
        for (i, axis) in order.iter().enumerate() {
            if order[..i].contains(axis) {
                return Err(InterpolationError::InvalidIterationOrder(format!(
                    "axis {axis} listed twice"
                )));
            }
        }
        Ok(order)
    }
}
