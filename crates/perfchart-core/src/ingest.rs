//! Conversion of digitized figures into index entries and datasets.
//!
//! The digitization collaborator delivers pages of figures, each with axis
//! labels and digitized `(x, y, series)` points. Inventory turns
//! performance-looking figures into [`AbacIndexEntry`]s; extraction turns one
//! figure into an [`AbacDataset`].

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classify::{is_performance_chart, PurposeClassifier};
use crate::config::ProtocolConfig;
use crate::domain::dataset::{
    AbacDataset, AbacMeta, AxisName, AxisSpec, ConditionsDefaults, Grid, GridOutput, GridPoint,
    InterpolationConfig, ValidationTests,
};
use crate::domain::index::{AbacIndex, AbacIndexEntry, DocumentMeta};
use crate::domain::purpose::Purpose;
use crate::validation::generate_test_cases;

const ALTITUDE_STEP_FT: f64 = 1000.0;
const OAT_STEP_C: f64 = 10.0;
const DEFAULT_MASS_TICKS_KG: (f64, f64, f64) = (600.0, 1200.0, 100.0);

// ---------------------------------------------------------------------------
// Collaborator payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AxisLabel {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FigureAxes {
    #[serde(default)]
    pub x: Option<AxisLabel>,
    #[serde(default)]
    pub y: Option<AxisLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigitizedPoint {
    pub x: f64,
    pub y: f64,
    /// Curve identifier, e.g. `"1100 kg"`.
    #[serde(default)]
    pub series: Option<String>,
}

/// One figure found on a manual page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Figure {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub axes: Option<FigureAxes>,
    #[serde(default)]
    pub digitized_points: Vec<DigitizedPoint>,
}

/// Structured content of one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageExtract {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub figures: Vec<Figure>,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Identifier of the `seq`-th chart found in one inventory pass.
pub fn abac_id(purpose: Purpose, seq: usize) -> String {
    format!("abac_{}_{}_{}", purpose, Utc::now().timestamp_millis(), seq)
}

/// Index every performance chart on `pages`, in page then figure order.
pub fn build_index(
    pages: &[PageExtract],
    meta: Option<DocumentMeta>,
    classifier: &dyn PurposeClassifier,
) -> AbacIndex {
    let mut abacs = Vec::new();
    for page in pages {
        for fig in page.figures.iter().filter(|f| is_performance_chart(f)) {
            let caption = fig.caption.clone().unwrap_or_default();
            let purpose = classifier.detect_purpose(&caption);
            let pages: Vec<u32> = page.page.or(fig.page).into_iter().collect();
            abacs.push(AbacIndexEntry {
                id: abac_id(purpose, abacs.len()),
                title: fig
                    .caption
                    .clone()
                    .unwrap_or_else(|| "Performance Chart".to_string()),
                purpose,
                pages,
                source_fig_ids: vec![fig.id.clone()],
                notes: fig.caption.clone(),
            });
        }
    }
    AbacIndex { meta, abacs }
}

/// First figure on `pages` whose id is one of `fig_ids`.
pub fn find_figure<'a>(pages: &'a [PageExtract], fig_ids: &[String]) -> Option<&'a Figure> {
    pages
        .iter()
        .flat_map(|p| p.figures.iter())
        .find(|f| fig_ids.contains(&f.id))
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Evenly spaced ticks from `min` to `max` inclusive.
///
/// Computed by index so accumulated rounding never drops the last tick.
pub fn generate_ticks(min: f64, max: f64, step: f64) -> Vec<f64> {
    if step.is_nan() || step <= 0.0 || !min.is_finite() || !max.is_finite() || max < min {
        return Vec::new();
    }
    let count = ((max - min) / step + 1e-9).floor() as usize;
    (0..=count).map(|i| min + step * i as f64).collect()
}

fn mass_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)(\d+)\s*kg").ok())
        .as_ref()
}

/// Mass in a series label such as `"1100 kg"` or `"masse 950KG"`.
pub fn mass_from_series(series: &str) -> Option<f64> {
    let caps = mass_pattern()?.captures(series)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Axis receiving the digitized x coordinate.
fn x_axis(figure: &Figure) -> AxisName {
    let label = figure
        .axes
        .as_ref()
        .and_then(|a| a.x.as_ref())
        .and_then(|x| x.label.as_deref())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if label.contains("temp") && !label.contains("alt") {
        AxisName::OatC
    } else {
        AxisName::PressureAltFt
    }
}

fn extract_axes(
    figure: &Figure,
    x_axis: AxisName,
    config: &ProtocolConfig,
) -> BTreeMap<AxisName, AxisSpec> {
    let mut axes = BTreeMap::new();
    let x = figure.axes.as_ref().and_then(|a| a.x.as_ref());

    let (step, fixed_axis, fixed_tick) = match x_axis {
        AxisName::OatC => (OAT_STEP_C, AxisName::PressureAltFt, 0.0),
        _ => (ALTITUDE_STEP_FT, AxisName::OatC, config.isa_temperature_c),
    };
    let x_ticks = match x.and_then(|x| x.min.zip(x.max)) {
        Some((min, max)) => generate_ticks(min, max, step),
        None => {
            let mut ticks: Vec<f64> = figure.digitized_points.iter().map(|p| p.x).collect();
            ticks.sort_by(f64::total_cmp);
            ticks.dedup();
            ticks
        }
    };
    axes.insert(
        x_axis,
        AxisSpec {
            unit: x_axis.unit().to_string(),
            ticks: x_ticks,
        },
    );
    axes.insert(
        fixed_axis,
        AxisSpec {
            unit: fixed_axis.unit().to_string(),
            ticks: vec![fixed_tick],
        },
    );

    let (lo, hi, mass_step) = DEFAULT_MASS_TICKS_KG;
    axes.insert(
        AxisName::MassKg,
        AxisSpec {
            unit: AxisName::MassKg.unit().to_string(),
            ticks: generate_ticks(lo, hi, mass_step),
        },
    );
    axes
}

fn extract_grid(figure: &Figure, x_axis: AxisName, purpose: Purpose, config: &ProtocolConfig) -> Grid {
    let values = figure
        .digitized_points
        .iter()
        .map(|pt| {
            let mut p = GridPoint {
                pressure_alt_ft: 0.0,
                oat_c: config.isa_temperature_c,
                mass_kg: pt
                    .series
                    .as_deref()
                    .and_then(mass_from_series)
                    .unwrap_or(config.default_mass_kg),
                headwind_kt: 0.0,
                slope_percent: 0.0,
                value: pt.y,
            };
            *p.coordinate_mut(x_axis) = pt.x;
            p
        })
        .collect();

    Grid {
        order_of_iteration: AxisName::MANDATORY.to_vec(),
        output: GridOutput {
            name: purpose.output_name().to_string(),
            unit: purpose.unit().to_string(),
        },
        values,
        reconstruction_confidence: config.reconstruction_confidence,
        digitization_notes: None,
    }
}

/// Build the dataset for `entry` from its full-detail `figure`.
///
/// Generated test cases are stored in `validation_tests`.
pub fn extract_abac_data(figure: &Figure, entry: &AbacIndexEntry, config: &ProtocolConfig) -> AbacDataset {
    let x_axis = x_axis(figure);
    let purpose = entry.purpose;
    let mut dataset = AbacDataset {
        id: entry.id.clone(),
        meta: AbacMeta {
            title: figure
                .caption
                .clone()
                .unwrap_or_else(|| "Performance Data".to_string()),
            purpose,
            source_pages: figure.page.map(|p| vec![p]).unwrap_or_else(|| entry.pages.clone()),
            source_fig_ids: vec![figure.id.clone()],
        },
        units_convention: "SI_with_aviation_mixed".to_string(),
        conditions_defaults: ConditionsDefaults::default(),
        axes: extract_axes(figure, x_axis, config),
        grid: extract_grid(figure, x_axis, purpose, config),
        interpolation: InterpolationConfig {
            method: config.method,
            extrapolation_policy: config.extrapolation_policy,
            tolerance: config.tolerance,
        },
        validation_tests: ValidationTests::default(),
        data_gaps: Vec::new(),
    };
    dataset.validation_tests = ValidationTests {
        description: "Automatic validation protocol".to_string(),
        cases: generate_test_cases(&dataset, config.tolerance),
    };
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::KeywordPurposeClassifier;

    fn takeoff_figure() -> Figure {
        Figure {
            id: "fig-12".to_string(),
            kind: Some("abac".to_string()),
            caption: Some("Takeoff ground roll".to_string()),
            page: Some(12),
            axes: Some(FigureAxes {
                x: Some(AxisLabel {
                    label: Some("Pressure altitude (ft)".to_string()),
                    min: Some(0.0),
                    max: Some(4000.0),
                }),
                y: Some(AxisLabel {
                    label: Some("Distance (m)".to_string()),
                    min: None,
                    max: None,
                }),
            }),
            digitized_points: vec![
                DigitizedPoint {
                    x: 0.0,
                    y: 250.0,
                    series: Some("900 kg".to_string()),
                },
                DigitizedPoint {
                    x: 2000.0,
                    y: 300.0,
                    series: Some("900 kg".to_string()),
                },
                DigitizedPoint {
                    x: 4000.0,
                    y: 360.0,
                    series: None,
                },
            ],
        }
    }

    fn pages() -> Vec<PageExtract> {
        vec![
            PageExtract {
                page: Some(12),
                figures: vec![
                    takeoff_figure(),
                    Figure {
                        id: "fig-13".to_string(),
                        kind: Some("photo".to_string()),
                        caption: Some("Cockpit".to_string()),
                        page: Some(12),
                        axes: None,
                        digitized_points: Vec::new(),
                    },
                ],
            },
            PageExtract {
                page: Some(14),
                figures: vec![Figure {
                    id: "fig-14".to_string(),
                    kind: None,
                    caption: Some("Landing distance".to_string()),
                    page: None,
                    axes: Some(FigureAxes {
                        x: Some(AxisLabel {
                            label: Some("Altitude".to_string()),
                            min: None,
                            max: None,
                        }),
                        y: None,
                    }),
                    digitized_points: Vec::new(),
                }],
            },
        ]
    }

    #[test]
    fn test_generate_ticks_inclusive() {
        assert_eq!(generate_ticks(0.0, 4000.0, 1000.0).len(), 5);
        assert_eq!(generate_ticks(-10.0, 30.0, 10.0), vec![-10.0, 0.0, 10.0, 20.0, 30.0]);
        assert_eq!(generate_ticks(0.0, 0.3, 0.1).len(), 4);
        assert!(generate_ticks(10.0, 0.0, 1.0).is_empty());
        assert!(generate_ticks(0.0, 10.0, 0.0).is_empty());
    }

    #[test]
    fn test_mass_from_series() {
        assert_eq!(mass_from_series("1100 kg"), Some(1100.0));
        assert_eq!(mass_from_series("masse 950KG"), Some(950.0));
        assert_eq!(mass_from_series("MTOW"), None);
    }

    #[test]
    fn test_build_index_keeps_discovery_order() {
        let index = build_index(&pages(), None, &KeywordPurposeClassifier);
        assert_eq!(index.abacs.len(), 2);
        let first = &index.abacs[0];
        assert!(first.id.starts_with("abac_distance_ground_roll_"));
        assert!(first.id.ends_with("_0"));
        assert_eq!(first.pages, vec![12]);
        assert_eq!(first.source_fig_ids, vec!["fig-12".to_string()]);
        assert_eq!(index.abacs[1].purpose, Purpose::LandingDistance);
        assert_ne!(index.abacs[0].id, index.abacs[1].id);
    }

    #[test]
    fn test_find_figure_by_id() {
        let pages = pages();
        let fig = find_figure(&pages, &["fig-14".to_string()]).expect("found");
        assert_eq!(fig.caption.as_deref(), Some("Landing distance"));
        assert!(find_figure(&pages, &["fig-99".to_string()]).is_none());
    }

    #[test]
    fn test_extract_abac_data_maps_points() {
        let index = build_index(&pages(), None, &KeywordPurposeClassifier);
        let config = ProtocolConfig::default();
        let ds = extract_abac_data(&takeoff_figure(), &index.abacs[0], &config);

        assert_eq!(ds.id, index.abacs[0].id);
        assert_eq!(ds.grid.output.name, "distance");
        assert_eq!(ds.grid.output.unit, "m");
        assert_eq!(ds.grid.reconstruction_confidence, 0.8);
        assert_eq!(ds.grid.values[1].pressure_alt_ft, 2000.0);
        assert_eq!(ds.grid.values[1].oat_c, 15.0);
        assert_eq!(ds.grid.values[1].mass_kg, 900.0);
        assert_eq!(ds.grid.values[2].mass_kg, 1000.0);
        assert_eq!(
            ds.axis(AxisName::PressureAltFt).map(|a| a.ticks.len()),
            Some(5)
        );
        assert_eq!(ds.axis(AxisName::MassKg).map(|a| a.ticks.len()), Some(7));
        assert_eq!(ds.validation_tests.cases.len(), 3);
        assert_eq!(ds.conditions_defaults.runway_condition, "dry_paved");
    }

    #[test]
    fn test_temperature_x_axis() {
        let mut fig = takeoff_figure();
        if let Some(x) = fig.axes.as_mut().and_then(|a| a.x.as_mut()) {
            x.label = Some("OAT temperature (C)".to_string());
            x.min = Some(-20.0);
            x.max = Some(40.0);
        }
        fig.digitized_points[0].x = -20.0;
        let index = build_index(&pages(), None, &KeywordPurposeClassifier);
        let ds = extract_abac_data(&fig, &index.abacs[0], &ProtocolConfig::default());
        assert_eq!(ds.grid.values[0].oat_c, -20.0);
        assert_eq!(ds.grid.values[0].pressure_alt_ft, 0.0);
        assert_eq!(ds.axis(AxisName::OatC).map(|a| a.ticks.len()), Some(7));
        assert_eq!(
            ds.axis(AxisName::PressureAltFt).map(|a| a.ticks.clone()),
            Some(vec![0.0])
        );
    }
}
