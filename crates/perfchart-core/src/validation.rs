//! Validation service.
//!
//! Two independent checks:
//! - [`execute_validation_tests`] runs test cases through the interpolation
//!   engine and scores each against its tolerance (absolute AND relative).
//! - [`validate_abac_data`] performs advisory structural and plausibility
//!   checks that degrade a `data_quality` factor instead of rejecting.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::domain::dataset::{AbacDataset, AxisName, GridPoint, QueryPoint, Tolerance};
use crate::domain::error::InterpolationError;
use crate::domain::testing::{CaseOutcome, TestCase, TestResult};
use crate::interpolation::{self, Evaluation};
use crate::metrics::METRICS;
use crate::obs;

// ---------------------------------------------------------------------------
// Test execution
// ---------------------------------------------------------------------------

/// Score one case against the engine's answer.
///
/// A case passes iff `abs_err <= tol_abs` AND `pct_err <= tol_pct`. An engine
/// error (e.g. out of domain under `forbid`) is a failed case, not a crash.
pub fn score_case(case: &TestCase, evaluation: Result<Evaluation, InterpolationError>) -> CaseOutcome {
    let evaluation = match evaluation {
        Ok(e) => e,
        Err(err) => {
            return CaseOutcome {
                case: case.name.clone(),
                ok: false,
                pred: None,
                exp: case.expected,
                abs_err: None,
                pct_err: None,
                inputs: case.inputs,
                extrapolated: false,
                error: Some(err.to_string()),
            };
        }
    };

    let abs_err = (evaluation.value - case.expected).abs();
    let pct_err = if case.expected != 0.0 {
        Some(100.0 * abs_err / case.expected.abs())
    } else if abs_err == 0.0 {
        Some(0.0)
    } else {
        None
    };
    let ok = abs_err <= case.tol_abs && pct_err.is_some_and(|pct| pct <= case.tol_pct);

    CaseOutcome {
        case: case.name.clone(),
        ok,
        pred: Some(evaluation.value),
        exp: case.expected,
        abs_err: Some(abs_err),
        pct_err,
        inputs: case.inputs,
        extrapolated: evaluation.is_extrapolated(),
        error: None,
    }
}

/// Run `cases` against `dataset` and aggregate the outcomes.
pub fn execute_validation_tests(dataset: &AbacDataset, cases: &[TestCase]) -> TestResult {
    let _span = obs::AbacSpan::enter(&dataset.id);

    let details: Vec<CaseOutcome> = cases
        .iter()
        .map(|case| score_case(case, interpolation::evaluate(dataset, &case.inputs)))
        .collect();
    METRICS.add_cases_evaluated(cases.len() as u64);

    let result = TestResult::from_details(dataset.id.clone(), details);
    obs::emit_validation_completed(
        &result.id,
        result.summary.passed,
        result.summary.failed,
        result.summary.max_error,
    );
    result
}

/// Sample representative grid points (first, middle, last) as test cases.
///
/// Samples sharing coordinates are emitted once.
pub fn generate_test_cases(dataset: &AbacDataset, tolerance: Tolerance) -> Vec<TestCase> {
    let values = &dataset.grid.values;
    if values.is_empty() {
        return Vec::new();
    }
    let picks = [0, values.len() / 2, values.len() - 1];

    let mut seen: Vec<QueryPoint> = Vec::new();
    let mut cases = Vec::new();
    for idx in picks {
        let point = &values[idx];
        let inputs = point.coordinates();
        if seen.contains(&inputs) {
            continue;
        }
        seen.push(inputs);
        cases.push(TestCase::new(
            format!("test_corner_{}", cases.len() + 1),
            inputs,
            point.value,
            tolerance,
        ));
    }
    cases
}

// ---------------------------------------------------------------------------
// Structural checks
// ---------------------------------------------------------------------------

/// Quality factor applied per missing mandatory axis.
const MISSING_AXIS_FACTOR: f64 = 0.9;
/// Quality factor applied once when any altitude trend decreases.
const NON_MONOTONIC_FACTOR: f64 = 0.8;
/// Quality factor applied per distinct out-of-range condition.
const CONDITION_RANGE_FACTOR: f64 = 0.95;
/// Quality factor applied per distinct implausible distance.
const DISTANCE_RANGE_FACTOR: f64 = 0.9;

const ALTITUDE_RANGE_FT: (f64, f64) = (-1000.0, 15000.0);
const OAT_RANGE_C: (f64, f64) = (-40.0, 50.0);
const MASS_RANGE_KG: (f64, f64) = (300.0, 5000.0);
const DISTANCE_RANGE_M: (f64, f64) = (50.0, 5000.0);

/// Advisory report on a dataset's structure and plausibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    /// False only for structural errors (missing id, empty grid).
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Starts at 1.0 and shrinks with every warning class.
    pub data_quality: f64,
}

/// Check `dataset` for structural errors and data-quality warnings.
pub fn validate_abac_data(dataset: &AbacDataset) -> ValidationReport {
    let mut report = ValidationReport {
        is_valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
        data_quality: 1.0,
    };

    if dataset.id.trim().is_empty() {
        report.errors.push("dataset id is missing".to_string());
        report.is_valid = false;
    }
    if dataset.grid.values.is_empty() {
        report.errors.push("grid is empty".to_string());
        report.is_valid = false;
    }

    for axis in AxisName::MANDATORY {
        let present = dataset.axis(axis).is_some_and(|spec| !spec.ticks.is_empty());
        if !present {
            report
                .warnings
                .push(format!("axis {axis} is missing or has no ticks"));
            report.data_quality *= MISSING_AXIS_FACTOR;
        }
    }

    if let Some(detail) = find_altitude_decrease(&dataset.grid.values) {
        report
            .warnings
            .push(format!("non-monotonic output: {detail}"));
        report.data_quality *= NON_MONOTONIC_FACTOR;
    }

    for (issue, factor) in range_issues(dataset) {
        report.warnings.push(issue);
        report.data_quality *= factor;
    }

    report
}

type ConditionKey = (
    OrderedFloat<f64>,
    OrderedFloat<f64>,
    OrderedFloat<f64>,
    OrderedFloat<f64>,
);

/// Group samples sharing every condition but altitude and report the first
/// place where the output decreases as altitude increases.
fn find_altitude_decrease(values: &[GridPoint]) -> Option<String> {
    let mut groups: BTreeMap<ConditionKey, Vec<&GridPoint>> = BTreeMap::new();
    for p in values {
        let key = (
            OrderedFloat(p.oat_c),
            OrderedFloat(p.mass_kg),
            OrderedFloat(p.headwind_kt),
            OrderedFloat(p.slope_percent),
        );
        groups.entry(key).or_default().push(p);
    }

    for group in groups.values_mut() {
        group.sort_by(|a, b| a.pressure_alt_ft.total_cmp(&b.pressure_alt_ft));
        for pair in group.windows(2) {
            if pair[1].value < pair[0].value {
                return Some(format!(
                    "value drops from {} to {} at {} ft (oat {} C, mass {} kg)",
                    pair[0].value, pair[1].value, pair[1].pressure_alt_ft, pair[1].oat_c, pair[1].mass_kg
                ));
            }
        }
    }
    None
}

fn outside(v: f64, (lo, hi): (f64, f64)) -> bool {
    v < lo || v > hi
}

/// Distinct plausibility issues paired with their quality factor.
fn range_issues(dataset: &AbacDataset) -> Vec<(String, f64)> {
    let is_distance = dataset.purpose().is_distance();
    let mut issues: Vec<(String, f64)> = Vec::new();
    let mut push = |msg: String, factor: f64| {
        if !issues.iter().any(|(m, _)| *m == msg) {
            issues.push((msg, factor));
        }
    };

    for p in &dataset.grid.values {
        if outside(p.pressure_alt_ft, ALTITUDE_RANGE_FT) {
            push(
                format!("altitude out of range: {} ft", p.pressure_alt_ft),
                CONDITION_RANGE_FACTOR,
            );
        }
        if outside(p.oat_c, OAT_RANGE_C) {
            push(
                format!("temperature out of range: {} C", p.oat_c),
                CONDITION_RANGE_FACTOR,
            );
        }
        if outside(p.mass_kg, MASS_RANGE_KG) {
            push(
                format!("mass out of range: {} kg", p.mass_kg),
                CONDITION_RANGE_FACTOR,
            );
        }
        if is_distance && outside(p.value, DISTANCE_RANGE_M) {
            push(
                format!("suspicious distance: {} m", p.value),
                DISTANCE_RANGE_FACTOR,
            );
        }
    }
    issues
}
