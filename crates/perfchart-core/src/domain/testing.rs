//! Test cases and validation results.

use serde::{Deserialize, Serialize};

use super::dataset::{QueryPoint, Tolerance};

/// A single expected-value check against a dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub inputs: QueryPoint,
    pub expected: f64,
    pub tol_abs: f64,
    pub tol_pct: f64,
}

impl TestCase {
    pub fn new(name: impl Into<String>, inputs: QueryPoint, expected: f64, tol: Tolerance) -> Self {
        Self {
            name: name.into(),
            inputs,
            expected,
            tol_abs: tol.absolute,
            tol_pct: tol.relative_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pass,
    Fail,
}

/// Outcome of one test case.
///
/// `pred` is absent when the engine refused to evaluate the inputs (for
/// example an out-of-domain query under the `forbid` policy); `pct_err` is
/// absent when the expected value is zero and the error is not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseOutcome {
    pub case: String,
    pub ok: bool,
    #[serde(default)]
    pub pred: Option<f64>,
    pub exp: f64,
    #[serde(default)]
    pub abs_err: Option<f64>,
    #[serde(default)]
    pub pct_err: Option<f64>,
    #[serde(default)]
    pub inputs: QueryPoint,
    #[serde(default)]
    pub extrapolated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseOutcome {
    /// Absolute error, recomputed from `pred`/`exp` when not reported.
    pub fn absolute_error(&self) -> Option<f64> {
        self.abs_err
            .or_else(|| self.pred.map(|pred| (pred - self.exp).abs()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    /// Sum of absolute errors over evaluated cases.
    pub total_error: f64,
    pub max_error: f64,
    /// `passed / total`, `1.0` for an empty batch.
    pub success_rate: f64,
}

impl TestSummary {
    /// Aggregate per-case outcomes.
    pub fn from_details(details: &[CaseOutcome]) -> Self {
        let mut summary = Self::default();
        for d in details {
            if d.ok {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            if let Some(err) = d.absolute_error() {
                summary.total_error += err;
                summary.max_error = summary.max_error.max(err);
            }
        }
        summary.success_rate = if details.is_empty() {
            1.0
        } else {
            summary.passed as f64 / details.len() as f64
        };
        summary
    }
}

/// Dataset-level result of a validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub id: String,
    pub status: TestStatus,
    #[serde(default)]
    pub details: Vec<CaseOutcome>,
    #[serde(default)]
    pub summary: TestSummary,
}

impl TestResult {
    /// Build a result whose status and summary derive from `details`.
    pub fn from_details(id: impl Into<String>, details: Vec<CaseOutcome>) -> Self {
        let summary = TestSummary::from_details(&details);
        let status = if summary.failed == 0 {
            TestStatus::Pass
        } else {
            TestStatus::Fail
        };
        Self {
            id: id.into(),
            status,
            details,
            summary,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == TestStatus::Pass
    }

    pub fn failed_cases(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.details.iter().filter(|d| !d.ok)
    }
}
