//! Domain models for perfchart.
//!
//! Canonical definitions for the core entities:
//! - `AbacDataset`: one digitized performance chart with its grid
//! - `TestCase` / `TestResult`: validation inputs and outcomes
//! - `AdjustmentProposal`: corrections derived from failed validations
//! - `AbacIndex`: the inventory of charts found in a manual
//! - `CompiledModel`: the final named-function model

pub mod adjustment;
pub mod dataset;
pub mod error;
pub mod index;
pub mod model;
pub mod purpose;
pub mod testing;

pub use adjustment::AdjustmentProposal;
pub use dataset::{
    AbacDataset, AbacMeta, AxisName, AxisSpec, ConditionsDefaults, DataGap, ExtrapolationPolicy,
    Grid, GridOutput, GridPoint, InterpolationConfig, InterpolationMethod, QueryPoint, Tolerance,
    ValidationTests,
};
pub use error::{InterpolationError, PerfError, ProtocolError, Result};
pub use index::{AbacIndex, AbacIndexEntry, DocumentMeta};
pub use model::{CompiledModel, IncludedAbac, ModelFunction};
pub use purpose::{Purpose, EXPECTED_PURPOSES, UNKNOWN_FUNCTION};
pub use testing::{CaseOutcome, TestCase, TestResult, TestStatus, TestSummary};
