//! Perfchart Core Library
//!
//! Ingests digitized aircraft performance charts, evaluates them by
//! interpolation, validates them against test cases, proposes corrections
//! and compiles the validated charts into a performance model, driven by a
//! message-based extraction protocol.

pub mod analyzer;
pub mod artifact;
pub mod checksum;
pub mod classify;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod interpolation;
pub mod metrics;
pub mod obs;
pub mod protocol;
pub mod telemetry;
pub mod validation;

pub use analyzer::{analyze_errors, apply_adjustments, propose_adjustments, ErrorAnalysis};
pub use artifact::{read_model_artifact, write_model_artifact};
pub use checksum::{checksum_of, rolling_hash};
pub use classify::{is_performance_chart, KeywordPurposeClassifier, PurposeClassifier};
pub use config::ProtocolConfig;

pub use domain::{
    AbacDataset, AbacIndex, AbacIndexEntry, AdjustmentProposal, AxisName, CaseOutcome,
    CompiledModel, DocumentMeta, ExtrapolationPolicy, GridPoint, InterpolationError,
    InterpolationMethod, PerfError, ProtocolError, Purpose, QueryPoint, Result, TestCase,
    TestResult, TestStatus, TestSummary, Tolerance,
};

pub use ingest::{build_index, extract_abac_data, Figure, PageExtract};
pub use interpolation::{evaluate, interpolate, Evaluation, EvaluationMode};
pub use protocol::{
    Envelope, InboundMessage, OutboundMessage, Phase, ProtocolHandler, ProtocolState,
};
pub use validation::{
    execute_validation_tests, generate_test_cases, validate_abac_data, ValidationReport,
};

/// Version of the perfchart crates.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
