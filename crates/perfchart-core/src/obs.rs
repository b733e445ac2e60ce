//! Structured observability hooks for the extraction protocol.
//!
//! Every helper emits one event with an `event = "..."` field so log
//! pipelines can filter on protocol milestones. Set `RUST_LOG` to adjust
//! verbosity and pass `--json` to the CLI for JSON lines.

use tracing::{debug, info, warn};

use crate::domain::dataset::QueryPoint;

/// RAII guard that enters an abac-scoped span for the duration of its work.
///
/// ```ignore
/// let _span = AbacSpan::enter("abac_landing_distance_1718000000000_0");
/// // validation events are now tagged with abac_id
/// ```
pub struct AbacSpan {
    _span: tracing::span::EnteredSpan,
}

impl AbacSpan {
    pub fn enter(abac_id: &str) -> Self {
        let span = tracing::info_span!("perfchart.abac", abac_id = %abac_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_message_received(kind: &str, phase: &str) {
    debug!(event = "protocol.message_received", kind = %kind, phase = %phase);
}

/// Unknown message types and messages arriving after an abort.
pub fn emit_message_ignored(kind: &str, reason: &str) {
    warn!(event = "protocol.message_ignored", kind = %kind, reason = %reason);
}

/// The engine answered outside the sampled domain by extrapolating.
pub fn emit_extrapolation(abac_id: &str, inputs: &QueryPoint, value: f64) {
    warn!(
        event = "interpolation.extrapolated",
        abac_id = %abac_id,
        inputs = %inputs,
        value = value,
    );
}

pub fn emit_dataset_extracted(abac_id: &str, points: usize, data_quality: f64) {
    info!(
        event = "abac.extracted",
        abac_id = %abac_id,
        points = points,
        data_quality = data_quality,
    );
}

pub fn emit_validation_completed(abac_id: &str, passed: usize, failed: usize, max_error: f64) {
    info!(
        event = "validation.completed",
        abac_id = %abac_id,
        passed = passed,
        failed = failed,
        max_error = max_error,
    );
}

pub fn emit_abac_saved(abac_id: &str, checksum: &str) {
    info!(event = "abac.saved", abac_id = %abac_id, checksum = %checksum);
}

pub fn emit_revision_proposed(abac_id: &str, adjustments: usize, failed_cases: usize) {
    info!(
        event = "abac.revision_proposed",
        abac_id = %abac_id,
        adjustments = adjustments,
        failed_cases = failed_cases,
    );
}

pub fn emit_model_compiled(functions: usize, data_gaps: usize) {
    info!(
        event = "model.compiled",
        functions = functions,
        data_gaps = data_gaps,
    );
}

pub fn emit_process_aborted(reason: &str) {
    warn!(event = "protocol.aborted", reason = %reason);
}
