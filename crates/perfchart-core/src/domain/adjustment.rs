//! Corrective adjustments proposed from failed validation runs.

use serde::{Deserialize, Serialize};

use super::dataset::AxisName;

/// A correction to apply to every sample of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdjustmentProposal {
    /// Add `delta` to every output value.
    ShiftOutput { delta: f64, confidence: f64 },
    /// Multiply every output value by `factor`.
    ScaleOutput { factor: f64, confidence: f64 },
    /// Add `delta` to every sample's coordinate on `axis`.
    ShiftAxis {
        axis: AxisName,
        delta: f64,
        confidence: f64,
    },
}

impl AdjustmentProposal {
    pub fn confidence(&self) -> f64 {
        match *self {
            Self::ShiftOutput { confidence, .. }
            | Self::ScaleOutput { confidence, .. }
            | Self::ShiftAxis { confidence, .. } => confidence,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShiftOutput { .. } => "shift_output",
            Self::ScaleOutput { .. } => "scale_output",
            Self::ShiftAxis { .. } => "shift_axis",
        }
    }
}
