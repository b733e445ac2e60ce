//! Tunables of the extraction protocol.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::dataset::{ExtrapolationPolicy, InterpolationMethod, Tolerance};
use crate::domain::error::Result;

/// Defaults applied while ingesting figures and validating datasets.
///
/// Every field may be omitted from a config file; missing fields keep their
/// default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Tolerance of generated test cases.
    pub tolerance: Tolerance,
    /// Tolerance of the `revised_*` cases sent with a revision proposal.
    pub revised_tolerance: Tolerance,
    pub extrapolation_policy: ExtrapolationPolicy,
    pub method: InterpolationMethod,
    /// Confidence recorded for freshly digitized grids.
    pub reconstruction_confidence: f64,
    /// File name announced in `PERF_MODEL_SAVE_OK`.
    pub model_file: String,
    /// OAT assigned to samples of charts without a temperature axis.
    pub isa_temperature_c: f64,
    /// Mass assigned to samples whose series label carries none.
    pub default_mass_kg: f64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            revised_tolerance: Tolerance {
                absolute: 30.0,
                relative_percent: 10.0,
            },
            extrapolation_policy: ExtrapolationPolicy::Forbid,
            method: InterpolationMethod::Bilinear,
            reconstruction_confidence: 0.8,
            model_file: "perf-aircraft.json".to_string(),
            isa_temperature_c: 15.0,
            default_mass_kg: 1000.0,
        }
    }
}

impl ProtocolConfig {
    /// Load a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("perfchart.json");
        std::fs::write(&path, r#"{"method": "trilinear", "default_mass_kg": 1100}"#)
            .expect("write");

        let cfg = ProtocolConfig::from_file(&path).expect("load");
        assert_eq!(cfg.method, InterpolationMethod::Trilinear);
        assert_eq!(cfg.default_mass_kg, 1100.0);
        assert_eq!(cfg.tolerance, Tolerance::default());
        assert_eq!(cfg.revised_tolerance.absolute, 30.0);
        assert_eq!(cfg.model_file, "perf-aircraft.json");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ProtocolConfig::from_file(Path::new("/nonexistent/perfchart.json"))
            .expect_err("missing");
        assert!(matches!(err, crate::domain::PerfError::Io(_)));
    }
}
