//! Domain-level error taxonomy for perfchart.

use super::dataset::QueryPoint;

/// Errors produced by the interpolation engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpolationError {
    #[error("input point outside dataset domain: {inputs}")]
    OutOfDomain { inputs: QueryPoint },

    #[error("dataset grid is empty")]
    EmptyGrid,

    #[error("invalid order_of_iteration: {0}")]
    InvalidIterationOrder(String),
}

/// Errors produced by the extraction protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("ABAC {0} not found")]
    AbacNotFound(String),

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("malformed payload for {kind}: {reason}")]
    MalformedPayload { kind: String, reason: String },
}

/// Perfchart domain errors.
#[derive(Debug, thiserror::Error)]
pub enum PerfError {
    #[error("interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for perfchart domain operations.
pub type Result<T> = std::result::Result<T, PerfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_domain_names_the_point() {
        let err = InterpolationError::OutOfDomain {
            inputs: QueryPoint::new().with_altitude(9000.0).with_oat(42.0),
        };
        let msg = err.to_string();
        assert!(msg.contains("outside dataset domain"));
        assert!(msg.contains("pressure_alt_ft=9000"));
        assert!(msg.contains("oat_c=42"));
    }

    #[test]
    fn test_abac_not_found_names_the_id() {
        let err = ProtocolError::AbacNotFound("abac_tas_1".to_string());
        assert_eq!(err.to_string(), "ABAC abac_tas_1 not found");
    }

    #[test]
    fn test_digest_mismatch_error() {
        let err = PerfError::DigestMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
    }

    #[test]
    fn test_interpolation_error_converts() {
        let err: PerfError = InterpolationError::EmptyGrid.into();
        assert!(err.to_string().contains("interpolation error"));
    }
}
