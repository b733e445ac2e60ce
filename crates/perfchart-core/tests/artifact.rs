//! Compiled model persistence with digest verification.

use perfchart_core::protocol::compile_model;
use perfchart_core::{
    read_model_artifact, write_model_artifact, AbacDataset, DocumentMeta, GridPoint, PerfError,
    Purpose,
};

fn model() -> perfchart_core::CompiledModel {
    let pts = vec![GridPoint {
        pressure_alt_ft: 0.0,
        oat_c: 15.0,
        mass_kg: 1000.0,
        headwind_kt: 0.0,
        slope_percent: 0.0,
        value: 420.0,
    }];
    let meta = DocumentMeta {
        title: Some("POH".to_string()),
        ..DocumentMeta::default()
    };
    compile_model(
        Some(&meta),
        &[AbacDataset::from_points("abac_ld", Purpose::LandingDistance, pts)],
    )
}

#[test]
fn written_model_reads_back_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let model = model();

    let path = write_model_artifact(&model, dir.path(), "perf-aircraft.json").expect("write");
    assert!(path.exists());

    let loaded = read_model_artifact(dir.path(), "perf-aircraft.json").expect("read");
    assert_eq!(loaded, model);
}

#[test]
fn tampered_model_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_model_artifact(&model(), dir.path(), "perf-aircraft.json").expect("write");

    let tampered = std::fs::read_to_string(&path)
        .expect("read model")
        .replace("abac_ld", "abac_xx");
    std::fs::write(&path, tampered).expect("tamper");

    let err = read_model_artifact(dir.path(), "perf-aircraft.json").expect_err("must fail");
    assert!(matches!(err, PerfError::DigestMismatch { .. }));
}

#[test]
fn missing_digest_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_model_artifact(&model(), dir.path(), "perf-aircraft.json").expect("write");
    std::fs::remove_file(dir.path().join("perf-aircraft.digest")).expect("remove digest");

    let err = read_model_artifact(dir.path(), "perf-aircraft.json").expect_err("must fail");
    assert!(matches!(err, PerfError::Io(_)));
}
