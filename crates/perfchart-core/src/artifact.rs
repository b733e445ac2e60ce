//! Compiled model persistence.
//!
//! The model is written to `<dir>/<file>` as pretty JSON with a companion
//! `<dir>/<stem>.digest` holding the SHA-256 hex of the written bytes.
//! Reading recomputes the digest and refuses tampered files.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::domain::error::{PerfError, Result};
use crate::domain::model::CompiledModel;

/// SHA-256 hex digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn digest_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("digest")
}

/// Write `model` to `<dir>/<file>` plus its digest sidecar.
///
/// Returns the path to the model file.
pub fn write_model_artifact(model: &CompiledModel, dir: &Path, file: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let model_path = dir.join(file);

    let json = serde_json::to_vec_pretty(model)?;
    std::fs::write(&model_path, &json)?;
    std::fs::write(digest_path(&model_path), sha256_hex(&json).as_bytes())?;

    Ok(model_path)
}

/// Read and integrity-verify the model at `<dir>/<file>`.
///
/// Returns `PerfError::DigestMismatch` when the file no longer matches its
/// sidecar.
pub fn read_model_artifact(dir: &Path, file: &str) -> Result<CompiledModel> {
    let model_path = dir.join(file);
    let json = std::fs::read(&model_path)?;
    let expected = std::fs::read_to_string(digest_path(&model_path))?
        .trim()
        .to_string();

    let actual = sha256_hex(&json);
    if actual != expected {
        return Err(PerfError::DigestMismatch { expected, actual });
    }

    Ok(serde_json::from_slice(&json)?)
}
