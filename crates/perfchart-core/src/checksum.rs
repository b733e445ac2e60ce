//! Save-confirmation checksum.
//!
//! A 32-bit polynomial rolling hash (`h = h * 31 + c`) over the UTF-16 code
//! units of a value's JSON text, rendered as lowercase hex of its absolute
//! value. An equality tag for saves only; not a security primitive. Artifact
//! integrity uses SHA-256 (see [`crate::artifact`]).

use serde::Serialize;

use crate::domain::error::Result;

/// Rolling hash of `text`.
pub fn rolling_hash(text: &str) -> String {
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    format!("{:x}", i64::from(hash).abs())
}

/// Rolling hash of the compact JSON serialization of `value`.
pub fn checksum_of<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(rolling_hash(&serde_json::to_string(value)?))
}
