#![forbid(unsafe_code)]

//! Serde helpers that keep stored JSON byte-compatible with records written
//! by existing ledger peers.

/// Numbers without a fractional part are written as integers (`1`, not
/// `1.0`); everything else is written as a float.
pub mod js_number {
    use serde::{Deserialize, Deserializer, Serializer};

    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        f64::deserialize(deserializer)
    }
}
