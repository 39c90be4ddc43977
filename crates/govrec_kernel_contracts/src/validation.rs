#![forbid(unsafe_code)]

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::ContractViolation;

pub const RECORD_ID_MIN_LEN: usize = 3;
pub const RECORD_ID_MAX_LEN: usize = 64;
pub const SHA256_HEX_LEN: usize = 64;

/// Round, model and SAR identifiers: 3..=64 chars of `[A-Za-z0-9_-]`.
pub fn validate_record_id(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    if value.len() < RECORD_ID_MIN_LEN || value.len() > RECORD_ID_MAX_LEN {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be 3..=64 characters",
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must contain only ASCII alphanumerics, '-' or '_'",
        });
    }
    Ok(())
}

pub fn validate_principal_id(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    if value.is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be non-empty",
        });
    }
    Ok(())
}

pub fn validate_sha256(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    if value.len() != SHA256_HEX_LEN || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be a 64-char hex value",
        });
    }
    Ok(())
}

/// Signatures are opaque; only the base64 alphabet is enforced.
pub fn validate_signature(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    if value.is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be non-empty",
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
    {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must use the base64 alphabet",
        });
    }
    Ok(())
}

pub fn parse_non_negative_number(field: &'static str, raw: &str) -> Result<f64, ContractViolation> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ContractViolation::InvalidValue {
            field,
            reason: "must be a number",
        })?;
    if !parsed.is_finite() {
        return Err(ContractViolation::NotFinite { field });
    }
    if parsed < 0.0 {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be non-negative",
        });
    }
    // Normalizes -0.0.
    Ok(parsed + 0.0)
}

/// Parses `raw` as a JSON object. A parse failure is `MalformedPayload`; a
/// well-formed non-object (or an empty object when `require_entries`) is
/// `InvalidValue`.
pub fn parse_json_object(
    field: &'static str,
    raw: &str,
    require_entries: bool,
) -> Result<Map<String, Value>, ContractViolation> {
    let value: Value =
        serde_json::from_str(raw).map_err(|_| ContractViolation::MalformedPayload { field })?;
    let Value::Object(map) = value else {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be a JSON object",
        });
    };
    if require_entries && map.is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be a non-empty object",
        });
    }
    Ok(map)
}

pub fn validate_rfc3339(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    DateTime::parse_from_rfc3339(value).map_err(|_| ContractViolation::InvalidValue {
        field,
        reason: "must be an RFC 3339 timestamp",
    })?;
    Ok(())
}
