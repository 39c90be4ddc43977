#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::index::RecordIndex;
use crate::validation::{
    parse_json_object, validate_principal_id, validate_record_id, validate_rfc3339,
    validate_sha256,
};
use crate::{ContractViolation, Validate};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SarId(String);

impl SarId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = Self(id.into());
        id.validate()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for SarId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_record_id("sar_id", &self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSarRequest {
    pub sar_id: SarId,
    pub hash: String,
    pub metadata: Map<String, Value>,
    /// Caller-supplied RFC 3339 timestamp; `None` means use the ledger's
    /// transaction time.
    pub timestamp: Option<String>,
}

impl AnchorSarRequest {
    pub fn v1(
        sar_id: &str,
        hash: &str,
        metadata: &str,
        timestamp: &str,
    ) -> Result<Self, ContractViolation> {
        let sar_id = SarId::new(sar_id)?;
        validate_sha256("hash", hash)?;
        let metadata = parse_json_object("metadata", metadata, false)?;
        let timestamp = match timestamp.trim() {
            "" => None,
            ts => {
                validate_rfc3339("timestamp", ts)?;
                Some(ts.to_string())
            }
        };
        Ok(Self {
            sar_id,
            hash: hash.to_string(),
            metadata,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcknowledgeSarRequest {
    pub sar_id: SarId,
    pub regulator_id: String,
    pub message: String,
}

impl AcknowledgeSarRequest {
    pub fn v1(sar_id: &str, regulator_id: &str, message: &str) -> Result<Self, ContractViolation> {
        let sar_id = SarId::new(sar_id)?;
        validate_principal_id("regulator_id", regulator_id)?;
        Ok(Self {
            sar_id,
            regulator_id: regulator_id.to_string(),
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    pub regulator_id: String,
    #[serde(rename = "acknowledgement")]
    pub message: String,
    pub timestamp: String,
}

/// Public SAR anchor. Carries no hash or metadata; those live only in the
/// private collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarRecord {
    pub sar_id: String,
    #[serde(rename = "submitterMSP")]
    pub submitter_msp: String,
    pub submitter_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledgement: Option<Acknowledgement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarHashRecord {
    pub sar_id: String,
    pub hash: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarMetadataRecord {
    pub sar_id: String,
    /// Any JSON value, for the same legacy reason as contribution proofs.
    pub metadata: Value,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitterIndex {
    pub submitter_id: String,
    #[serde(default)]
    pub sar_ids: Vec<String>,
}

impl RecordIndex for SubmitterIndex {
    fn empty(owner: &str) -> Self {
        Self {
            submitter_id: owner.to_string(),
            sar_ids: Vec::new(),
        }
    }

    fn members(&self) -> &[String] {
        &self.sar_ids
    }

    fn members_mut(&mut self) -> &mut Vec<String> {
        &mut self.sar_ids
    }
}
