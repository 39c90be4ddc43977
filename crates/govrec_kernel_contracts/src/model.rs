#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::index::RecordIndex;
use crate::validation::{
    parse_json_object, validate_record_id, validate_sha256, validate_signature,
};
use crate::{ContractViolation, ModelVersion, Validate};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = Self(id.into());
        id.validate()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for ModelId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_record_id("model_id", &self.0)
    }
}

/// A model version as supplied by the caller. The raw text is what gets
/// keyed and stored; the parsed triple is what gets compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    raw: String,
    parsed: ModelVersion,
}

impl VersionTag {
    pub fn new(raw: &str) -> Result<Self, ContractViolation> {
        let parsed = ModelVersion::parse("version", raw)?;
        Ok(Self {
            raw: raw.to_string(),
            parsed,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parsed(&self) -> ModelVersion {
        self.parsed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterModelRequest {
    pub model_id: ModelId,
    pub version: VersionTag,
    pub hash: String,
    pub parameters: Map<String, Value>,
    pub signature: String,
}

impl RegisterModelRequest {
    pub fn v1(
        model_id: &str,
        version: &str,
        hash: &str,
        parameters: &str,
        signature: &str,
    ) -> Result<Self, ContractViolation> {
        let model_id = ModelId::new(model_id)?;
        let version = VersionTag::new(version)?;
        validate_sha256("hash", hash)?;
        validate_signature("signature", signature)?;
        let parameters = parse_json_object("parameters", parameters, true)?;
        Ok(Self {
            model_id,
            version,
            hash: hash.to_string(),
            parameters,
            signature: signature.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveModelRequest {
    pub model_id: ModelId,
    pub version: VersionTag,
    pub signature: String,
}

impl ApproveModelRequest {
    pub fn v1(model_id: &str, version: &str, signature: &str) -> Result<Self, ContractViolation> {
        let model_id = ModelId::new(model_id)?;
        let version = VersionTag::new(version)?;
        validate_signature("signature", signature)?;
        Ok(Self {
            model_id,
            version,
            signature: signature.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelKey {
    pub model_id: ModelId,
    pub version: VersionTag,
}

impl ModelKey {
    pub fn v1(model_id: &str, version: &str) -> Result<Self, ContractViolation> {
        Ok(Self {
            model_id: ModelId::new(model_id)?,
            version: VersionTag::new(version)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub msp_id: String,
    pub signature: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub model_id: String,
    pub version: String,
    pub hash: String,
    pub parameters: Map<String, Value>,
    pub signature: String,
    #[serde(rename = "submitterMSP")]
    pub submitter_msp: String,
    pub submitter_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub approvals: Vec<Approval>,
}

impl ModelRecord {
    pub fn has_approval_from(&self, org: &str) -> bool {
        self.approvals.iter().any(|a| a.msp_id == org)
    }

    /// True once at least `quorum` distinct orgs from `approvers` have an
    /// approval on this record.
    pub fn approval_quorum_met(&self, approvers: &BTreeSet<String>, quorum: usize) -> bool {
        let approving: BTreeSet<&str> = self
            .approvals
            .iter()
            .map(|a| a.msp_id.as_str())
            .filter(|org| approvers.contains(*org))
            .collect();
        approving.len() >= quorum
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelIndex {
    pub model_id: String,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl RecordIndex for ModelIndex {
    fn empty(owner: &str) -> Self {
        Self {
            model_id: owner.to_string(),
            versions: Vec::new(),
        }
    }

    fn members(&self) -> &[String] {
        &self.versions
    }

    fn members_mut(&mut self) -> &mut Vec<String> {
        &mut self.versions
    }
}
