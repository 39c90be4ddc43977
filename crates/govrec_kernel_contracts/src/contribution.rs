#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::index::RecordIndex;
use crate::validation::{
    parse_json_object, parse_non_negative_number, validate_principal_id, validate_record_id,
    validate_sha256,
};
use crate::{ContractViolation, Validate};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundId(String);

impl RoundId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = Self(id.into());
        id.validate()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for RoundId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_record_id("round_id", &self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogContributionRequest {
    pub round_id: RoundId,
    pub contributor_id: String,
    pub update_hash: String,
    pub aggregation_proof: Map<String, Value>,
    pub privacy_budget: f64,
}

impl LogContributionRequest {
    /// Builds a request from raw invocation arguments, failing on the first
    /// invalid field.
    pub fn v1(
        round_id: &str,
        contributor_id: &str,
        update_hash: &str,
        aggregation_proof: &str,
        privacy_budget: &str,
    ) -> Result<Self, ContractViolation> {
        let round_id = RoundId::new(round_id)?;
        validate_principal_id("contributor_id", contributor_id)?;
        validate_sha256("update_hash", update_hash)?;
        let aggregation_proof = parse_json_object("aggregation_proof", aggregation_proof, false)?;
        let privacy_budget = parse_non_negative_number("privacy_budget", privacy_budget)?;
        Ok(Self {
            round_id,
            contributor_id: contributor_id.to_string(),
            update_hash: update_hash.to_string(),
            aggregation_proof,
            privacy_budget,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionKey {
    pub round_id: RoundId,
    pub contributor_id: String,
}

impl ContributionKey {
    pub fn v1(round_id: &str, contributor_id: &str) -> Result<Self, ContractViolation> {
        let round_id = RoundId::new(round_id)?;
        validate_principal_id("contributor_id", contributor_id)?;
        Ok(Self {
            round_id,
            contributor_id: contributor_id.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRecord {
    pub round_id: String,
    pub contributor_id: String,
    pub update_hash: String,
    /// Any JSON value; records written before object-only validation may
    /// hold arrays or scalars here.
    pub aggregation_proof: Value,
    #[serde(with = "crate::wire::js_number")]
    pub privacy_budget: f64,
    #[serde(rename = "submitterMSP")]
    pub submitter_msp: String,
    pub submitter_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundIndex {
    pub round_id: String,
    #[serde(default)]
    pub contributors: Vec<String>,
}

impl RecordIndex for RoundIndex {
    fn empty(owner: &str) -> Self {
        Self {
            round_id: owner.to_string(),
            contributors: Vec::new(),
        }
    }

    fn members(&self) -> &[String] {
        &self.contributors
    }

    fn members_mut(&mut self) -> &mut Vec<String> {
        &mut self.contributors
    }
}

/// Redacted per-contributor projection: no submitter identity, no proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorSummary {
    pub contributor_id: String,
    pub update_hash: String,
    #[serde(with = "crate::wire::js_number")]
    pub privacy_budget: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub round_id: String,
    pub contributor_count: usize,
    #[serde(with = "crate::wire::js_number")]
    pub total_privacy_budget: f64,
    pub contributors: Vec<ContributorSummary>,
}

impl RoundSummary {
    pub fn from_contributions(round_id: &RoundId, contributions: &[ContributionRecord]) -> Self {
        Self {
            round_id: round_id.as_str().to_string(),
            contributor_count: contributions.len(),
            total_privacy_budget: contributions.iter().map(|c| c.privacy_budget).sum(),
            contributors: contributions
                .iter()
                .map(|c| ContributorSummary {
                    contributor_id: c.contributor_id.clone(),
                    update_hash: c.update_hash.clone(),
                    privacy_budget: c.privacy_budget,
                    timestamp: c.timestamp.clone(),
                })
                .collect(),
        }
    }
}
