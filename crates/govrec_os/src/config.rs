#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::env;

use govrec_kernel_contracts::{ContractViolation, Validate};
use serde::{Deserialize, Serialize};

pub const ENV_APPROVER_ORGS: &str = "GOVREC_APPROVER_ORGS";
pub const ENV_SUBMITTER_ORGS: &str = "GOVREC_SUBMITTER_ORGS";
pub const ENV_AUDITOR_ORG: &str = "GOVREC_AUDITOR_ORG";
pub const ENV_APPROVAL_QUORUM: &str = "GOVREC_APPROVAL_QUORUM";
pub const ENV_REACKNOWLEDGE: &str = "GOVREC_REACKNOWLEDGE";

/// What `acknowledgeSar` does with a SAR that is already acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReacknowledgePolicy {
    /// Replace the previous acknowledgement.
    #[default]
    Overwrite,
    /// Fail with `AlreadyAcknowledged`.
    Reject,
}

impl ReacknowledgePolicy {
    fn parse(raw: &str) -> Result<Self, ContractViolation> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "reject" => Ok(Self::Reject),
            _ => Err(ContractViolation::InvalidValue {
                field: "governance_config.reacknowledge",
                reason: "must be overwrite or reject",
            }),
        }
    }
}

/// Role-to-identity mapping the engine authorizes against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GovernanceConfig {
    pub approver_orgs: BTreeSet<String>,
    pub submitter_orgs: BTreeSet<String>,
    pub auditor_org: String,
    #[serde(default = "default_approval_quorum")]
    pub approval_quorum: usize,
    #[serde(default)]
    pub reacknowledge: ReacknowledgePolicy,
}

fn default_approval_quorum() -> usize {
    2
}

impl GovernanceConfig {
    pub fn mvp_v1() -> Self {
        Self {
            approver_orgs: org_set(&["BankAMSP", "BankBMSP"]),
            submitter_orgs: org_set(&["BankAMSP", "BankBMSP"]),
            auditor_org: "RegulatorObserverMSP".to_string(),
            approval_quorum: default_approval_quorum(),
            reacknowledge: ReacknowledgePolicy::Overwrite,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ContractViolation> {
        let config: Self = serde_json::from_str(raw).map_err(|_| {
            ContractViolation::MalformedPayload {
                field: "governance_config",
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Starts from `mvp_v1` and overrides whatever the lookup supplies.
    pub fn from_env_var_map<F>(lookup: F) -> Result<Self, ContractViolation>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::mvp_v1();
        if let Some(raw) = lookup(ENV_APPROVER_ORGS) {
            config.approver_orgs = parse_org_list(&raw);
        }
        if let Some(raw) = lookup(ENV_SUBMITTER_ORGS) {
            config.submitter_orgs = parse_org_list(&raw);
        }
        if let Some(raw) = lookup(ENV_AUDITOR_ORG) {
            config.auditor_org = raw.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_APPROVAL_QUORUM) {
            config.approval_quorum =
                raw.trim()
                    .parse::<usize>()
                    .map_err(|_| ContractViolation::InvalidValue {
                        field: "governance_config.approval_quorum",
                        reason: "must be an unsigned integer",
                    })?;
        }
        if let Some(raw) = lookup(ENV_REACKNOWLEDGE) {
            config.reacknowledge = ReacknowledgePolicy::parse(&raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn default_from_env() -> Result<Self, ContractViolation> {
        Self::from_env_var_map(|key| env::var(key).ok())
    }

    pub fn is_approver(&self, org: &str) -> bool {
        self.approver_orgs.contains(org)
    }

    pub fn is_submitter(&self, org: &str) -> bool {
        self.submitter_orgs.contains(org)
    }

    pub fn is_auditor(&self, org: &str) -> bool {
        self.auditor_org == org
    }
}

impl Validate for GovernanceConfig {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_org_set("governance_config.approver_orgs", &self.approver_orgs)?;
        validate_org_set("governance_config.submitter_orgs", &self.submitter_orgs)?;
        if self.auditor_org.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "governance_config.auditor_org",
                reason: "must be non-empty",
            });
        }
        if self.approval_quorum == 0 || self.approval_quorum > self.approver_orgs.len() {
            return Err(ContractViolation::InvalidValue {
                field: "governance_config.approval_quorum",
                reason: "must be within 1..=approver_orgs.len()",
            });
        }
        Ok(())
    }
}

fn org_set(orgs: &[&str]) -> BTreeSet<String> {
    orgs.iter().map(|o| o.to_string()).collect()
}

fn parse_org_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_org_set(field: &'static str, orgs: &BTreeSet<String>) -> Result<(), ContractViolation> {
    if orgs.is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must contain at least one org",
        });
    }
    if orgs.iter().any(|o| o.trim().is_empty()) {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "org identities must be non-empty",
        });
    }
    Ok(())
}
