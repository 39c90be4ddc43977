#![forbid(unsafe_code)]

use std::fmt;

use crate::config::GovernanceConfig;

/// Externally invocable operations, named as their entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LogContribution,
    GetContribution,
    ListContributions,
    GetRoundSummary,
    RegisterModel,
    ApproveModel,
    GetModel,
    ListModels,
    AnchorSar,
    AcknowledgeSar,
    GetSarHash,
    GetSarMetadata,
    ListSars,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::LogContribution => "logContribution",
            Operation::GetContribution => "getContribution",
            Operation::ListContributions => "listContributions",
            Operation::GetRoundSummary => "getRoundSummary",
            Operation::RegisterModel => "registerModel",
            Operation::ApproveModel => "approveModel",
            Operation::GetModel => "getModel",
            Operation::ListModels => "listModels",
            Operation::AnchorSar => "anchorSar",
            Operation::AcknowledgeSar => "acknowledgeSar",
            Operation::GetSarHash => "getSarHash",
            Operation::GetSarMetadata => "getSarMetadata",
            Operation::ListSars => "listSars",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny { reason: &'static str },
}

impl GovernanceConfig {
    /// Role predicate for `operation`. Contribution and registration
    /// endorsement is enforced by the ledger platform, not here.
    pub fn authorize(&self, operation: Operation, caller_org: &str) -> AccessDecision {
        let allowed = match operation {
            Operation::LogContribution
            | Operation::GetContribution
            | Operation::ListContributions
            | Operation::GetRoundSummary
            | Operation::RegisterModel
            | Operation::GetModel
            | Operation::ListModels
            | Operation::ListSars => true,
            Operation::ApproveModel => self.is_approver(caller_org),
            Operation::AnchorSar | Operation::GetSarHash => self.is_submitter(caller_org),
            Operation::AcknowledgeSar => self.is_auditor(caller_org),
            Operation::GetSarMetadata => {
                self.is_submitter(caller_org) || self.is_auditor(caller_org)
            }
        };
        if allowed {
            return AccessDecision::Allow;
        }
        AccessDecision::Deny {
            reason: match operation {
                Operation::ApproveModel => "only authorized approver orgs may approve models",
                Operation::AnchorSar => "only authorized submitter orgs may anchor SARs",
                Operation::GetSarHash => "only authorized submitter orgs may read SAR hashes",
                Operation::AcknowledgeSar => "only the auditor org may acknowledge SARs",
                _ => "only submitter orgs or the auditor org may read SAR metadata",
            },
        }
    }
}
