#![forbid(unsafe_code)]

use govrec_kernel_contracts::contribution::{
    ContributionKey, ContributionRecord, LogContributionRequest, RoundId, RoundIndex,
    RoundSummary,
};
use govrec_kernel_contracts::IndexOrder;
use govrec_storage::keys::{contribution_key, round_index_key};
use govrec_storage::LedgerStub;
use serde_json::Value;

use crate::authz::Operation;
use crate::engine::{
    Draft, GovernedCreate, GovernedRecordEngine, IndexSlot, RecordPolicy, RecordStamp,
};
use crate::error::EngineError;

pub const CONTRIBUTION_LOGGED_EVENT: &str = "ContributionLogged";

pub struct ContributionPolicy;

impl RecordPolicy for ContributionPolicy {
    type Record = ContributionRecord;
    type Index = RoundIndex;

    const KIND: &'static str = "contribution";
    const INDEX_ORDER: IndexOrder = IndexOrder::Insertion;
    const MONOTONIC: bool = false;
    const CREATED_EVENT: &'static str = CONTRIBUTION_LOGGED_EVENT;
}

impl GovernedCreate for LogContributionRequest {
    type Policy = ContributionPolicy;

    const OPERATION: Operation = Operation::LogContribution;

    fn primary_key(&self) -> String {
        contribution_key(self.round_id.as_str(), &self.contributor_id)
    }

    fn index_slot(&self, _stamp: &RecordStamp) -> IndexSlot {
        IndexSlot {
            key: round_index_key(self.round_id.as_str()),
            owner: self.round_id.as_str().to_string(),
            member: self.contributor_id.clone(),
        }
    }

    fn into_draft(self, stamp: &RecordStamp) -> Result<Draft<ContributionRecord>, EngineError> {
        Ok(Draft {
            record: ContributionRecord {
                round_id: self.round_id.as_str().to_string(),
                contributor_id: self.contributor_id,
                update_hash: self.update_hash,
                aggregation_proof: Value::Object(self.aggregation_proof),
                privacy_budget: self.privacy_budget,
                submitter_msp: stamp.org_id.clone(),
                submitter_id: stamp.principal_id.clone(),
                timestamp: stamp.timestamp.clone(),
            },
            private_writes: Vec::new(),
        })
    }
}

impl GovernedRecordEngine {
    pub fn log_contribution<S: LedgerStub>(
        &self,
        stub: &mut S,
        request: LogContributionRequest,
    ) -> Result<ContributionRecord, EngineError> {
        self.create(stub, request)
    }

    pub fn get_contribution<S: LedgerStub>(
        &self,
        stub: &mut S,
        key: &ContributionKey,
    ) -> Result<ContributionRecord, EngineError> {
        self.get::<ContributionPolicy, S>(
            stub,
            Operation::GetContribution,
            &contribution_key(key.round_id.as_str(), &key.contributor_id),
        )
    }

    pub fn list_contributions<S: LedgerStub>(
        &self,
        stub: &mut S,
        round_id: &RoundId,
    ) -> Result<Vec<ContributionRecord>, EngineError> {
        self.list::<ContributionPolicy, S, _>(
            stub,
            Operation::ListContributions,
            &round_index_key(round_id.as_str()),
            |contributor| contribution_key(round_id.as_str(), contributor),
        )
    }

    pub fn get_round_summary<S: LedgerStub>(
        &self,
        stub: &mut S,
        round_id: &RoundId,
    ) -> Result<RoundSummary, EngineError> {
        self.authorize(Operation::GetRoundSummary, stub.caller_org_identity())?;
        let contributions = self.list_contributions(stub, round_id)?;
        Ok(RoundSummary::from_contributions(round_id, &contributions))
    }
}
