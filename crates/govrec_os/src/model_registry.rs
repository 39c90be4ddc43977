#![forbid(unsafe_code)]

use govrec_kernel_contracts::model::{
    Approval, ApproveModelRequest, ModelId, ModelIndex, ModelKey, ModelRecord,
    RegisterModelRequest,
};
use govrec_kernel_contracts::IndexOrder;
use govrec_storage::keys::{model_index_key, model_key};
use govrec_storage::LedgerStub;
use tracing::{debug, info};

use crate::authz::Operation;
use crate::engine::{
    Draft, GovernedCreate, GovernedRecordEngine, IndexSlot, RecordPolicy, RecordStamp,
};
use crate::error::EngineError;

pub const MODEL_REGISTERED_EVENT: &str = "ModelRegistered";
pub const MODEL_APPROVED_EVENT: &str = "ModelApproved";

pub struct ModelPolicy;

impl RecordPolicy for ModelPolicy {
    type Record = ModelRecord;
    type Index = ModelIndex;

    const KIND: &'static str = "model";
    const INDEX_ORDER: IndexOrder = IndexOrder::Version;
    const MONOTONIC: bool = true;
    const CREATED_EVENT: &'static str = MODEL_REGISTERED_EVENT;
}

impl GovernedCreate for RegisterModelRequest {
    type Policy = ModelPolicy;

    const OPERATION: Operation = Operation::RegisterModel;

    fn primary_key(&self) -> String {
        model_key(self.model_id.as_str(), self.version.as_str())
    }

    fn index_slot(&self, _stamp: &RecordStamp) -> IndexSlot {
        IndexSlot {
            key: model_index_key(self.model_id.as_str()),
            owner: self.model_id.as_str().to_string(),
            member: self.version.as_str().to_string(),
        }
    }

    /// The registering org's signature is the first approval.
    fn into_draft(self, stamp: &RecordStamp) -> Result<Draft<ModelRecord>, EngineError> {
        let first = Approval {
            msp_id: stamp.org_id.clone(),
            signature: self.signature.clone(),
            timestamp: stamp.timestamp.clone(),
        };
        Ok(Draft {
            record: ModelRecord {
                model_id: self.model_id.as_str().to_string(),
                version: self.version.as_str().to_string(),
                hash: self.hash,
                parameters: self.parameters,
                signature: self.signature,
                submitter_msp: stamp.org_id.clone(),
                submitter_id: stamp.principal_id.clone(),
                timestamp: stamp.timestamp.clone(),
                approvals: vec![first],
            },
            private_writes: Vec::new(),
        })
    }
}

impl GovernedRecordEngine {
    pub fn register_model<S: LedgerStub>(
        &self,
        stub: &mut S,
        request: RegisterModelRequest,
    ) -> Result<ModelRecord, EngineError> {
        debug!(
            model_id = request.model_id.as_str(),
            version = %request.version.parsed(),
            "registering model"
        );
        self.create(stub, request)
    }

    pub fn approve_model<S: LedgerStub>(
        &self,
        stub: &mut S,
        request: ApproveModelRequest,
    ) -> Result<ModelRecord, EngineError> {
        let key = model_key(request.model_id.as_str(), request.version.as_str());
        let signature = request.signature;
        let record = self.update::<ModelPolicy, S, _>(
            stub,
            Operation::ApproveModel,
            &key,
            MODEL_APPROVED_EVENT,
            |record, stamp| {
                if record.has_approval_from(&stamp.org_id) {
                    return Err(EngineError::DuplicateApproval {
                        identity: stamp.org_id.clone(),
                    });
                }
                record.approvals.push(Approval {
                    msp_id: stamp.org_id.clone(),
                    signature,
                    timestamp: stamp.timestamp.clone(),
                });
                Ok(())
            },
        )?;

        let config = self.config();
        if record.approval_quorum_met(&config.approver_orgs, config.approval_quorum) {
            info!(
                key = %key,
                approvals = record.approvals.len(),
                "model approval quorum reached"
            );
        }
        Ok(record)
    }

    pub fn get_model<S: LedgerStub>(
        &self,
        stub: &mut S,
        key: &ModelKey,
    ) -> Result<ModelRecord, EngineError> {
        self.get::<ModelPolicy, S>(
            stub,
            Operation::GetModel,
            &model_key(key.model_id.as_str(), key.version.as_str()),
        )
    }

    /// Registered versions of `model_id`, ascending.
    pub fn list_models<S: LedgerStub>(
        &self,
        stub: &mut S,
        model_id: &ModelId,
    ) -> Result<Vec<String>, EngineError> {
        self.index_members::<ModelPolicy, S>(
            stub,
            Operation::ListModels,
            &model_index_key(model_id.as_str()),
        )
    }

    pub fn list_model_records<S: LedgerStub>(
        &self,
        stub: &mut S,
        model_id: &ModelId,
    ) -> Result<Vec<ModelRecord>, EngineError> {
        self.list::<ModelPolicy, S, _>(
            stub,
            Operation::ListModels,
            &model_index_key(model_id.as_str()),
            |version| model_key(model_id.as_str(), version),
        )
    }
}
