#![forbid(unsafe_code)]

use govrec_kernel_contracts::sar::{
    AcknowledgeSarRequest, Acknowledgement, AnchorSarRequest, SarHashRecord, SarId,
    SarMetadataRecord, SarRecord, SubmitterIndex,
};
use govrec_kernel_contracts::validation::validate_principal_id;
use govrec_kernel_contracts::IndexOrder;
use govrec_storage::keys::{
    sar_key, submitter_index_key, SAR_HASHES_COLLECTION, SAR_METADATA_COLLECTION,
};
use govrec_storage::{write_json, LedgerStub};
use serde_json::Value;

use crate::authz::Operation;
use crate::config::ReacknowledgePolicy;
use crate::engine::{
    Draft, GovernedCreate, GovernedRecordEngine, IndexSlot, PrivateWrite, RecordPolicy, RecordStamp,
};
use crate::error::EngineError;

pub const SAR_ANCHORED_EVENT: &str = "SARAnchored";
pub const SAR_ACKNOWLEDGED_EVENT: &str = "SARAcknowledged";

pub struct SarPolicy;

impl RecordPolicy for SarPolicy {
    type Record = SarRecord;
    type Index = SubmitterIndex;

    const KIND: &'static str = "sar";
    const INDEX_ORDER: IndexOrder = IndexOrder::Insertion;
    const MONOTONIC: bool = false;
    const CREATED_EVENT: &'static str = SAR_ANCHORED_EVENT;
}

impl GovernedCreate for AnchorSarRequest {
    type Policy = SarPolicy;

    const OPERATION: Operation = Operation::AnchorSar;

    fn primary_key(&self) -> String {
        sar_key(self.sar_id.as_str())
    }

    /// SARs are indexed under the submitting principal, not the org.
    fn index_slot(&self, stamp: &RecordStamp) -> IndexSlot {
        IndexSlot {
            key: submitter_index_key(&stamp.principal_id),
            owner: stamp.principal_id.clone(),
            member: self.sar_id.as_str().to_string(),
        }
    }

    fn into_draft(self, stamp: &RecordStamp) -> Result<Draft<SarRecord>, EngineError> {
        let sar_id = self.sar_id.as_str().to_string();
        let timestamp = self.timestamp.unwrap_or_else(|| stamp.timestamp.clone());

        let hash_key = format!("{SAR_HASHES_COLLECTION}/{sar_id}");
        let hash_entry = SarHashRecord {
            sar_id: sar_id.clone(),
            hash: self.hash,
            timestamp: timestamp.clone(),
        };
        let metadata_key = format!("{SAR_METADATA_COLLECTION}/{sar_id}");
        let metadata_entry = SarMetadataRecord {
            sar_id: sar_id.clone(),
            metadata: Value::Object(self.metadata),
            timestamp: timestamp.clone(),
        };
        let private_writes = vec![
            PrivateWrite {
                collection: SAR_HASHES_COLLECTION,
                key: sar_id.clone(),
                value: write_json(&hash_entry, &hash_key)?,
            },
            PrivateWrite {
                collection: SAR_METADATA_COLLECTION,
                key: sar_id.clone(),
                value: write_json(&metadata_entry, &metadata_key)?,
            },
        ];

        Ok(Draft {
            record: SarRecord {
                sar_id,
                submitter_msp: stamp.org_id.clone(),
                submitter_id: stamp.principal_id.clone(),
                timestamp,
                acknowledged: false,
                acknowledgement: None,
            },
            private_writes,
        })
    }
}

impl GovernedRecordEngine {
    pub fn anchor_sar<S: LedgerStub>(
        &self,
        stub: &mut S,
        request: AnchorSarRequest,
    ) -> Result<SarRecord, EngineError> {
        self.create(stub, request)
    }

    pub fn acknowledge_sar<S: LedgerStub>(
        &self,
        stub: &mut S,
        request: AcknowledgeSarRequest,
    ) -> Result<SarRecord, EngineError> {
        let policy = self.config().reacknowledge;
        let AcknowledgeSarRequest {
            sar_id,
            regulator_id,
            message,
        } = request;
        self.update::<SarPolicy, S, _>(
            stub,
            Operation::AcknowledgeSar,
            &sar_key(sar_id.as_str()),
            SAR_ACKNOWLEDGED_EVENT,
            |record, stamp| {
                if record.acknowledged && policy == ReacknowledgePolicy::Reject {
                    return Err(EngineError::AlreadyAcknowledged {
                        sar_id: sar_id.as_str().to_string(),
                    });
                }
                record.acknowledged = true;
                record.acknowledgement = Some(Acknowledgement {
                    regulator_id,
                    message,
                    timestamp: stamp.timestamp.clone(),
                });
                Ok(())
            },
        )
    }

    pub fn get_sar_hash<S: LedgerStub>(
        &self,
        stub: &mut S,
        sar_id: &SarId,
    ) -> Result<SarHashRecord, EngineError> {
        self.get_private(stub, Operation::GetSarHash, SAR_HASHES_COLLECTION, sar_id.as_str())
    }

    pub fn get_sar_metadata<S: LedgerStub>(
        &self,
        stub: &mut S,
        sar_id: &SarId,
    ) -> Result<SarMetadataRecord, EngineError> {
        self.get_private(stub, Operation::GetSarMetadata, SAR_METADATA_COLLECTION, sar_id.as_str())
    }

    /// SARs anchored by the principal `submitter_id`, in anchoring order.
    pub fn list_sars<S: LedgerStub>(
        &self,
        stub: &mut S,
        submitter_id: &str,
    ) -> Result<Vec<SarRecord>, EngineError> {
        validate_principal_id("submitter_id", submitter_id)?;
        self.list::<SarPolicy, S, _>(
            stub,
            Operation::ListSars,
            &submitter_index_key(submitter_id),
            sar_key,
        )
    }
}
