#![forbid(unsafe_code)]

//! Generic governed-record orchestration. Each record type plugs in a
//! `RecordPolicy` (record/index types, index ordering, monotonicity, event
//! name) and each create request a `GovernedCreate` (keys, index slot,
//! record construction). All reads of an operation happen before its first
//! write.

use std::cmp::Ordering;

use chrono::SecondsFormat;
use govrec_kernel_contracts::{
    compare_versions, ContractViolation, IndexOrder, RecordIndex, Validate,
};
use govrec_storage::{read_json, write_json, LedgerStub};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::authz::{AccessDecision, Operation};
use crate::config::GovernanceConfig;
use crate::error::EngineError;

pub trait RecordPolicy {
    type Record: Serialize + DeserializeOwned + Clone;
    type Index: RecordIndex;

    const KIND: &'static str;
    const INDEX_ORDER: IndexOrder;
    /// When set, a new index member must sort strictly after the current
    /// latest member.
    const MONOTONIC: bool;
    const CREATED_EVENT: &'static str;
}

/// Caller identity and server time resolved once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStamp {
    pub org_id: String,
    pub principal_id: String,
    pub timestamp: String,
}

impl RecordStamp {
    pub fn resolve<S: LedgerStub>(stub: &S) -> Self {
        Self {
            org_id: stub.caller_org_identity().to_string(),
            principal_id: stub.caller_principal_identity().to_string(),
            timestamp: stub
                .tx_timestamp()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSlot {
    pub key: String,
    pub owner: String,
    pub member: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateWrite {
    pub collection: &'static str,
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Draft<R> {
    pub record: R,
    pub private_writes: Vec<PrivateWrite>,
}

pub trait GovernedCreate {
    type Policy: RecordPolicy;

    const OPERATION: Operation;

    fn primary_key(&self) -> String;
    fn index_slot(&self, stamp: &RecordStamp) -> IndexSlot;
    fn into_draft(
        self,
        stamp: &RecordStamp,
    ) -> Result<Draft<<Self::Policy as RecordPolicy>::Record>, EngineError>;
}

#[derive(Debug, Clone)]
pub struct GovernedRecordEngine {
    config: GovernanceConfig,
}

impl GovernedRecordEngine {
    pub fn new(config: GovernanceConfig) -> Result<Self, ContractViolation> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub(crate) fn authorize(
        &self,
        operation: Operation,
        caller_org: &str,
    ) -> Result<(), EngineError> {
        match self.config.authorize(operation, caller_org) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny { reason } => {
                warn!(%operation, caller_org, %reason, "caller denied");
                Err(EngineError::UnauthorizedCaller {
                    operation,
                    identity: caller_org.to_string(),
                })
            }
        }
    }

    /// Absent -> Created.
    pub fn create<S, C>(
        &self,
        stub: &mut S,
        request: C,
    ) -> Result<<C::Policy as RecordPolicy>::Record, EngineError>
    where
        S: LedgerStub,
        C: GovernedCreate,
    {
        let stamp = RecordStamp::resolve(stub);
        let operation = C::OPERATION;
        debug!(%operation, caller_org = %stamp.org_id, "governed create");
        self.authorize(operation, &stamp.org_id)?;

        let primary_key = request.primary_key();
        if stub.get_state(&primary_key)?.is_some() {
            return Err(EngineError::AlreadyExists { key: primary_key });
        }

        let slot = request.index_slot(&stamp);
        let mut index = load_index::<S, <C::Policy as RecordPolicy>::Index>(stub, &slot)?;
        if <C::Policy as RecordPolicy>::MONOTONIC {
            if let Some(latest) = index.latest() {
                if compare_versions(&slot.member, latest) != Ordering::Greater {
                    return Err(EngineError::VersionNotMonotonic {
                        attempted: slot.member.clone(),
                        latest: latest.to_string(),
                    });
                }
            }
        }

        let kind = <C::Policy as RecordPolicy>::KIND;
        let event = <C::Policy as RecordPolicy>::CREATED_EVENT;
        let draft = request.into_draft(&stamp)?;
        let record_bytes = write_json(&draft.record, &primary_key)?;
        stub.put_state(&primary_key, record_bytes.clone())?;
        if index.insert_member(&slot.member, <C::Policy as RecordPolicy>::INDEX_ORDER) {
            stub.put_state(&slot.key, write_json(&index, &slot.key)?)?;
        }
        for write in draft.private_writes {
            stub.put_private_data(write.collection, &write.key, write.value)?;
        }
        stub.set_event(event, record_bytes);

        info!(kind, key = %primary_key, event, "record created");
        Ok(draft.record)
    }

    /// Created -> Updated. `mutate` sees the stored record after the caller
    /// has been authorized and may refuse the transition.
    pub fn update<P, S, F>(
        &self,
        stub: &mut S,
        operation: Operation,
        key: &str,
        event: &'static str,
        mutate: F,
    ) -> Result<P::Record, EngineError>
    where
        P: RecordPolicy,
        S: LedgerStub,
        F: FnOnce(&mut P::Record, &RecordStamp) -> Result<(), EngineError>,
    {
        let stamp = RecordStamp::resolve(stub);
        debug!(%operation, caller_org = %stamp.org_id, key, "governed update");

        let mut record: P::Record = read_json(stub.get_state(key)?, key)?.ok_or_else(|| {
            EngineError::NotFound {
                key: key.to_string(),
            }
        })?;
        self.authorize(operation, &stamp.org_id)?;
        mutate(&mut record, &stamp)?;

        let bytes = write_json(&record, key)?;
        stub.put_state(key, bytes.clone())?;
        stub.set_event(event, bytes);

        info!(kind = P::KIND, key, event, "record updated");
        Ok(record)
    }

    pub fn get<P, S>(
        &self,
        stub: &mut S,
        operation: Operation,
        key: &str,
    ) -> Result<P::Record, EngineError>
    where
        P: RecordPolicy,
        S: LedgerStub,
    {
        self.authorize(operation, stub.caller_org_identity())?;
        read_json(stub.get_state(key)?, key)?.ok_or_else(|| EngineError::NotFound {
            key: key.to_string(),
        })
    }

    pub fn get_private<T, S>(
        &self,
        stub: &mut S,
        operation: Operation,
        collection: &'static str,
        key: &str,
    ) -> Result<T, EngineError>
    where
        T: DeserializeOwned,
        S: LedgerStub,
    {
        self.authorize(operation, stub.caller_org_identity())?;
        let described = format!("{collection}/{key}");
        read_json(stub.get_private_data(collection, key)?, &described)?
            .ok_or(EngineError::NotFound { key: described })
    }

    /// Index members in stored order; an absent index is an empty list.
    pub fn index_members<P, S>(
        &self,
        stub: &mut S,
        operation: Operation,
        index_key: &str,
    ) -> Result<Vec<String>, EngineError>
    where
        P: RecordPolicy,
        S: LedgerStub,
    {
        self.authorize(operation, stub.caller_org_identity())?;
        let index: Option<P::Index> = read_json(stub.get_state(index_key)?, index_key)?;
        Ok(index.map(|i| i.members().to_vec()).unwrap_or_default())
    }

    /// Loads every record the index points at, skipping members whose
    /// primary record is missing.
    pub fn list<P, S, K>(
        &self,
        stub: &mut S,
        operation: Operation,
        index_key: &str,
        record_key: K,
    ) -> Result<Vec<P::Record>, EngineError>
    where
        P: RecordPolicy,
        S: LedgerStub,
        K: Fn(&str) -> String,
    {
        let members = self.index_members::<P, S>(stub, operation, index_key)?;
        let mut records = Vec::with_capacity(members.len());
        for member in members {
            let key = record_key(&member);
            match read_json::<P::Record>(stub.get_state(&key)?, &key)? {
                Some(record) => records.push(record),
                None => warn!(index_key, member = %member, "skipping dangling index member"),
            }
        }
        Ok(records)
    }
}

fn load_index<S: LedgerStub, I: RecordIndex>(
    stub: &mut S,
    slot: &IndexSlot,
) -> Result<I, EngineError> {
    let stored: Option<I> = read_json(stub.get_state(&slot.key)?, &slot.key)?;
    Ok(stored.unwrap_or_else(|| I::empty(&slot.owner)))
}
