#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("stored value at {key} is not a valid record")]
    CorruptRecord { key: String },
    #[error("failed to encode value for {key}: {reason}")]
    Serialize { key: String, reason: String },
    #[error("read conflict on {key}: value changed before commit")]
    ReadConflict { key: String },
}

/// Authenticated caller of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    /// Organizational identity, the unit of authorization.
    pub org_id: String,
    /// Individual principal within the org; recorded for audit only.
    pub principal_id: String,
}

impl CallerIdentity {
    pub fn new(org_id: impl Into<String>, principal_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            principal_id: principal_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    pub name: String,
    pub payload: Vec<u8>,
}

/// The per-invocation view of the ledger platform. All reads and writes of
/// one operation go through a single stub and commit (or vanish) together.
pub trait LedgerStub {
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    fn get_private_data(
        &mut self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StorageError>;
    fn put_private_data(
        &mut self,
        collection: &str,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), StorageError>;

    fn caller_org_identity(&self) -> &str;
    fn caller_principal_identity(&self) -> &str;
    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Fire-and-forget notification; a later call in the same invocation
    /// replaces an earlier one.
    fn set_event(&mut self, name: &str, payload: Vec<u8>);
}

pub fn read_json<T: DeserializeOwned>(
    bytes: Option<Vec<u8>>,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match bytes {
        None => Ok(None),
        Some(b) => serde_json::from_slice(&b)
            .map(Some)
            .map_err(|_| StorageError::CorruptRecord {
                key: key.to_string(),
            }),
    }
}

pub fn write_json<T: Serialize>(value: &T, key: &str) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(value).map_err(|e| StorageError::Serialize {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
