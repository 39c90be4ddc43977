#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::ledger::{CallerIdentity, LedgerEvent, LedgerStub, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum StateKey {
    Public(String),
    Private { collection: String, key: String },
}

impl StateKey {
    fn describe(&self) -> String {
        match self {
            StateKey::Public(key) => key.clone(),
            StateKey::Private { collection, key } => format!("{collection}/{key}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VersionedValue {
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEvent {
    pub tx_seq: u64,
    pub name: String,
    pub payload: Vec<u8>,
}

/// In-memory ledger world state: public keys, named private collections and
/// the committed event stream. Every committed write stamps the key with the
/// committing transaction's sequence number, which is what read sets are
/// validated against.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorldState {
    entries: BTreeMap<StateKey, VersionedValue>,
    events: Vec<CommittedEvent>,
    committed_tx_count: u64,
}

impl InMemoryWorldState {
    pub fn new_in_memory() -> Self {
        Self::default()
    }

    /// Opens a simulation against the current committed state. Nothing it
    /// writes is visible to anyone else until `commit`.
    pub fn simulate(&self, caller: CallerIdentity, timestamp: DateTime<Utc>) -> TxSimulator<'_> {
        TxSimulator {
            world: self,
            caller,
            timestamp,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
            event: None,
        }
    }

    /// Validates the read set and applies the write set atomically. On a
    /// conflict nothing is applied.
    pub fn commit(&mut self, rwset: ReadWriteSet) -> Result<u64, StorageError> {
        for (key, read_version) in &rwset.reads {
            let current = self.entries.get(key).map(|v| v.version);
            if current != *read_version {
                warn!(key = %key.describe(), "read set invalidated before commit");
                return Err(StorageError::ReadConflict {
                    key: key.describe(),
                });
            }
        }

        self.committed_tx_count = self.committed_tx_count.saturating_add(1);
        let tx_seq = self.committed_tx_count;
        let write_count = rwset.writes.len();
        let read_only = rwset.is_read_only();
        let event_name = rwset.event().map(|e| e.name.clone());
        for (key, value) in rwset.writes {
            self.entries.insert(
                key,
                VersionedValue {
                    value,
                    version: tx_seq,
                },
            );
        }
        if let Some(event) = rwset.event {
            self.events.push(CommittedEvent {
                tx_seq,
                name: event.name,
                payload: event.payload,
            });
        }
        debug!(tx_seq, write_count, read_only, event = ?event_name, "committed transaction");
        Ok(tx_seq)
    }

    /// Runs `f` as one transaction: commits its writes if it returns `Ok`,
    /// discards them otherwise.
    pub fn invoke<T, E, F>(
        &mut self,
        caller: CallerIdentity,
        timestamp: DateTime<Utc>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&mut TxSimulator<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let (out, rwset) = {
            let mut sim = self.simulate(caller, timestamp);
            let out = f(&mut sim)?;
            (out, sim.into_rwset())
        };
        self.commit(rwset)?;
        Ok(out)
    }

    pub fn state(&self, key: &str) -> Option<&[u8]> {
        self.entries
            .get(&StateKey::Public(key.to_string()))
            .map(|v| v.value.as_slice())
    }

    pub fn private_state(&self, collection: &str, key: &str) -> Option<&[u8]> {
        self.entries
            .get(&StateKey::Private {
                collection: collection.to_string(),
                key: key.to_string(),
            })
            .map(|v| v.value.as_slice())
    }

    /// Writes a public key outside any transaction. Intended for seeding
    /// pre-existing data.
    pub fn import_state(&mut self, key: &str, value: Vec<u8>) {
        self.committed_tx_count = self.committed_tx_count.saturating_add(1);
        self.entries.insert(
            StateKey::Public(key.to_string()),
            VersionedValue {
                value,
                version: self.committed_tx_count,
            },
        );
    }

    pub fn events(&self) -> &[CommittedEvent] {
        &self.events
    }

    pub fn committed_tx_count(&self) -> u64 {
        self.committed_tx_count
    }
}

/// Read/write set produced by one simulated transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteSet {
    reads: BTreeMap<StateKey, Option<u64>>,
    writes: BTreeMap<StateKey, Vec<u8>>,
    event: Option<LedgerEvent>,
}

impl ReadWriteSet {
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn event(&self) -> Option<&LedgerEvent> {
        self.event.as_ref()
    }
}

pub struct TxSimulator<'a> {
    world: &'a InMemoryWorldState,
    caller: CallerIdentity,
    timestamp: DateTime<Utc>,
    reads: BTreeMap<StateKey, Option<u64>>,
    writes: BTreeMap<StateKey, Vec<u8>>,
    event: Option<LedgerEvent>,
}

impl TxSimulator<'_> {
    pub fn into_rwset(self) -> ReadWriteSet {
        ReadWriteSet {
            reads: self.reads,
            writes: self.writes,
            event: self.event,
        }
    }

    fn read(&mut self, key: StateKey) -> Option<Vec<u8>> {
        // Own writes are visible to later reads in the same transaction.
        if let Some(pending) = self.writes.get(&key) {
            return non_empty(pending.clone());
        }
        let world = self.world;
        let committed = world.entries.get(&key);
        self.reads
            .entry(key)
            .or_insert_with(|| committed.map(|v| v.version));
        committed.and_then(|v| non_empty(v.value.clone()))
    }
}

fn non_empty(bytes: Vec<u8>) -> Option<Vec<u8>> {
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

impl LedgerStub for TxSimulator<'_> {
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.read(StateKey::Public(key.to_string())))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.writes.insert(StateKey::Public(key.to_string()), value);
        Ok(())
    }

    fn get_private_data(
        &mut self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.read(StateKey::Private {
            collection: collection.to_string(),
            key: key.to_string(),
        }))
    }

    fn put_private_data(
        &mut self,
        collection: &str,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), StorageError> {
        self.writes.insert(
            StateKey::Private {
                collection: collection.to_string(),
                key: key.to_string(),
            },
            value,
        );
        Ok(())
    }

    fn caller_org_identity(&self) -> &str {
        &self.caller.org_id
    }

    fn caller_principal_identity(&self) -> &str {
        &self.caller.principal_id
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) {
        self.event = Some(LedgerEvent {
            name: name.to_string(),
            payload,
        });
    }
}
