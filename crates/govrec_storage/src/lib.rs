#![forbid(unsafe_code)]

pub mod keys;
pub mod ledger;
pub mod world_state;

pub use ledger::{read_json, write_json, CallerIdentity, LedgerEvent, LedgerStub, StorageError};
pub use world_state::{InMemoryWorldState, ReadWriteSet, TxSimulator};
