#![forbid(unsafe_code)]

use chrono::{TimeZone, Utc};
use govrec_storage::keys::{sar_key, SAR_HASHES_COLLECTION};
use govrec_storage::{CallerIdentity, InMemoryWorldState, LedgerStub, StorageError};

fn bank_a() -> CallerIdentity {
    CallerIdentity::new("BankAMSP", "Admin@banka.example.com")
}

fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 28, 12, 0, 0).unwrap()
}

#[test]
fn at_ws_db_01_commit_applies_public_private_and_event() {
    let mut ws = InMemoryWorldState::new_in_memory();
    let out = ws
        .invoke(bank_a(), ts(), |stub| -> Result<u64, StorageError> {
            stub.put_state(&sar_key("sar-1"), b"{\"sarId\":\"sar-1\"}".to_vec())?;
            stub.put_private_data(SAR_HASHES_COLLECTION, "sar-1", b"{}".to_vec())?;
            stub.set_event("SARAnchored", b"{}".to_vec());
            Ok(7)
        })
        .unwrap();
    assert_eq!(out, 7);
    assert_eq!(ws.state("SAR:sar-1"), Some(&b"{\"sarId\":\"sar-1\"}"[..]));
    assert_eq!(ws.private_state("sarHashes", "sar-1"), Some(&b"{}"[..]));
    assert!(ws.state("sar-1").is_none());
    assert_eq!(ws.events().len(), 1);
    assert_eq!(ws.events()[0].name, "SARAnchored");
    assert_eq!(ws.committed_tx_count(), 1);
}

#[test]
fn at_ws_db_02_failed_invocation_leaves_no_trace() {
    let mut ws = InMemoryWorldState::new_in_memory();
    let out: Result<(), StorageError> = ws.invoke(bank_a(), ts(), |stub| {
        stub.put_state("K", b"v".to_vec())?;
        stub.set_event("Never", Vec::new());
        Err(StorageError::CorruptRecord {
            key: "K".to_string(),
        })
    });
    assert!(out.is_err());
    assert!(ws.state("K").is_none());
    assert!(ws.events().is_empty());
    assert_eq!(ws.committed_tx_count(), 0);
}

#[test]
fn at_ws_db_03_read_your_writes_within_one_transaction() {
    let ws = InMemoryWorldState::new_in_memory();
    let mut sim = ws.simulate(bank_a(), ts());
    assert_eq!(sim.get_state("K").unwrap(), None);
    sim.put_state("K", b"v1".to_vec()).unwrap();
    assert_eq!(sim.get_state("K").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(sim.caller_org_identity(), "BankAMSP");
    assert_eq!(sim.caller_principal_identity(), "Admin@banka.example.com");
    assert_eq!(sim.tx_timestamp(), ts());
    assert!(!sim.into_rwset().is_read_only());
}

#[test]
fn at_ws_db_04_concurrent_writers_lose_on_stale_read() {
    let mut ws = InMemoryWorldState::new_in_memory();
    let (first, second) = {
        let mut a = ws.simulate(bank_a(), ts());
        let mut b = ws.simulate(CallerIdentity::new("BankBMSP", "Admin@bankb"), ts());
        assert!(a.get_state("ROUND_INDEX:r-1").unwrap().is_none());
        assert!(b.get_state("ROUND_INDEX:r-1").unwrap().is_none());
        a.put_state("ROUND_INDEX:r-1", b"a".to_vec()).unwrap();
        b.put_state("ROUND_INDEX:r-1", b"b".to_vec()).unwrap();
        (a.into_rwset(), b.into_rwset())
    };
    assert_eq!(ws.commit(first), Ok(1));
    assert_eq!(
        ws.commit(second),
        Err(StorageError::ReadConflict {
            key: "ROUND_INDEX:r-1".to_string()
        })
    );
    assert_eq!(ws.state("ROUND_INDEX:r-1"), Some(&b"a"[..]));
}

#[test]
fn at_ws_db_05_private_reads_are_validated_too() {
    let mut ws = InMemoryWorldState::new_in_memory();
    let stale = {
        let mut sim = ws.simulate(bank_a(), ts());
        assert!(sim.get_private_data("sarHashes", "sar-1").unwrap().is_none());
        sim.put_state("SAR:sar-1", b"x".to_vec()).unwrap();
        sim.into_rwset()
    };
    ws.invoke(bank_a(), ts(), |stub| -> Result<(), StorageError> {
        stub.put_private_data("sarHashes", "sar-1", b"h".to_vec())
    })
    .unwrap();
    assert_eq!(
        ws.commit(stale),
        Err(StorageError::ReadConflict {
            key: "sarHashes/sar-1".to_string()
        })
    );
}

#[test]
fn at_ws_db_06_last_event_in_a_transaction_wins() {
    let mut ws = InMemoryWorldState::new_in_memory();
    ws.invoke(bank_a(), ts(), |stub| -> Result<(), StorageError> {
        stub.set_event("First", Vec::new());
        stub.set_event("Second", Vec::new());
        Ok(())
    })
    .unwrap();
    assert_eq!(ws.events().len(), 1);
    assert_eq!(ws.events()[0].name, "Second");
}

#[test]
fn at_ws_db_07_empty_values_read_as_absent() {
    let mut ws = InMemoryWorldState::new_in_memory();
    ws.import_state("K", Vec::new());
    let mut sim = ws.simulate(bank_a(), ts());
    assert_eq!(sim.get_state("K").unwrap(), None);
}
