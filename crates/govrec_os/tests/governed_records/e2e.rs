#![forbid(unsafe_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use govrec_os::{
    invoke, EngineError, GovernanceConfig, GovernedRecordEngine, Operation, ReacknowledgePolicy,
};
use govrec_storage::{CallerIdentity, InMemoryWorldState};
use proptest::prelude::*;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

const AUDITOR: &str = "RegulatorObserverMSP";

fn digest(seed: &str) -> String {
    Sha256::digest(seed.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn signature(org: &str) -> String {
    STANDARD.encode(format!("signed-by-{org}"))
}

fn principal(org: &str) -> String {
    format!("x509::CN=Admin@{}", org.to_lowercase())
}

struct Ledger {
    ws: InMemoryWorldState,
    engine: GovernedRecordEngine,
    clock: u32,
}

impl Ledger {
    fn new(config: GovernanceConfig) -> Self {
        Self {
            ws: InMemoryWorldState::new_in_memory(),
            engine: GovernedRecordEngine::new(config).unwrap(),
            clock: 0,
        }
    }

    fn mvp() -> Self {
        Self::new(GovernanceConfig::mvp_v1())
    }

    fn now(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        let base = Utc.with_ymd_and_hms(2025, 11, 28, 12, 0, 0).unwrap();
        base + chrono::Duration::seconds(i64::from(self.clock))
    }

    fn call(&mut self, org: &str, function: &str, args: &[&str]) -> Result<Value, EngineError> {
        let caller = CallerIdentity::new(org, principal(org));
        let ts = self.now();
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let engine = &self.engine;
        self.ws
            .invoke(caller, ts, |stub| invoke(engine, stub, function, &argv))
    }

    fn log(&mut self, round: &str, contributor: &str, budget: &str) -> Result<Value, EngineError> {
        let hash = digest(contributor);
        self.call(
            "BankAMSP",
            "logContribution",
            &[round, contributor, &hash, r#"{"scheme":"secagg"}"#, budget],
        )
    }

    fn register(&mut self, org: &str, model: &str, version: &str) -> Result<Value, EngineError> {
        let hash = digest(version);
        let sig = signature(org);
        self.call(
            org,
            "registerModel",
            &[model, version, &hash, r#"{"learningRate":0.01}"#, &sig],
        )
    }

    fn approve(&mut self, org: &str, model: &str, version: &str) -> Result<Value, EngineError> {
        let sig = signature(org);
        self.call(org, "approveModel", &[model, version, &sig])
    }
}

#[test]
fn at_e2e_01_contribution_uniqueness_survives_retries() {
    let mut l = Ledger::mvp();
    l.log("round-001", "bank-a", "0.5").unwrap();
    for _ in 0..3 {
        assert!(matches!(
            l.log("round-001", "bank-a", "0.5"),
            Err(EngineError::AlreadyExists { .. })
        ));
    }
    let listed = l
        .call("BankBMSP", "listContributions", &["round-001"])
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn at_e2e_02_model_versions_strictly_increase() {
    let mut l = Ledger::mvp();
    l.register("BankAMSP", "aml-model", "1.0.0").unwrap();
    assert_eq!(
        l.register("BankAMSP", "aml-model", "0.9.9").unwrap_err(),
        EngineError::VersionNotMonotonic {
            attempted: "0.9.9".to_string(),
            latest: "1.0.0".to_string()
        }
    );
    l.register("BankBMSP", "aml-model", "1.0.1").unwrap();
    assert_eq!(
        l.call("BankAMSP", "listModels", &["aml-model"]).unwrap(),
        json!(["1.0.0", "1.0.1"])
    );
}

#[test]
fn at_e2e_03_approval_quorum() {
    let mut l = Ledger::mvp();
    l.register("BankAMSP", "aml-model", "1.0.0").unwrap();
    assert_eq!(
        l.approve("BankAMSP", "aml-model", "1.0.0").unwrap_err(),
        EngineError::DuplicateApproval {
            identity: "BankAMSP".to_string()
        }
    );
    let record = l.approve("BankBMSP", "aml-model", "1.0.0").unwrap();
    let approvals = record["approvals"].as_array().unwrap();
    assert_eq!(approvals.len(), 2);
    assert_eq!(approvals[0]["mspId"], "BankAMSP");
    assert_eq!(approvals[1]["mspId"], "BankBMSP");
    assert!(approvals[0]["timestamp"].as_str() < approvals[1]["timestamp"].as_str());

    assert_eq!(
        l.approve("BankCMSP", "aml-model", "1.0.0").unwrap_err(),
        EngineError::UnauthorizedCaller {
            operation: Operation::ApproveModel,
            identity: "BankCMSP".to_string()
        }
    );
    let stored = l.call(AUDITOR, "getModel", &["aml-model", "1.0.0"]).unwrap();
    assert_eq!(stored["approvals"].as_array().unwrap().len(), 2);
}

#[test]
fn at_e2e_04_privacy_partitioning() {
    let mut l = Ledger::mvp();
    let hash = digest("sar body");
    l.call(
        "BankAMSP",
        "anchorSar",
        &["s1-2025", &hash, r#"{"typology":"structuring"}"#, "2025-11-27T09:30:00.000Z"],
    )
    .unwrap();

    let seen = l.call("BankBMSP", "getSarHash", &["s1-2025"]).unwrap();
    assert_eq!(seen["hash"], hash.as_str());
    assert!(matches!(
        l.call(AUDITOR, "getSarHash", &["s1-2025"]),
        Err(EngineError::UnauthorizedCaller { .. })
    ));
    let meta = l.call(AUDITOR, "getSarMetadata", &["s1-2025"]).unwrap();
    assert_eq!(meta["metadata"]["typology"], "structuring");

    let public = String::from_utf8(l.ws.state("SAR:s1-2025").unwrap().to_vec()).unwrap();
    assert!(!public.contains(&hash));
    assert!(!public.contains("structuring"));
}

#[test]
fn at_e2e_05_acknowledgement_overwrite_and_reject() {
    let hash = digest("sar");
    let mut overwrite = Ledger::mvp();
    overwrite
        .call("BankAMSP", "anchorSar", &["sar-001", &hash, "{}"])
        .unwrap();
    let first = overwrite
        .call(AUDITOR, "acknowledgeSar", &["sar-001", "examiner-1", "received"])
        .unwrap();
    assert_eq!(first["acknowledged"], true);
    assert_eq!(first["acknowledgement"]["acknowledgement"], "received");
    let second = overwrite
        .call(AUDITOR, "acknowledgeSar", &["sar-001", "examiner-2", "closed"])
        .unwrap();
    assert_eq!(second["acknowledgement"]["regulatorId"], "examiner-2");
    assert!(matches!(
        overwrite.call("BankAMSP", "acknowledgeSar", &["sar-001", "examiner-1", "x"]),
        Err(EngineError::UnauthorizedCaller { .. })
    ));

    let mut config = GovernanceConfig::mvp_v1();
    config.reacknowledge = ReacknowledgePolicy::Reject;
    let mut reject = Ledger::new(config);
    reject
        .call("BankAMSP", "anchorSar", &["sar-001", &hash, "{}"])
        .unwrap();
    reject
        .call(AUDITOR, "acknowledgeSar", &["sar-001", "examiner-1", "received"])
        .unwrap();
    assert_eq!(
        reject
            .call(AUDITOR, "acknowledgeSar", &["sar-001", "examiner-2", "closed"])
            .unwrap_err()
            .code(),
        "ALREADY_ACKNOWLEDGED"
    );
    assert!(matches!(
        reject.call(AUDITOR, "acknowledgeSar", &["sar-404", "examiner-1", "x"]),
        Err(EngineError::NotFound { .. })
    ));
}

#[test]
fn at_e2e_06_round_summary_aggregates() {
    let mut l = Ledger::mvp();
    l.log("round-007", "bank-a", "0.5").unwrap();
    l.log("round-007", "bank-b", "1.0").unwrap();
    l.log("round-007", "bank-c", "0.25").unwrap();
    let summary = l
        .call("BankBMSP", "getRoundSummary", &["round-007"])
        .unwrap();
    assert_eq!(summary["contributorCount"], 3);
    assert_eq!(summary["totalPrivacyBudget"], 1.75);
    let first = &summary["contributors"][0];
    assert!(first.get("submitterMSP").is_none());
    assert!(first.get("aggregationProof").is_none());
}

#[test]
fn at_e2e_07_dangling_index_members_are_skipped() {
    let mut l = Ledger::mvp();
    l.log("round-009", "bank-a", "1").unwrap();
    l.ws.import_state(
        "ROUND_INDEX:round-009",
        br#"{"roundId":"round-009","contributors":["bank-a","bank-ghost"]}"#.to_vec(),
    );
    let listed = l
        .call("BankAMSP", "listContributions", &["round-009"])
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["contributorId"], "bank-a");
}

#[test]
fn at_e2e_10_legacy_non_object_proof_does_not_break_round_reads() {
    let mut l = Ledger::mvp();
    l.log("round-010", "bank-a", "0.5").unwrap();
    let legacy = format!(
        concat!(
            r#"{{"roundId":"round-010","contributorId":"bank-b","updateHash":"{}","#,
            r#""aggregationProof":[1,2],"privacyBudget":1,"submitterMSP":"BankBMSP","#,
            r#""submitterId":"x509::CN=Admin@bankbmsp","timestamp":"2025-01-01T00:00:00.000Z"}}"#
        ),
        digest("bank-b")
    );
    l.ws
        .import_state("CONTRIBUTION:round-010:bank-b", legacy.into_bytes());
    l.ws.import_state(
        "ROUND_INDEX:round-010",
        br#"{"roundId":"round-010","contributors":["bank-a","bank-b"]}"#.to_vec(),
    );

    let listed = l
        .call("BankAMSP", "listContributions", &["round-010"])
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 2);
    assert_eq!(listed[1]["aggregationProof"], json!([1, 2]));

    let summary = l
        .call("BankBMSP", "getRoundSummary", &["round-010"])
        .unwrap();
    assert_eq!(summary["contributorCount"], 2);
    assert_eq!(summary["totalPrivacyBudget"], 1.5);
}

#[test]
fn at_e2e_11_dangling_sar_and_model_members_are_skipped() {
    let mut l = Ledger::mvp();
    let hash = digest("sar");
    l.call("BankAMSP", "anchorSar", &["sar-001", &hash, "{}"])
        .unwrap();
    let submitter = principal("BankAMSP");
    l.ws.import_state(
        &format!("SUBMITTER_INDEX:{submitter}"),
        format!(r#"{{"submitterId":"{submitter}","sarIds":["sar-ghost","sar-001"]}}"#)
            .into_bytes(),
    );
    let sars = l
        .call(AUDITOR, "listSars", &[submitter.as_str()])
        .unwrap();
    assert_eq!(sars.as_array().unwrap().len(), 1);
    assert_eq!(sars[0]["sarId"], "sar-001");

    l.register("BankAMSP", "aml-model", "1.0.0").unwrap();
    l.ws.import_state(
        "MODEL_INDEX:aml-model",
        br#"{"modelId":"aml-model","versions":["1.0.0","2.0.0"]}"#.to_vec(),
    );
    let records = l
        .call("BankBMSP", "listModelRecords", &["aml-model"])
        .unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["version"], "1.0.0");
    assert_eq!(
        l.call("BankBMSP", "listModels", &["aml-model"]).unwrap(),
        json!(["1.0.0", "2.0.0"])
    );
}

#[test]
fn at_e2e_08_failed_operations_leave_no_writes() {
    let mut l = Ledger::mvp();
    let before = l.ws.committed_tx_count();
    let hash = digest("x");
    assert!(l
        .call(AUDITOR, "anchorSar", &["sar-001", &hash, "{}"])
        .is_err());
    assert!(l.register("BankAMSP", "aml-model", "1.0").is_err());
    assert_eq!(l.ws.committed_tx_count(), before);
    assert!(l.ws.state("SAR:sar-001").is_none());
    assert!(l.ws.private_state("sarHashes", "sar-001").is_none());
    assert!(l.ws.events().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn at_e2e_09_round_index_round_trip(
        ids in proptest::collection::btree_set("[a-z]{3,8}", 1..8)
    ) {
        let mut l = Ledger::mvp();
        let mut order: Vec<String> = ids.iter().cloned().collect();
        order.reverse();
        for id in &order {
            l.log("round-prop", id, "0.1").unwrap();
        }
        let listed = l
            .call("BankAMSP", "listContributions", &["round-prop"])
            .unwrap();
        let got: Vec<(String, String)> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r["roundId"].as_str().unwrap().to_string(),
                    r["contributorId"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        let want: Vec<(String, String)> = order
            .iter()
            .map(|id| ("round-prop".to_string(), id.clone()))
            .collect();
        prop_assert_eq!(got, want);
    }
}
