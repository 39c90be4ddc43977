#![forbid(unsafe_code)]

use govrec_kernel_contracts::contribution::{ContributionKey, LogContributionRequest, RoundId};
use govrec_kernel_contracts::model::{ApproveModelRequest, ModelId, ModelKey, RegisterModelRequest};
use govrec_kernel_contracts::sar::{AcknowledgeSarRequest, AnchorSarRequest, SarId};
use govrec_storage::LedgerStub;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::engine::GovernedRecordEngine;
use crate::error::EngineError;

/// Entry point names accepted by `invoke`.
pub const FUNCTIONS: [&str; 15] = [
    "initLedger",
    "logContribution",
    "getContribution",
    "listContributions",
    "getRoundSummary",
    "registerModel",
    "approveModel",
    "getModel",
    "listModels",
    "listModelRecords",
    "anchorSar",
    "acknowledgeSar",
    "getSarHash",
    "getSarMetadata",
    "listSars",
];

/// Routes one externally invoked function with positional string arguments.
pub fn invoke<S: LedgerStub>(
    engine: &GovernedRecordEngine,
    stub: &mut S,
    function: &str,
    args: &[String],
) -> Result<Value, EngineError> {
    debug!(function, argc = args.len(), "invoke");
    let a: Vec<&str> = args.iter().map(String::as_str).collect();
    match function {
        "initLedger" => {
            arity(function, &a, 0, "0")?;
            info!(caller_org = stub.caller_org_identity(), "ledger initialized");
            Ok(Value::Null)
        }
        "logContribution" => {
            arity(function, &a, 5, "5")?;
            let req = LogContributionRequest::v1(a[0], a[1], a[2], a[3], a[4])?;
            to_json(function, &engine.log_contribution(stub, req)?)
        }
        "getContribution" => {
            arity(function, &a, 2, "2")?;
            let key = ContributionKey::v1(a[0], a[1])?;
            to_json(function, &engine.get_contribution(stub, &key)?)
        }
        "listContributions" => {
            arity(function, &a, 1, "1")?;
            let round = RoundId::new(a[0])?;
            to_json(function, &engine.list_contributions(stub, &round)?)
        }
        "getRoundSummary" => {
            arity(function, &a, 1, "1")?;
            let round = RoundId::new(a[0])?;
            to_json(function, &engine.get_round_summary(stub, &round)?)
        }
        "registerModel" => {
            arity(function, &a, 5, "5")?;
            let req = RegisterModelRequest::v1(a[0], a[1], a[2], a[3], a[4])?;
            to_json(function, &engine.register_model(stub, req)?)
        }
        "approveModel" => {
            arity(function, &a, 3, "3")?;
            let req = ApproveModelRequest::v1(a[0], a[1], a[2])?;
            to_json(function, &engine.approve_model(stub, req)?)
        }
        "getModel" => {
            arity(function, &a, 2, "2")?;
            let key = ModelKey::v1(a[0], a[1])?;
            to_json(function, &engine.get_model(stub, &key)?)
        }
        "listModels" => {
            arity(function, &a, 1, "1")?;
            let id = ModelId::new(a[0])?;
            to_json(function, &engine.list_models(stub, &id)?)
        }
        "listModelRecords" => {
            arity(function, &a, 1, "1")?;
            let id = ModelId::new(a[0])?;
            to_json(function, &engine.list_model_records(stub, &id)?)
        }
        "anchorSar" => {
            if a.len() != 3 && a.len() != 4 {
                return Err(argument_count(function, "3 or 4", a.len()));
            }
            let timestamp = a.get(3).copied().unwrap_or("");
            let req = AnchorSarRequest::v1(a[0], a[1], a[2], timestamp)?;
            to_json(function, &engine.anchor_sar(stub, req)?)
        }
        "acknowledgeSar" => {
            arity(function, &a, 3, "3")?;
            let req = AcknowledgeSarRequest::v1(a[0], a[1], a[2])?;
            to_json(function, &engine.acknowledge_sar(stub, req)?)
        }
        "getSarHash" => {
            arity(function, &a, 1, "1")?;
            let id = SarId::new(a[0])?;
            to_json(function, &engine.get_sar_hash(stub, &id)?)
        }
        "getSarMetadata" => {
            arity(function, &a, 1, "1")?;
            let id = SarId::new(a[0])?;
            to_json(function, &engine.get_sar_metadata(stub, &id)?)
        }
        "listSars" => {
            arity(function, &a, 1, "1")?;
            to_json(function, &engine.list_sars(stub, a[0])?)
        }
        _ => Err(EngineError::UnknownFunction {
            name: function.to_string(),
        }),
    }
}

fn arity(
    function: &str,
    args: &[&str],
    n: usize,
    expected: &'static str,
) -> Result<(), EngineError> {
    if args.len() != n {
        return Err(argument_count(function, expected, args.len()));
    }
    Ok(())
}

fn argument_count(function: &str, expected: &'static str, got: usize) -> EngineError {
    EngineError::ArgumentCount {
        function: function.to_string(),
        expected,
        got,
    }
}

fn to_json<T: Serialize>(function: &str, value: &T) -> Result<Value, EngineError> {
    serde_json::to_value(value).map_err(|e| EngineError::ResponseEncoding {
        function: function.to_string(),
        reason: e.to_string(),
    })
}
