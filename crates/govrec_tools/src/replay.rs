#![forbid(unsafe_code)]

//! NDJSON invocation replay against a fresh in-memory ledger. Each script
//! line is one committed transaction; each produces one result line.

use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use govrec_os::{invoke, EngineError, GovernedRecordEngine};
use govrec_storage::{CallerIdentity, InMemoryWorldState};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptLine {
    pub org: String,
    pub principal: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Transaction time; wall clock when absent.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ScriptLine {
    pub fn parse(line_no: usize, raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| format!("line {line_no}: invalid script line: {e}"))
    }

    fn tx_timestamp(&self, line_no: usize) -> Result<DateTime<Utc>, String> {
        match &self.timestamp {
            None => Ok(Utc::now()),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| format!("line {line_no}: invalid timestamp '{raw}': {e}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub invoked: usize,
    pub failed: usize,
}

pub fn result_line(outcome: &Result<Value, EngineError>) -> Value {
    match outcome {
        Ok(value) => json!({ "ok": value }),
        Err(err) => json!({
            "error": { "code": err.code(), "message": err.to_string() }
        }),
    }
}

pub struct Replayer {
    engine: GovernedRecordEngine,
    world: InMemoryWorldState,
}

impl Replayer {
    pub fn new(engine: GovernedRecordEngine) -> Self {
        Self {
            engine,
            world: InMemoryWorldState::new_in_memory(),
        }
    }

    pub fn world(&self) -> &InMemoryWorldState {
        &self.world
    }

    pub fn run_line(
        &mut self,
        line_no: usize,
        line: &ScriptLine,
    ) -> Result<Result<Value, EngineError>, String> {
        let ts = line.tx_timestamp(line_no)?;
        let caller = CallerIdentity::new(line.org.as_str(), line.principal.as_str());
        let engine = &self.engine;
        debug!(line_no, function = %line.function, org = %line.org, "replaying");
        let outcome = self
            .world
            .invoke(caller, ts, |stub| invoke(engine, stub, &line.function, &line.args));
        if let Err(err) = &outcome {
            warn!(line_no, function = %line.function, code = err.code(), "invocation failed");
        }
        Ok(outcome)
    }

    /// Replays every non-blank line of `input`, writing one JSON result line
    /// per invocation to `out`. Stops at the first unreadable script line.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut W,
    ) -> Result<ReplaySummary, String> {
        let mut summary = ReplaySummary::default();
        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let raw = raw.map_err(|e| format!("line {line_no}: {e}"))?;
            if raw.trim().is_empty() {
                continue;
            }
            let line = ScriptLine::parse(line_no, &raw)?;
            let outcome = self.run_line(line_no, &line)?;
            summary.invoked += 1;
            if outcome.is_err() {
                summary.failed += 1;
            }
            writeln!(out, "{}", result_line(&outcome)).map_err(|e| e.to_string())?;
        }
        Ok(summary)
    }
}
