#![forbid(unsafe_code)]

use std::env;
use std::fs::File;
use std::io::{self, BufReader};

use govrec_os::{GovernanceConfig, GovernedRecordEngine};
use govrec_tools::replay::Replayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: govrec replay <script.ndjson>";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 2 || args[0] != "replay" {
        return Err(USAGE.to_string());
    }
    init_tracing();

    let config = GovernanceConfig::default_from_env()
        .map_err(|v| format!("invalid governance config: {v:?}"))?;
    let engine = GovernedRecordEngine::new(config)
        .map_err(|v| format!("invalid governance config: {v:?}"))?;
    let file = File::open(&args[1]).map_err(|e| format!("cannot open {}: {e}", args[1]))?;

    let mut replayer = Replayer::new(engine);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = replayer.run(BufReader::new(file), &mut out)?;
    info!(
        invoked = summary.invoked,
        failed = summary.failed,
        committed = replayer.world().committed_tx_count(),
        "replay finished"
    );
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}
