use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use finlens_core::analysis::{analyze_entity, AnalysisInput};
use finlens_core::insights::{evaluate_signals, synthesize};
use finlens_core::peers::peer_snapshot;
use finlens_core::ratios::DerivedRecord;
use finlens_core::AnalysisConfig;

use crate::input;

/// Arguments for signal evaluation
#[derive(Args)]
pub struct SignalsArgs {
    /// Path to JSON/YAML input: {"record": {...}, "peers": [...]}
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the full entity analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON/YAML input: {"history": [...], "peers": [[...]], "market": {...}}
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct SignalsInput {
    record: DerivedRecord,
    #[serde(default)]
    peers: Vec<Option<DerivedRecord>>,
}

#[derive(Serialize)]
struct SignalsOutput {
    peer_count: usize,
    insight: finlens_core::insights::InsightResult,
}

pub fn run_signals(args: SignalsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: SignalsInput = input::require(args.input.as_deref(), "A record with peers")?;
    let peers = peer_snapshot(&data.peers);
    let insight = synthesize(evaluate_signals(&data.record, &peers));
    Ok(serde_json::to_value(SignalsOutput {
        peer_count: peers.count,
        insight,
    })?)
}

pub fn run_analyze(
    args: AnalyzeArgs,
    config: AnalysisConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data: AnalysisInput = input::require(args.input.as_deref(), "An entity history")?;
    let result = analyze_entity(&data, &config)?;
    Ok(serde_json::to_value(result)?)
}
