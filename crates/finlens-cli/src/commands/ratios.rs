use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finlens_core::peers::peer_snapshot;
use finlens_core::ratios::{derive_ratios_with, sort_history, DerivedRecord, PeriodRecord};
use finlens_core::AnalysisConfig;

use crate::input;

/// Arguments for ratio derivation
#[derive(Args)]
pub struct DeriveArgs {
    /// Path to a JSON/YAML array of period records
    #[arg(long)]
    pub input: Option<String>,

    /// Tax rate for ROIC (overrides --config)
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Days per period for DSO / DIO / DPO (overrides --config)
    #[arg(long)]
    pub days_per_period: Option<Decimal>,
}

/// Arguments for peer aggregation
#[derive(Args)]
pub struct PeersArgs {
    /// Path to a JSON/YAML array of derived records (null for a missing peer)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_derive(
    args: DeriveArgs,
    mut config: AnalysisConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let records: Vec<PeriodRecord> = input::require(args.input.as_deref(), "A period history")?;

    if let Some(t) = args.tax_rate {
        config.derivation.tax_rate = t;
    }
    if let Some(d) = args.days_per_period {
        config.derivation.days_per_period = d;
    }
    config.derivation.validate()?;

    let history = sort_history(records)?;
    let derived = derive_ratios_with(&history, &config.derivation);
    Ok(serde_json::to_value(derived)?)
}

pub fn run_peers(args: PeersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let peers: Vec<Option<DerivedRecord>> =
        input::require(args.input.as_deref(), "A peer record list")?;
    Ok(serde_json::to_value(peer_snapshot(&peers))?)
}
