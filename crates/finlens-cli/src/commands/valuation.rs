use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finlens_core::ratios::{derive_ratios_with, sort_history, PeriodRecord};
use finlens_core::valuation::{financial_health_score, valuate, ValuationRequest};
use finlens_core::AnalysisConfig;

use crate::input;

/// Arguments for the DCF valuation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ValuateArgs {
    /// Path to JSON/YAML input: {"history": [...], "period": "...", "assumptions": {...}}
    #[arg(long)]
    pub input: Option<String>,

    /// Period to value from (default: latest)
    #[arg(long)]
    pub period: Option<String>,

    /// Shares outstanding override
    #[arg(long)]
    pub shares: Option<Decimal>,

    /// Base revenue override
    #[arg(long)]
    pub base_revenue: Option<Decimal>,

    /// Terminal growth rate
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Ignore the OCF/CapEx cash-flow path
    #[arg(long)]
    pub nopat_only: bool,
}

/// Arguments for the financial-health score
#[derive(Args)]
pub struct HealthArgs {
    /// Path to a JSON/YAML array of period records
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_valuate(args: ValuateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: ValuationRequest =
        input::require(args.input.as_deref(), "A valuation request")?;

    if args.period.is_some() {
        request.period = args.period;
    }
    let a = &mut request.assumptions;
    if let Some(s) = args.shares {
        a.shares_outstanding = Some(s);
    }
    if let Some(r) = args.base_revenue {
        a.base_revenue = Some(r);
    }
    if let Some(g) = args.terminal_growth {
        a.terminal_growth = g;
    }
    if args.nopat_only {
        a.use_ocf_capex = false;
    }

    let result = valuate(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_health(
    args: HealthArgs,
    config: AnalysisConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let records: Vec<PeriodRecord> = input::require(args.input.as_deref(), "A period history")?;
    let history = sort_history(records)?;
    let derived = derive_ratios_with(&history, &config.derivation);
    Ok(serde_json::to_value(financial_health_score(&derived))?)
}
