use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use finlens_core::anomaly::{flag_outliers_report, OutlierInput};
use finlens_core::AnalysisConfig;

use crate::input;

/// Arguments for outlier flagging
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct OutliersArgs {
    /// Comma-separated series; leave a slot empty for an absent value (e.g. 1,2,,4)
    #[arg(long)]
    pub values: Option<String>,

    /// Path to JSON/YAML input: {"series": [...], "config": {...}}
    #[arg(long)]
    pub input: Option<String>,

    /// Absolute z-score threshold
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Expected anomaly share for the ensemble
    #[arg(long)]
    pub contamination: Option<f64>,

    /// Ensemble seed
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run_outliers(
    args: OutliersArgs,
    config: AnalysisConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = match &args.values {
        Some(raw) => OutlierInput {
            series: parse_series(raw)?,
            config: config.anomaly,
        },
        None => input::require(args.input.as_deref(), "A series (--values or --input)")?,
    };

    if let Some(t) = args.threshold {
        request.config.threshold = t;
    }
    if let Some(c) = args.contamination {
        request.config.contamination = c;
    }
    if let Some(s) = args.seed {
        request.config.seed = s;
    }

    let result = flag_outliers_report(&request)?;
    Ok(serde_json::to_value(result)?)
}

fn parse_series(raw: &str) -> Result<Vec<Option<Decimal>>, Box<dyn std::error::Error>> {
    raw.split(',')
        .map(|item| -> Result<Option<Decimal>, Box<dyn std::error::Error>> {
            let item = item.trim();
            if item.is_empty() {
                Ok(None)
            } else {
                Decimal::from_str(item)
                    .map(Some)
                    .map_err(|e| format!("Invalid value '{item}': {e}").into())
            }
        })
        .collect()
}
