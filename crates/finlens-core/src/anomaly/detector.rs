use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinLensError;
use crate::types::{with_precision, ComputationOutput};
use crate::FinLensResult;

use super::isolation::IsolationForest;
use super::zscore::threshold_flags;

/// Settings for both outlier methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Absolute z-score at or above which a value is flagged
    pub threshold: f64,
    /// Expected share of anomalies for the ensemble, in (0, 0.5]
    pub contamination: f64,
    /// Seed for the ensemble's random partitioning
    pub seed: u64,
    pub n_estimators: usize,
    pub max_samples: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        AnomalyConfig {
            threshold: 2.5,
            contamination: 0.15,
            seed: 42,
            n_estimators: 100,
            max_samples: 256,
        }
    }
}

impl AnomalyConfig {
    pub fn validate(&self) -> FinLensResult<()> {
        if self.threshold.is_nan() || self.threshold <= 0.0 {
            return Err(FinLensError::InvalidInput {
                field: "threshold".into(),
                reason: "Z-score threshold must be positive".into(),
            });
        }
        if self.contamination.is_nan() || self.contamination <= 0.0 || self.contamination > 0.5 {
            return Err(FinLensError::InvalidInput {
                field: "contamination".into(),
                reason: "Contamination must be in (0, 0.5]".into(),
            });
        }
        if self.n_estimators == 0 || self.max_samples == 0 {
            return Err(FinLensError::InvalidInput {
                field: "n_estimators / max_samples".into(),
                reason: "Must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Two independent boolean flags per series element. They are not merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierFlags {
    pub threshold_flags: Vec<bool>,
    pub ensemble_flags: Vec<bool>,
}

/// Input for a reported outlier run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierInput {
    pub series: Vec<Option<Decimal>>,
    #[serde(default)]
    pub config: AnomalyConfig,
}

/// Flag outliers with the default seed and ensemble size.
pub fn flag_outliers(series: &[Option<Decimal>], threshold: f64, contamination: f64) -> OutlierFlags {
    let config = AnomalyConfig {
        threshold,
        contamination,
        ..AnomalyConfig::default()
    };
    flag_outliers_with(series, &config)
}

/// Flag outliers under an explicit configuration. Never fails: a malformed
/// configuration simply flags nothing for the affected method.
pub fn flag_outliers_with(series: &[Option<Decimal>], config: &AnomalyConfig) -> OutlierFlags {
    let values: Vec<Option<f64>> = series.iter().map(|v| v.and_then(|d| d.to_f64())).collect();

    let threshold_flags = if config.threshold > 0.0 {
        threshold_flags(&values, config.threshold)
    } else {
        vec![false; values.len()]
    };

    // The ensemble scores every element, so absent values are placed at 0.
    let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0)).collect();
    let ensemble_flags = if config.n_estimators > 0 && config.max_samples > 0 {
        let contamination = config.contamination.min(0.5);
        IsolationForest::fit(&filled, config.n_estimators, config.max_samples, config.seed)
            .predict(&filled, contamination)
    } else {
        vec![false; values.len()]
    };

    OutlierFlags {
        threshold_flags,
        ensemble_flags,
    }
}

/// Validated outlier run wrapped in the standard envelope.
pub fn flag_outliers_report(input: &OutlierInput) -> FinLensResult<ComputationOutput<OutlierFlags>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;

    let absent = input.series.iter().filter(|v| v.is_none()).count();
    if absent > 0 {
        warnings.push(format!(
            "{absent} absent value(s) scored as 0 by the isolation ensemble"
        ));
    }
    if input.series.len() < 3 {
        warnings.push("Fewer than 3 observations; flags are not meaningful".into());
    }

    let output = flag_outliers_with(&input.series, &input.config);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_precision(
        "Z-score threshold + isolation forest ensemble",
        input,
        warnings,
        elapsed,
        "ieee754_f64",
        output,
    ))
}
