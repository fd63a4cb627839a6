//! Entity analysis: ratios, peer benchmarks, signals, outliers and the
//! trend screen for one entity in a single pass.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::anomaly::{flag_outliers_with, OutlierFlags};
use crate::config::AnalysisConfig;
use crate::error::FinLensError;
use crate::insights::{
    data_confidence, evaluate_signals, multiple_commentary, quality_flags, screen_trend_risks,
    synthesize, InsightResult, MarketMultiples, QualityFlag, TrendReview,
};
use crate::peers::{peer_snapshot, PeerStatistics};
use crate::ratios::{derive_ratios_with, sort_history, DerivedRecord, PeriodRecord};
use crate::types::{with_metadata, ComputationOutput};
use crate::FinLensResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    /// The entity's own history, in any order
    pub history: Vec<PeriodRecord>,
    /// One history per peer
    #[serde(default)]
    pub peers: Vec<Vec<PeriodRecord>>,
    #[serde(default)]
    pub market: Option<MarketMultiples>,
}

/// Outlier flags for the series that are screened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesOutliers {
    pub revenue: OutlierFlags,
    pub operating_income: OutlierFlags,
    pub net_income: OutlierFlags,
    pub operating_cash_flow: OutlierFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAnalysis {
    /// Period of the latest record
    pub period: String,
    pub derived: Vec<DerivedRecord>,
    pub peer_statistics: PeerStatistics,
    pub insight: InsightResult,
    pub outliers: SeriesOutliers,
    pub trend: TrendReview,
    pub quality_flags: Vec<QualityFlag>,
    /// Percentage of core figures present over the last 12 periods
    pub data_confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every analysis stage over one entity and its peers.
pub fn analyze_entity(
    input: &AnalysisInput,
    config: &AnalysisConfig,
) -> FinLensResult<ComputationOutput<EntityAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    config.validate()?;
    let history = sort_history(input.history.clone())?;
    let derived = derive_ratios_with(&history, &config.derivation);

    // Latest derived record per peer; an empty peer history is an absent entry
    let mut peer_latest: Vec<Option<DerivedRecord>> = Vec::with_capacity(input.peers.len());
    for peer in &input.peers {
        let sorted = sort_history(peer.clone())?;
        peer_latest.push(derive_ratios_with(&sorted, &config.derivation).pop());
    }
    let peer_statistics = peer_snapshot(&peer_latest);
    if peer_statistics.count == 0 {
        warnings.push("No peer data; peer-relative rules cannot fire".into());
    }
    debug!(
        periods = derived.len(),
        peers = peer_statistics.count,
        "ratios derived"
    );

    let Some(latest) = derived.last() else {
        return Err(FinLensError::InsufficientData("Entity history is empty".into()));
    };
    let previous = derived.len().checked_sub(2).and_then(|i| derived.get(i));

    let insight = synthesize(evaluate_signals(latest, &peer_statistics));

    if history.len() < 3 {
        warnings.push("Fewer than 3 periods; outlier flags are not meaningful".into());
    }
    let outliers = SeriesOutliers {
        revenue: screen_series(&history, config, |r| r.revenue),
        operating_income: screen_series(&history, config, |r| r.operating_income),
        net_income: screen_series(&history, config, |r| r.net_income),
        operating_cash_flow: screen_series(&history, config, |r| r.operating_cash_flow),
    };

    let trend = screen_trend_risks(latest, previous);
    let flags = quality_flags(latest);
    let confidence = data_confidence(&history);
    let commentary = input.market.as_ref().map(multiple_commentary);

    info!(
        period = %latest.period(),
        score = insight.score,
        risks = trend.rules_fired.len(),
        "entity analysis complete"
    );

    let result = EntityAnalysis {
        period: latest.period().to_string(),
        peer_statistics,
        insight,
        outliers,
        trend,
        quality_flags: flags,
        data_confidence: confidence,
        commentary,
        derived,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Ratio derivation, peer benchmarks, rule signals and outlier screen",
        config,
        warnings,
        elapsed,
        result,
    ))
}

fn screen_series(
    history: &[PeriodRecord],
    config: &AnalysisConfig,
    field: fn(&PeriodRecord) -> Option<Decimal>,
) -> OutlierFlags {
    let values: Vec<Option<Decimal>> = history.iter().map(field).collect();
    flag_outliers_with(&values, &config.anomaly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quarter(label: &str, revenue: Decimal) -> PeriodRecord {
        PeriodRecord {
            revenue: Some(revenue),
            operating_income: Some(revenue * dec!(0.2)),
            net_income: Some(revenue * dec!(0.1)),
            ..PeriodRecord::new(label)
        }
    }

    #[test]
    fn test_empty_history_is_an_error() {
        let input = AnalysisInput {
            history: vec![],
            peers: vec![],
            market: None,
        };
        let err = analyze_entity(&input, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, FinLensError::InsufficientData(_)));
    }

    #[test]
    fn test_unsorted_history_is_sorted() {
        let input = AnalysisInput {
            history: vec![quarter("2024-Q2", dec!(110)), quarter("2024-Q1", dec!(100))],
            peers: vec![vec![], vec![quarter("2024-Q2", dec!(50))]],
            market: None,
        };
        let out = analyze_entity(&input, &AnalysisConfig::default()).unwrap();
        assert_eq!(out.result.period, "2024-Q2");
        assert_eq!(out.result.derived[1].rev_qoq, Some(dec!(0.1)));
        assert_eq!(out.result.peer_statistics.count, 1);
        assert_eq!(out.result.outliers.revenue.threshold_flags.len(), 2);
        assert!(out.result.commentary.is_none());
    }

    #[test]
    fn test_duplicate_period_rejected() {
        let input = AnalysisInput {
            history: vec![quarter("2024-Q1", dec!(1)), quarter("2024-Q1", dec!(2))],
            peers: vec![],
            market: None,
        };
        assert!(matches!(
            analyze_entity(&input, &AnalysisConfig::default()),
            Err(FinLensError::DuplicatePeriod(_))
        ));
    }

    #[test]
    fn test_market_commentary_included() {
        let input = AnalysisInput {
            history: vec![quarter("2024-Q1", dec!(100))],
            peers: vec![],
            market: Some(MarketMultiples {
                pe: Some(dec!(30)),
                ..Default::default()
            }),
        };
        let out = analyze_entity(&input, &AnalysisConfig::default()).unwrap();
        let commentary = out.result.commentary.unwrap();
        assert!(commentary[0].contains("rich"));
        assert_eq!(out.result.data_confidence, Some(75));
    }
}
