//! Period-over-period risk screen, quality flags and data confidence.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::ratios::{DerivedRecord, PeriodRecord};

// ---------------------------------------------------------------------------
// Trend-risk screen
// ---------------------------------------------------------------------------

/// Outcome of comparing the latest period against the one before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReview {
    pub summary: Vec<String>,
    pub risks: Vec<String>,
    pub watchlist: Vec<String>,
    /// Identifiers of the rules that fired (R1..R3)
    pub rules_fired: Vec<String>,
}

pub const DEMAND_SLOWDOWN_REVENUE: Decimal = dec!(-0.10);
pub const DEMAND_SLOWDOWN_INVENTORY: Decimal = dec!(0.10);
pub const LEVERAGE_SPIKE: Decimal = dec!(0.20);

/// Screen the current period against the previous one.
///
/// - R1: revenue YoY at or below -10% while inventory YoY is at or above +10%
/// - R2: debt ratio up by at least 20 percentage points
/// - R3: operating cash flow negative in both periods
pub fn screen_trend_risks(current: &DerivedRecord, previous: Option<&DerivedRecord>) -> TrendReview {
    let mut risks = Vec::new();
    let mut fired = Vec::new();

    if let (Some(rev), Some(inv)) = (current.rev_yoy, current.inventory_yoy) {
        if rev <= DEMAND_SLOWDOWN_REVENUE && inv >= DEMAND_SLOWDOWN_INVENTORY {
            risks.push(
                "Demand slowdown: revenue down YoY while inventory builds YoY".to_string(),
            );
            fired.push("R1".to_string());
        }
    }

    if let Some(prev) = previous {
        if let (Some(cur_dr), Some(prev_dr)) = (current.debt_ratio, prev.debt_ratio) {
            if cur_dr.checked_sub(prev_dr).is_some_and(|d| d >= LEVERAGE_SPIKE) {
                risks.push(
                    "Leverage spike: debt ratio up 20 points or more".to_string(),
                );
                fired.push("R2".to_string());
            }
        }

        if let (Some(cur_ocf), Some(prev_ocf)) = (
            current.record.operating_cash_flow,
            prev.record.operating_cash_flow,
        ) {
            if cur_ocf < Decimal::ZERO && prev_ocf < Decimal::ZERO {
                risks.push(
                    "Cash squeeze: operating cash flow negative two periods running"
                        .to_string(),
                );
                fired.push("R3".to_string());
            }
        }
    }

    TrendReview {
        summary: vec![
            "Latest-period KPIs with QoQ and YoY growth were derived automatically.".to_string(),
            "Outliers are marked with z-score and isolation-forest flags.".to_string(),
        ],
        risks,
        watchlist: vec![
            "Confirm whether the revenue trend is recovering".to_string(),
            "Monitor inventory turnover".to_string(),
            "Review plans to improve cash flow".to_string(),
        ],
        rules_fired: fired,
    }
}

// ---------------------------------------------------------------------------
// Quality flags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagLevel {
    Warning,
    Watch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFlag {
    pub level: FlagLevel,
    pub message: String,
}

/// Flags on the latest derived record.
pub fn quality_flags(latest: &DerivedRecord) -> Vec<QualityFlag> {
    let mut flags = Vec::new();

    if latest.rev_yoy.is_some_and(|g| g < Decimal::ZERO) {
        flags.push(QualityFlag {
            level: FlagLevel::Warning,
            message: "Revenue declined year over year".to_string(),
        });
    }
    // Both margins must be known before judging profitability
    if let (Some(ebit_m), Some(net_m)) = (latest.ebit_margin, latest.net_margin) {
        if ebit_m < dec!(0.10) || net_m < dec!(0.05) {
            flags.push(QualityFlag {
                level: FlagLevel::Watch,
                message: "Thin margins".to_string(),
            });
        }
    }
    if latest.ccc.is_some_and(|c| c > dec!(100)) {
        flags.push(QualityFlag {
            level: FlagLevel::Watch,
            message: "Cash conversion cycle above 100 days".to_string(),
        });
    }

    flags
}

// ---------------------------------------------------------------------------
// Data confidence
// ---------------------------------------------------------------------------

/// Number of trailing records considered by [`data_confidence`].
pub const CONFIDENCE_WINDOW: usize = 12;

/// Whole-number percentage of revenue, gross profit, operating income and
/// net income present over the trailing window. `None` for no records.
pub fn data_confidence(records: &[PeriodRecord]) -> Option<u8> {
    if records.is_empty() {
        return None;
    }
    let window = &records[records.len().saturating_sub(CONFIDENCE_WINDOW)..];
    let n = Decimal::from(window.len() as u64);

    let fields: [fn(&PeriodRecord) -> Option<Decimal>; 4] = [
        |r| r.revenue,
        |r| r.gross_profit,
        |r| r.operating_income,
        |r| r.net_income,
    ];
    let availability: Decimal = fields
        .iter()
        .map(|get| {
            let present = window.iter().filter(|r| get(r).is_some()).count();
            Decimal::from(present as u64) / n
        })
        .sum();

    (availability / dec!(4) * dec!(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u8()
}
