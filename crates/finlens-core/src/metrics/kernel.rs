//! Scalar and series primitives shared by every derived metric.
//!
//! Every function here is total over optional inputs: an absent input, or a
//! denominator of exactly zero, yields `None` rather than an error. Callers
//! chain these freely and the "unknown" state propagates on its own.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

/// Days in one reporting period for quarterly balance/flow ratios.
pub const DEFAULT_DAYS_PER_PERIOD: Decimal = dec!(90);

/// Period-over-period growth: `curr / prev - 1`.
pub fn growth_rate(curr: Option<Decimal>, prev: Option<Decimal>) -> Option<Rate> {
    let (curr, prev) = (curr?, prev?);
    if prev.is_zero() {
        return None;
    }
    curr.checked_div(prev)?.checked_sub(Decimal::ONE)
}

/// `numerator / denominator`, undefined when the denominator is absent or zero.
pub fn margin(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Option<Rate> {
    let (numerator, denominator) = (numerator?, denominator?);
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// Trailing-twelve-month sum over the last four entries of `series`.
///
/// Strict: all four values must be present. A window with fewer than four
/// entries, or with any gap, is undefined and never a partial sum.
pub fn ttm(series: &[Option<Decimal>]) -> Option<Money> {
    if series.len() < 4 {
        return None;
    }
    series[series.len() - 4..]
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| v.and_then(|v| acc.checked_add(v)))
}

/// `balance / flow_per_period * days` (DSO, DIO, DPO).
pub fn days_ratio(
    balance: Option<Money>,
    flow_per_period: Option<Money>,
    days: Decimal,
) -> Option<Decimal> {
    margin(balance, flow_per_period).and_then(|r| r.checked_mul(days))
}

/// Cash conversion cycle: DSO + DIO - DPO.
pub fn ccc(dso: Option<Decimal>, dio: Option<Decimal>, dpo: Option<Decimal>) -> Option<Decimal> {
    dso?.checked_add(dio?)?.checked_sub(dpo?)
}

/// Return on invested capital: `ebit * (1 - tax_rate) / invested_capital`.
pub fn roic(ebit: Option<Money>, tax_rate: Rate, invested_capital: Option<Money>) -> Option<Rate> {
    let nopat = ebit?.checked_mul(Decimal::ONE.checked_sub(tax_rate)?)?;
    margin(Some(nopat), invested_capital)
}

/// Total assets less non-interest-bearing liabilities.
pub fn invested_capital(
    total_assets: Option<Money>,
    non_interest_liabilities: Option<Money>,
) -> Option<Money> {
    total_assets?.checked_sub(non_interest_liabilities?)
}
