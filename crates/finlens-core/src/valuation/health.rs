//! Eight-check financial-health score over the two latest periods.
//!
//! Profitability: ROA improved, OCF > 0, ROA > 0, OCF > net income.
//! Leverage: liabilities / assets decreased.
//! Efficiency: operating margin improved, asset turnover improved.
//! Dilution: share count did not increase.
//!
//! A check whose inputs are unknown scores nothing. Score 6-8 = Strong,
//! 3-5 = Moderate, 0-2 = Weak.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::metrics::margin;
use crate::ratios::DerivedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStrength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    pub roa_improved: bool,
    pub ocf_positive: bool,
    pub roa_positive: bool,
    pub ocf_exceeds_net_income: bool,
    pub leverage_decreased: bool,
    pub operating_margin_improved: bool,
    pub asset_turnover_improved: bool,
    pub no_share_dilution: bool,

    /// Total score (0-8)
    pub score: u8,
    pub strength: HealthStrength,
    /// False when fewer than two periods were available
    pub sufficient_history: bool,
}

fn classify(score: u8) -> HealthStrength {
    match score {
        6..=8 => HealthStrength::Strong,
        3..=5 => HealthStrength::Moderate,
        _ => HealthStrength::Weak,
    }
}

fn improved(cur: Option<Decimal>, prev: Option<Decimal>) -> bool {
    matches!((cur, prev), (Some(c), Some(p)) if c > p)
}

fn roa(rec: &DerivedRecord) -> Option<Decimal> {
    margin(rec.record.net_income, rec.record.total_assets)
}

fn leverage(rec: &DerivedRecord) -> Option<Decimal> {
    margin(rec.record.total_liabilities, rec.record.total_assets)
}

/// Score the last two records of a chronologically ordered history.
pub fn financial_health_score(history: &[DerivedRecord]) -> HealthScore {
    let [.., prev, cur] = history else {
        return HealthScore {
            roa_improved: false,
            ocf_positive: false,
            roa_positive: false,
            ocf_exceeds_net_income: false,
            leverage_decreased: false,
            operating_margin_improved: false,
            asset_turnover_improved: false,
            no_share_dilution: false,
            score: 0,
            strength: HealthStrength::Weak,
            sufficient_history: false,
        };
    };

    let ocf = cur.record.operating_cash_flow;

    let roa_improved = improved(roa(cur), roa(prev));
    let ocf_positive = ocf.is_some_and(|v| v > Decimal::ZERO);
    let roa_positive = roa(cur).is_some_and(|v| v > Decimal::ZERO);
    let ocf_exceeds_net_income = matches!(
        (ocf, cur.record.net_income),
        (Some(o), Some(n)) if o > n
    );
    let leverage_decreased = improved(leverage(prev), leverage(cur));
    let operating_margin_improved = improved(cur.ebit_margin, prev.ebit_margin);
    let asset_turnover_improved = improved(cur.asset_turnover, prev.asset_turnover);
    let no_share_dilution = matches!(
        (cur.record.shares_outstanding, prev.record.shares_outstanding),
        (Some(c), Some(p)) if !c.is_zero() && !p.is_zero() && c <= p
    );

    let checks = [
        roa_improved,
        ocf_positive,
        roa_positive,
        ocf_exceeds_net_income,
        leverage_decreased,
        operating_margin_improved,
        asset_turnover_improved,
        no_share_dilution,
    ];
    let score = checks.iter().filter(|&&c| c).count() as u8;

    HealthScore {
        roa_improved,
        ocf_positive,
        roa_positive,
        ocf_exceeds_net_income,
        leverage_decreased,
        operating_margin_improved,
        asset_turnover_improved,
        no_share_dilution,
        score,
        strength: classify(score),
        sufficient_history: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::{derive_ratios, PeriodRecord};
    use rust_decimal_macros::dec;

    #[allow(clippy::too_many_arguments)]
    fn period(
        label: &str,
        revenue: Decimal,
        ebit: Decimal,
        ni: Decimal,
        assets: Decimal,
        liabilities: Decimal,
        ocf: Decimal,
        shares: Decimal,
    ) -> PeriodRecord {
        PeriodRecord {
            revenue: Some(revenue),
            operating_income: Some(ebit),
            net_income: Some(ni),
            total_assets: Some(assets),
            total_liabilities: Some(liabilities),
            operating_cash_flow: Some(ocf),
            shares_outstanding: Some(shares),
            ..PeriodRecord::new(label)
        }
    }

    #[test]
    fn test_single_period_scores_zero() {
        let derived = derive_ratios(&[PeriodRecord::new("2024-Q1")]);
        let score = financial_health_score(&derived);
        assert_eq!(score.score, 0);
        assert!(!score.sufficient_history);
        assert_eq!(financial_health_score(&[]).score, 0);
    }

    #[test]
    fn test_perfect_score() {
        let derived = derive_ratios(&[
            period("a", dec!(100), dec!(10), dec!(5), dec!(1000), dec!(600), dec!(8), dec!(50)),
            period("b", dec!(120), dec!(15), dec!(9), dec!(1000), dec!(500), dec!(12), dec!(50)),
        ]);
        let score = financial_health_score(&derived);
        assert_eq!(score.score, 8);
        assert_eq!(score.strength, HealthStrength::Strong);
    }

    #[test]
    fn test_deteriorating_company() {
        let derived = derive_ratios(&[
            period("a", dec!(120), dec!(15), dec!(9), dec!(1000), dec!(500), dec!(12), dec!(50)),
            period("b", dec!(100), dec!(5), dec!(-2), dec!(1000), dec!(700), dec!(-3), dec!(60)),
        ]);
        let score = financial_health_score(&derived);
        // OCF of -3 does not exceed net income of -2 either
        assert_eq!(score.score, 0);
        assert_eq!(score.strength, HealthStrength::Weak);
        assert!(score.sufficient_history);
    }

    #[test]
    fn test_missing_shares_do_not_score() {
        let mut a = period("a", dec!(100), dec!(10), dec!(5), dec!(1000), dec!(600), dec!(8), dec!(50));
        a.shares_outstanding = None;
        let b = period("b", dec!(100), dec!(10), dec!(5), dec!(1000), dec!(600), dec!(8), dec!(50));
        let score = financial_health_score(&derive_ratios(&[a, b]));
        assert!(!score.no_share_dilution);
        // OCF > 0, ROA > 0, OCF > NI
        assert_eq!(score.score, 3);
        assert_eq!(score.strength, HealthStrength::Moderate);
    }
}
