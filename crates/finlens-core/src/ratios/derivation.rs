//! Ratio derivation: ordered [`PeriodRecord`]s in, one [`DerivedRecord`] per
//! record out, same order and cardinality.
//!
//! Each derived field is a pure function of the record at index *i* and its
//! lookback window (*i−1* for QoQ, *i−4* for YoY, *i−3..=i* for TTM).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinLensError;
use crate::metrics::{
    ccc, days_ratio, growth_rate, invested_capital, margin, roic, ttm, DEFAULT_DAYS_PER_PERIOD,
};
use crate::types::{Money, Rate};
use crate::FinLensResult;

use super::records::{DerivedRecord, PeriodRecord};

/// Fixed assumptions used while deriving ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Tax rate applied to EBIT when computing ROIC (default 21%)
    pub tax_rate: Rate,
    /// Days per reporting period for DSO / DIO / DPO (default 90)
    pub days_per_period: Decimal,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        DerivationConfig {
            tax_rate: dec!(0.21),
            days_per_period: DEFAULT_DAYS_PER_PERIOD,
        }
    }
}

impl DerivationConfig {
    pub fn validate(&self) -> FinLensResult<()> {
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(FinLensError::InvalidInput {
                field: "tax_rate".into(),
                reason: "Tax rate must be between 0 and 1".into(),
            });
        }
        if self.days_per_period <= Decimal::ZERO {
            return Err(FinLensError::InvalidInput {
                field: "days_per_period".into(),
                reason: "Days per period must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Derive ratios with the default configuration (21% tax, 90-day periods).
pub fn derive_ratios(records: &[PeriodRecord]) -> Vec<DerivedRecord> {
    derive_ratios_with(records, &DerivationConfig::default())
}

/// Derive ratios for a chronologically ordered history.
pub fn derive_ratios_with(records: &[PeriodRecord], config: &DerivationConfig) -> Vec<DerivedRecord> {
    (0..records.len())
        .map(|i| derive_one(records, i, config))
        .collect()
}

fn derive_one(records: &[PeriodRecord], i: usize, config: &DerivationConfig) -> DerivedRecord {
    let rec = &records[i];
    let prev_q = i.checked_sub(1).map(|j| &records[j]);
    let prev_y = i.checked_sub(4).map(|j| &records[j]);

    // Margins
    let gross_margin = margin(rec.gross_profit, rec.revenue);
    let ebit_margin = margin(rec.operating_income, rec.revenue);
    let net_margin = margin(rec.net_income, rec.revenue);

    // Growth
    let rev_qoq = growth_rate(rec.revenue, prev_q.and_then(|p| p.revenue));
    let rev_yoy = growth_rate(rec.revenue, prev_y.and_then(|p| p.revenue));
    let inventory_yoy = growth_rate(rec.inventory, prev_y.and_then(|p| p.inventory));

    // TTM over the window ending at i
    let window = &records[..=i];
    let rev_ttm = trailing(window, |r| r.revenue);
    let net_income_ttm = trailing(window, |r| r.net_income);
    let ocf_ttm = trailing(window, |r| r.operating_cash_flow);
    let capex_ttm = trailing(window, |r| r.capex);
    let fcf_ttm = match (ocf_ttm, capex_ttm) {
        (Some(ocf), Some(capex)) => ocf.checked_sub(capex),
        _ => None,
    };

    // ROIC; an absent debt figure counts as zero debt
    let non_interest_liabilities = rec
        .total_liabilities
        .and_then(|liab| liab.checked_sub(rec.debt.unwrap_or(Decimal::ZERO)));
    let ic = invested_capital(rec.total_assets, non_interest_liabilities);
    let roic_v = roic(rec.operating_income, config.tax_rate, ic);

    // DuPont and balance-sheet ratios
    let return_on_assets = margin(rec.net_income, rec.total_assets);
    let asset_turnover = margin(rec.revenue, rec.total_assets);
    let equity_multiplier = margin(rec.total_assets, rec.equity);
    let roe = match (net_margin, asset_turnover, equity_multiplier) {
        (Some(nm), Some(at), Some(em)) => nm.checked_mul(at).and_then(|v| v.checked_mul(em)),
        _ => None,
    };
    let debt_ratio = margin(rec.total_liabilities, rec.total_assets);

    // Working capital; COGS approximated as revenue - gross profit
    let cogs: Option<Money> = match (rec.revenue, rec.gross_profit) {
        (Some(rev), Some(gp)) => rev.checked_sub(gp),
        _ => None,
    };
    let dso = days_ratio(rec.receivables, rec.revenue, config.days_per_period);
    let dio = days_ratio(rec.inventory, cogs, config.days_per_period);
    let dpo = days_ratio(rec.payables, cogs, config.days_per_period);
    let ccc_v = ccc(dso, dio, dpo);

    DerivedRecord {
        record: rec.clone(),
        gross_margin,
        ebit_margin,
        net_margin,
        rev_qoq,
        rev_yoy,
        inventory_yoy,
        rev_ttm,
        net_income_ttm,
        ocf_ttm,
        capex_ttm,
        fcf_ttm,
        non_interest_liabilities,
        invested_capital: ic,
        roic: roic_v,
        return_on_assets,
        asset_turnover,
        equity_multiplier,
        roe,
        debt_ratio,
        cogs,
        dso,
        dio,
        dpo,
        ccc: ccc_v,
    }
}

fn trailing(window: &[PeriodRecord], field: impl Fn(&PeriodRecord) -> Option<Money>) -> Option<Money> {
    let start = window.len().saturating_sub(4);
    let values: Vec<Option<Money>> = window[start..].iter().map(field).collect();
    ttm(&values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter(period: &str, revenue: Decimal) -> PeriodRecord {
        PeriodRecord {
            revenue: Some(revenue),
            ..PeriodRecord::new(period)
        }
    }

    #[test]
    fn test_preserves_order_and_cardinality() {
        let records = vec![
            quarter("2023-Q1", dec!(100)),
            quarter("2023-Q2", dec!(110)),
            quarter("2023-Q3", dec!(120)),
        ];
        let derived = derive_ratios(&records);
        assert_eq!(derived.len(), 3);
        assert_eq!(derived[0].period(), "2023-Q1");
        assert_eq!(derived[2].period(), "2023-Q3");
    }

    #[test]
    fn test_lookback_undefined_at_start() {
        let derived = derive_ratios(&[quarter("2023-Q1", dec!(100))]);
        assert_eq!(derived[0].rev_qoq, None);
        assert_eq!(derived[0].rev_yoy, None);
        assert_eq!(derived[0].rev_ttm, None);
    }

    #[test]
    fn test_margins_and_working_capital() {
        let rec = PeriodRecord {
            revenue: Some(dec!(1000)),
            gross_profit: Some(dec!(400)),
            operating_income: Some(dec!(150)),
            net_income: Some(dec!(100)),
            receivables: Some(dec!(250)),
            inventory: Some(dec!(300)),
            payables: Some(dec!(120)),
            ..PeriodRecord::new("2024-Q1")
        };
        let d = &derive_ratios(&[rec])[0];
        assert_eq!(d.gross_margin, Some(dec!(0.4)));
        assert_eq!(d.ebit_margin, Some(dec!(0.15)));
        assert_eq!(d.net_margin, Some(dec!(0.1)));
        assert_eq!(d.cogs, Some(dec!(600)));
        // DSO = 250/1000*90 = 22.5, DIO = 300/600*90 = 45, DPO = 120/600*90 = 18
        assert_eq!(d.dso, Some(dec!(22.5)));
        assert_eq!(d.dio, Some(dec!(45)));
        assert_eq!(d.dpo, Some(dec!(18)));
        assert_eq!(d.ccc, Some(dec!(49.5)));
    }

    #[test]
    fn test_roic_treats_absent_debt_as_zero() {
        let rec = PeriodRecord {
            operating_income: Some(dec!(100)),
            total_assets: Some(dec!(1000)),
            total_liabilities: Some(dec!(210)),
            ..PeriodRecord::new("2024-Q1")
        };
        let d = &derive_ratios(&[rec])[0];
        assert_eq!(d.non_interest_liabilities, Some(dec!(210)));
        assert_eq!(d.invested_capital, Some(dec!(790)));
        assert_eq!(d.roic, Some(dec!(0.1)));
    }

    #[test]
    fn test_roic_subtracts_debt() {
        let rec = PeriodRecord {
            operating_income: Some(dec!(100)),
            total_assets: Some(dec!(1000)),
            total_liabilities: Some(dec!(400)),
            debt: Some(dec!(190)),
            ..PeriodRecord::new("2024-Q1")
        };
        let d = &derive_ratios(&[rec])[0];
        assert_eq!(d.non_interest_liabilities, Some(dec!(210)));
        assert_eq!(d.roic, Some(dec!(0.1)));
    }

    #[test]
    fn test_fcf_ttm_needs_both_legs() {
        let records: Vec<PeriodRecord> = (1..=4)
            .map(|q| PeriodRecord {
                operating_cash_flow: Some(dec!(50)),
                capex: if q == 2 { None } else { Some(dec!(20)) },
                ..PeriodRecord::new(format!("2023-Q{q}"))
            })
            .collect();
        let d = derive_ratios(&records);
        assert_eq!(d[3].ocf_ttm, Some(dec!(200)));
        assert_eq!(d[3].capex_ttm, None);
        assert_eq!(d[3].fcf_ttm, None);
    }

    #[test]
    fn test_dupont_roe() {
        let rec = PeriodRecord {
            revenue: Some(dec!(200)),
            net_income: Some(dec!(20)),
            total_assets: Some(dec!(400)),
            equity: Some(dec!(100)),
            ..PeriodRecord::new("2024-Q1")
        };
        let d = &derive_ratios(&[rec])[0];
        // 0.1 * 0.5 * 4 = 0.2
        assert_eq!(d.roe, Some(dec!(0.2)));
        assert_eq!(d.return_on_assets, Some(dec!(0.05)));
    }

    #[test]
    fn test_config_validation() {
        let mut cfg = DerivationConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.tax_rate = dec!(1.5);
        assert!(cfg.validate().is_err());
        cfg.tax_rate = dec!(0.21);
        cfg.days_per_period = Decimal::ZERO;
        assert!(cfg.validate().is_err());
    }
}
