use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinLensError;
use crate::types::{Money, Rate};
use crate::FinLensResult;

/// One fiscal period for one entity. Every figure is optional: `None` means
/// unknown, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Sortable period label, e.g. "2024-Q4"
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_profit: Option<Money>,
    /// Operating income (EBIT)
    #[serde(
        default,
        alias = "op_income",
        alias = "ebit",
        skip_serializing_if = "Option::is_none"
    )]
    pub operating_income: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_income: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_assets: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_liabilities: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<Money>,
    #[serde(
        default,
        alias = "oper_cf",
        alias = "operating_cf",
        skip_serializing_if = "Option::is_none"
    )]
    pub operating_cash_flow: Option<Money>,
    #[serde(default, alias = "invest_cf", skip_serializing_if = "Option::is_none")]
    pub investing_cash_flow: Option<Money>,
    #[serde(default, alias = "finance_cf", skip_serializing_if = "Option::is_none")]
    pub financing_cash_flow: Option<Money>,
    /// Capital expenditure as a positive outflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receivables: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payables: Option<Money>,
    #[serde(
        default,
        alias = "cash_and_equiv",
        skip_serializing_if = "Option::is_none"
    )]
    pub cash: Option<Money>,
    #[serde(default, alias = "total_debt", skip_serializing_if = "Option::is_none")]
    pub debt: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Decimal>,
}

impl PeriodRecord {
    pub fn new(period: impl Into<String>) -> Self {
        PeriodRecord {
            period: period.into(),
            ..Default::default()
        }
    }
}

/// A [`PeriodRecord`] together with every metric derived from it and its
/// lookback window (previous 1 and previous 4 records).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    #[serde(flatten)]
    pub record: PeriodRecord,

    // Margins
    pub gross_margin: Option<Rate>,
    pub ebit_margin: Option<Rate>,
    pub net_margin: Option<Rate>,

    // Growth
    pub rev_qoq: Option<Rate>,
    pub rev_yoy: Option<Rate>,
    pub inventory_yoy: Option<Rate>,

    // Trailing four periods
    pub rev_ttm: Option<Money>,
    pub net_income_ttm: Option<Money>,
    pub ocf_ttm: Option<Money>,
    pub capex_ttm: Option<Money>,
    pub fcf_ttm: Option<Money>,

    // Capital efficiency
    pub non_interest_liabilities: Option<Money>,
    pub invested_capital: Option<Money>,
    pub roic: Option<Rate>,
    pub return_on_assets: Option<Rate>,
    pub asset_turnover: Option<Decimal>,
    pub equity_multiplier: Option<Decimal>,
    pub roe: Option<Rate>,
    pub debt_ratio: Option<Rate>,

    // Working capital
    pub cogs: Option<Money>,
    pub dso: Option<Decimal>,
    pub dio: Option<Decimal>,
    pub dpo: Option<Decimal>,
    pub ccc: Option<Decimal>,
}

impl DerivedRecord {
    pub fn period(&self) -> &str {
        &self.record.period
    }
}

/// Sort a history by period label, rejecting duplicate labels.
pub fn sort_history(mut records: Vec<PeriodRecord>) -> FinLensResult<Vec<PeriodRecord>> {
    records.sort_by(|a, b| a.period.cmp(&b.period));
    if let Some(dup) = records.windows(2).find(|w| w[0].period == w[1].period) {
        return Err(FinLensError::DuplicatePeriod(dup[0].period.clone()));
    }
    Ok(records)
}
