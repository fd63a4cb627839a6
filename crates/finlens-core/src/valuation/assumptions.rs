use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinLensError;
use crate::ratios::PeriodRecord;
use crate::types::{Money, Multiple, Rate};
use crate::FinLensResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Exogenous inputs to a valuation run. Every field has a default, so an
/// empty JSON object is a valid set of assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationAssumptions {
    /// Overrides the base record's revenue
    pub base_revenue: Option<Money>,
    /// EBIT as a fraction of projected revenue
    #[serde(alias = "base_op_margin")]
    pub operating_margin: Rate,
    pub tax_rate: Rate,
    /// Revenue growth for years 1-5
    #[serde(alias = "revenue_cagr_years_1_5")]
    pub growth_stage1: Rate,
    /// Revenue growth for years 6-10
    #[serde(alias = "revenue_cagr_years_6_10")]
    pub growth_stage2: Rate,
    pub terminal_growth: Rate,
    /// Share of NOPAT reinvested
    pub reinvestment_rate: Rate,
    /// Take the lower of the NOPAT and OCF-minus-CapEx cash flows each year
    pub use_ocf_capex: bool,
    pub capex_override: Option<Money>,
    pub ocf_override: Option<Money>,

    #[serde(alias = "rf")]
    pub risk_free_rate: Rate,
    #[serde(alias = "erp")]
    pub equity_risk_premium: Rate,
    pub beta: Decimal,
    pub pre_tax_cost_of_debt: Rate,
    /// D / (D + E)
    pub target_debt_ratio: Rate,

    pub peer_pe: Option<Multiple>,
    pub peer_pfcf: Option<Multiple>,
    pub peer_ev_ebit: Option<Multiple>,

    pub shares_outstanding: Option<Decimal>,
    #[serde(alias = "cash_and_equiv")]
    pub cash: Option<Money>,
    #[serde(alias = "total_debt")]
    pub debt: Option<Money>,
}

impl Default for ValuationAssumptions {
    fn default() -> Self {
        ValuationAssumptions {
            base_revenue: None,
            operating_margin: dec!(0.15),
            tax_rate: dec!(0.21),
            growth_stage1: dec!(0.08),
            growth_stage2: dec!(0.04),
            terminal_growth: dec!(0.02),
            reinvestment_rate: dec!(0.25),
            use_ocf_capex: true,
            capex_override: None,
            ocf_override: None,
            risk_free_rate: dec!(0.04),
            equity_risk_premium: dec!(0.05),
            beta: dec!(1.0),
            pre_tax_cost_of_debt: dec!(0.05),
            target_debt_ratio: dec!(0.20),
            peer_pe: Some(dec!(20)),
            peer_pfcf: Some(dec!(18)),
            peer_ev_ebit: Some(dec!(14)),
            shares_outstanding: None,
            cash: None,
            debt: None,
        }
    }
}

impl ValuationAssumptions {
    /// Assumptions with no peer multiples, so the cross-check always falls
    /// back to the DCF value.
    pub fn without_peer_multiples(mut self) -> Self {
        self.peer_pe = None;
        self.peer_pfcf = None;
        self.peer_ev_ebit = None;
        self
    }
}

/// Figures the projection starts from, after applying overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseValues {
    pub revenue: Money,
    pub operating_cash_flow: Money,
    pub capex: Money,
    pub shares: Decimal,
    pub cash: Money,
    pub debt: Money,
}

/// Resolve each base figure from its override, else the record, else zero.
///
/// Revenue and shares must come out positive; nothing per-share can be
/// computed otherwise.
pub fn resolve_base(
    record: &PeriodRecord,
    assumptions: &ValuationAssumptions,
) -> FinLensResult<BaseValues> {
    let pick = |over: Option<Decimal>, rec: Option<Decimal>| {
        over.or(rec).unwrap_or(Decimal::ZERO)
    };

    let base = BaseValues {
        revenue: pick(assumptions.base_revenue, record.revenue),
        operating_cash_flow: pick(assumptions.ocf_override, record.operating_cash_flow),
        capex: pick(assumptions.capex_override, record.capex),
        shares: pick(assumptions.shares_outstanding, record.shares_outstanding),
        cash: pick(assumptions.cash, record.cash),
        debt: pick(assumptions.debt, record.debt),
    };

    if base.revenue <= Decimal::ZERO {
        return Err(FinLensError::InvalidInput {
            field: "base_revenue".into(),
            reason: "Base revenue is missing or not positive; provide base_revenue".into(),
        });
    }
    if base.shares <= Decimal::ZERO {
        return Err(FinLensError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: "Shares outstanding missing or not positive; provide shares_outstanding"
                .into(),
        });
    }
    Ok(base)
}
