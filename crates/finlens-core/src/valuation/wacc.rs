use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

use super::assumptions::ValuationAssumptions;

/// Components of the discount rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaccBreakdown {
    /// Rf + beta * ERP
    pub cost_of_equity: Rate,
    /// Kd * (1 - t)
    pub after_tax_cost_of_debt: Rate,
    pub equity_weight: Rate,
    pub debt_weight: Rate,
    pub wacc: Rate,
}

/// Weighted average cost of capital from CAPM cost of equity and the
/// target capital structure. `None` when an input drives it out of range.
pub fn compute_wacc(a: &ValuationAssumptions) -> Option<WaccBreakdown> {
    let cost_of_equity = a
        .beta
        .checked_mul(a.equity_risk_premium)?
        .checked_add(a.risk_free_rate)?;
    let after_tax_cost_of_debt = a
        .pre_tax_cost_of_debt
        .checked_mul(Decimal::ONE.checked_sub(a.tax_rate)?)?;
    let debt_weight = a.target_debt_ratio;
    let equity_weight = Decimal::ONE.checked_sub(debt_weight)?;
    let wacc = equity_weight
        .checked_mul(cost_of_equity)?
        .checked_add(debt_weight.checked_mul(after_tax_cost_of_debt)?)?;

    Some(WaccBreakdown {
        cost_of_equity,
        after_tax_cost_of_debt,
        equity_weight,
        debt_weight,
        wacc,
    })
}

/// Reasonableness warnings on the discount-rate inputs.
pub fn wacc_warnings(a: &ValuationAssumptions, w: &WaccBreakdown) -> Vec<String> {
    let mut warnings = Vec::new();
    if a.beta > dec!(3.0) {
        warnings.push(format!(
            "High beta ({}): verify market data; betas above 3.0 are unusual",
            a.beta
        ));
    }
    if a.equity_risk_premium > dec!(0.10) {
        warnings.push(format!(
            "Equity risk premium ({}) exceeds 10%; verify estimate",
            a.equity_risk_premium
        ));
    }
    if w.wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {} exceeds 20%; appropriate for high-risk situations only",
            w.wacc.round_dp(4)
        ));
    }
    warnings
}
