use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

use super::assumptions::{BaseValues, ValuationAssumptions};
use super::dcf::enterprise_to_equity;

/// Current-period figures the peer multiples are applied to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplesBasis {
    /// First projected year's EBIT
    pub ebit: Money,
    /// Base OCF - CapEx, or first-year NOPAT when both are zero
    pub free_cash_flow: Money,
    /// Base net income, or first-year NOPAT when unknown
    pub net_income: Money,
}

/// Equity values implied by each usable peer multiple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplesCrossCheck {
    pub basis: MultiplesBasis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev_from_ev_ebit: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_from_ev_ebit: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_from_pe: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_from_pfcf: Option<Money>,
    /// Candidates averaged into the per-share value
    pub candidates: Vec<Money>,
    pub value_per_share: Decimal,
    /// No candidate was usable and the DCF value was substituted
    pub fell_back_to_dcf: bool,
}

/// Apply peer multiples to the basis.
///
/// EV/EBIT implies an enterprise value that is bridged to equity and forms
/// one candidate; P/E and P/FCF equity values are averaged into a second.
/// A multiple is used only when it is positive and its base is positive.
/// `None` when an implied value overflows.
pub fn multiples_cross_check(
    basis: MultiplesBasis,
    base: &BaseValues,
    a: &ValuationAssumptions,
    dcf_per_share: Decimal,
) -> Option<MultiplesCrossCheck> {
    let usable = |multiple: Option<Decimal>, metric: Money| -> Option<Option<Money>> {
        match multiple.filter(|m| *m > Decimal::ZERO && metric > Decimal::ZERO) {
            Some(m) => m.checked_mul(metric).map(Some),
            None => Some(None),
        }
    };

    let ev_from_ev_ebit = usable(a.peer_ev_ebit, basis.ebit)?;
    let equity_from_ev_ebit = match ev_from_ev_ebit {
        Some(ev) => Some(enterprise_to_equity(ev, base.cash, base.debt)?),
        None => None,
    };
    let equity_from_pe = usable(a.peer_pe, basis.net_income)?;
    let equity_from_pfcf = usable(a.peer_pfcf, basis.free_cash_flow)?;

    let mut candidates = Vec::new();
    if let Some(eq) = equity_from_ev_ebit {
        candidates.push(eq);
    }
    let direct: Vec<Money> = [equity_from_pe, equity_from_pfcf].into_iter().flatten().collect();
    if !direct.is_empty() {
        candidates.push(mean(&direct)?);
    }

    let fell_back_to_dcf = candidates.is_empty();
    let value_per_share = if fell_back_to_dcf {
        dcf_per_share
    } else {
        mean(&candidates)?.checked_div(base.shares)?
    };

    Some(MultiplesCrossCheck {
        basis,
        ev_from_ev_ebit,
        equity_from_ev_ebit,
        equity_from_pe,
        equity_from_pfcf,
        candidates,
        value_per_share,
        fell_back_to_dcf,
    })
}

fn mean(values: &[Money]) -> Option<Money> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?
        .checked_div(Decimal::from(values.len() as u64))
}
