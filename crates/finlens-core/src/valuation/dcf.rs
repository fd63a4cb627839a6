//! Ten-year two-stage projection, terminal value and discounting.
//!
//! Two free-cash-flow paths are projected side by side:
//!
//! - NOPAT path: `revenue * margin * (1 - t) * (1 - reinvestment)`
//! - OCF path: operating cash flow grows at 0.8x revenue growth, capex at
//!   0.7x positive growth (flat otherwise); FCF = OCF - CapEx
//!
//! With `use_ocf_capex` the lower of the two is taken each year.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

use super::assumptions::{BaseValues, ValuationAssumptions};

/// Length of the explicit forecast.
pub const PROJECTION_YEARS: u32 = 10;
/// Years 1..=STAGE1_YEARS grow at the stage-1 rate.
pub const STAGE1_YEARS: u32 = 5;
/// Gap kept between WACC and terminal growth when the latter is clamped.
pub const TERMINAL_SPREAD: Rate = dec!(0.005);

const OCF_GROWTH_ELASTICITY: Decimal = dec!(0.8);
const CAPEX_GROWTH_ELASTICITY: Decimal = dec!(0.7);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub growth: Rate,
    pub revenue: Money,
    pub ebit: Money,
    pub nopat: Money,
    pub fcf_nopat: Money,
    /// Present only when the OCF/CapEx path is in use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcf_ocf_capex: Option<Money>,
    /// Cash flow actually discounted
    pub fcf: Money,
    pub discount_factor: Rate,
    pub pv_fcf: Money,
}

/// Terminal value with the growth rate actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminalValue {
    pub value: Money,
    pub growth_used: Rate,
    pub clamped: bool,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Growth rate for a 1-based projection year.
pub fn stage_growth(year: u32, g1: Rate, g2: Rate) -> Rate {
    if year <= STAGE1_YEARS {
        g1
    } else {
        g2
    }
}

/// `value * (1 + rate)`, undefined on overflow.
fn grow(value: Decimal, rate: Rate) -> Option<Decimal> {
    Decimal::ONE.checked_add(rate)?.checked_mul(value)
}

/// Compounded revenue path over the forecast years. `None` when the path
/// leaves the representable range.
pub fn project_revenue(base_revenue: Money, g1: Rate, g2: Rate) -> Option<Vec<Money>> {
    let mut out = Vec::with_capacity(PROJECTION_YEARS as usize);
    let mut revenue = base_revenue;
    for year in 1..=PROJECTION_YEARS {
        revenue = grow(revenue, stage_growth(year, g1, g2))?;
        out.push(revenue);
    }
    Some(out)
}

/// Build the full projection table, discounted at `wacc`.
///
/// `None` when any figure overflows or the cumulative discount factor
/// underflows to zero.
pub fn build_projection(
    base: &BaseValues,
    a: &ValuationAssumptions,
    wacc: Rate,
) -> Option<Vec<ProjectionYear>> {
    let revenues = project_revenue(base.revenue, a.growth_stage1, a.growth_stage2)?;
    let after_tax = Decimal::ONE.checked_sub(a.tax_rate)?;
    let retained = Decimal::ONE.checked_sub(a.reinvestment_rate)?;
    let mut ocf = base.operating_cash_flow;
    let mut capex = base.capex;
    let mut compound = Decimal::ONE;
    let mut out = Vec::with_capacity(revenues.len());

    for (revenue, year) in revenues.into_iter().zip(1..=PROJECTION_YEARS) {
        let growth = stage_growth(year, a.growth_stage1, a.growth_stage2);
        let ebit = revenue.checked_mul(a.operating_margin)?;
        let nopat = ebit.checked_mul(after_tax)?;
        let fcf_nopat = nopat.checked_mul(retained)?;

        let fcf_ocf_capex = if a.use_ocf_capex {
            ocf = grow(ocf, growth.checked_mul(OCF_GROWTH_ELASTICITY)?)?;
            capex = grow(
                capex,
                growth.max(Decimal::ZERO).checked_mul(CAPEX_GROWTH_ELASTICITY)?,
            )?;
            Some(ocf.checked_sub(capex)?)
        } else {
            None
        };
        let fcf = match fcf_ocf_capex {
            Some(alt) => fcf_nopat.min(alt),
            None => fcf_nopat,
        };

        compound = grow(compound, wacc)?;

        out.push(ProjectionYear {
            year,
            growth,
            revenue,
            ebit,
            nopat,
            fcf_nopat,
            fcf_ocf_capex,
            fcf,
            discount_factor: Decimal::ONE.checked_div(compound)?,
            pv_fcf: fcf.checked_div(compound)?,
        });
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// Terminal value and discounting
// ---------------------------------------------------------------------------

/// Terminal growth after the degeneracy guard: when `wacc <= g` growth is
/// pulled down to `wacc - 0.005`.
pub fn effective_terminal_growth(wacc: Rate, g: Rate) -> (Rate, bool) {
    if wacc <= g {
        (wacc.saturating_sub(TERMINAL_SPREAD), true)
    } else {
        (g, false)
    }
}

/// Gordon-growth terminal value on the final projected cash flow.
pub fn terminal_value(last_fcf: Money, wacc: Rate, g: Rate) -> Option<TerminalValue> {
    let (growth_used, clamped) = effective_terminal_growth(wacc, g);
    let spread = wacc.checked_sub(growth_used)?;
    Some(TerminalValue {
        value: grow(last_fcf, growth_used)?.checked_div(spread)?,
        growth_used,
        clamped,
    })
}

/// `(1 + wacc)^-years`.
pub fn discount_factor(wacc: Rate, years: u32) -> Option<Rate> {
    let compound = (0..years).try_fold(Decimal::ONE, |acc, _| grow(acc, wacc))?;
    Decimal::ONE.checked_div(compound)
}

/// PV of the cash flows (years 1..n) plus the terminal value discounted at
/// year n.
pub fn enterprise_value(cash_flows: &[Money], wacc: Rate, terminal: Money) -> Option<Money> {
    let mut compound = Decimal::ONE;
    let mut pv = Decimal::ZERO;
    for cf in cash_flows {
        compound = grow(compound, wacc)?;
        pv = pv.checked_add(cf.checked_div(compound)?)?;
    }
    pv.checked_add(terminal.checked_div(compound)?)
}

/// EV + cash - debt.
pub fn enterprise_to_equity(ev: Money, cash: Money, debt: Money) -> Option<Money> {
    ev.checked_add(cash)?.checked_sub(debt)
}

/// Per-share equity value for one (WACC, terminal growth) pair.
pub fn value_per_share(
    cash_flows: &[Money],
    wacc: Rate,
    terminal_growth: Rate,
    base: &BaseValues,
) -> Option<Decimal> {
    let last = cash_flows.last().copied().unwrap_or(Decimal::ZERO);
    let tv = terminal_value(last, wacc, terminal_growth)?;
    let ev = enterprise_value(cash_flows, wacc, tv.value)?;
    enterprise_to_equity(ev, base.cash, base.debt)?.checked_div(base.shares)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseValues {
        BaseValues {
            revenue: dec!(1000),
            operating_cash_flow: dec!(200),
            capex: dec!(50),
            shares: dec!(100),
            cash: Decimal::ZERO,
            debt: Decimal::ZERO,
        }
    }

    #[test]
    fn test_revenue_compounds_in_two_stages() {
        let rev = project_revenue(dec!(100), dec!(0.10), dec!(0.0)).unwrap();
        assert_eq!(rev.len(), 10);
        assert_eq!(rev[0], dec!(110));
        assert_eq!(rev[1], dec!(121));
        assert_eq!(rev[4], dec!(161.051));
        // Stage 2 at zero growth holds revenue flat
        assert_eq!(rev[9], rev[4]);
    }

    #[test]
    fn test_nopat_path_year_one() {
        let a = ValuationAssumptions {
            use_ocf_capex: false,
            ..Default::default()
        };
        let proj = build_projection(&base(), &a, dec!(0.08)).unwrap();
        // rev 1080, ebit 162, nopat 127.98, fcf 95.985
        assert_eq!(proj[0].revenue, dec!(1080));
        assert_eq!(proj[0].ebit, dec!(162));
        assert_eq!(proj[0].nopat, dec!(127.98));
        assert_eq!(proj[0].fcf, dec!(95.985));
        assert!(proj[0].fcf_ocf_capex.is_none());
    }

    #[test]
    fn test_ocf_path_and_minimum() {
        let a = ValuationAssumptions::default();
        let proj = build_projection(&base(), &a, dec!(0.08)).unwrap();
        // ocf 200 * 1.064 = 212.8; capex 50 * 1.056 = 52.8; fcf 160
        assert_eq!(proj[0].fcf_ocf_capex, Some(dec!(160.0000)));
        assert_eq!(proj[0].fcf, dec!(95.985));
    }

    #[test]
    fn test_capex_flat_on_negative_growth() {
        let a = ValuationAssumptions {
            growth_stage1: dec!(-0.10),
            ..Default::default()
        };
        let proj = build_projection(&base(), &a, dec!(0.08)).unwrap();
        // ocf 200 * 0.92 = 184; capex stays 50
        assert_eq!(proj[0].fcf_ocf_capex, Some(dec!(134)));
    }

    #[test]
    fn test_terminal_clamp() {
        let tv = terminal_value(dec!(100), dec!(0.06), dec!(0.06)).unwrap();
        assert!(tv.clamped);
        assert_eq!(tv.growth_used, dec!(0.055));
        assert_eq!(tv.value, dec!(100) * dec!(1.055) / dec!(0.005));
    }

    #[test]
    fn test_terminal_no_clamp() {
        let tv = terminal_value(dec!(100), dec!(0.10), dec!(0.02)).unwrap();
        assert!(!tv.clamped);
        assert_eq!(tv.value, dec!(1275));
    }

    #[test]
    fn test_enterprise_value_single_year() {
        // 110 / 1.1 + 0 = 100
        assert_eq!(
            enterprise_value(&[dec!(110)], dec!(0.10), Decimal::ZERO),
            Some(dec!(100))
        );
        assert_eq!(discount_factor(dec!(0.25), 2), Some(dec!(0.64)));
    }

    #[test]
    fn test_runaway_growth_is_undefined() {
        let rev = Decimal::from(300_000_000_000_000i64);
        assert_eq!(project_revenue(rev, dec!(30), dec!(30)), None);
    }

    #[test]
    fn test_vanishing_discount_factor_is_undefined() {
        // (1 - 0.9999)^10 rounds to zero
        let a = ValuationAssumptions {
            use_ocf_capex: false,
            ..Default::default()
        };
        assert_eq!(build_projection(&base(), &a, dec!(-0.9999)), None);
        assert_eq!(discount_factor(dec!(-0.9999), 10), None);
        assert_eq!(enterprise_value(&[dec!(1); 10], dec!(-0.9999), Decimal::ZERO), None);
    }
}
