use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::FinLensError;
use crate::ratios::{derive_ratios, sort_history, PeriodRecord};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinLensResult;

use super::assumptions::{resolve_base, BaseValues, ValuationAssumptions};
use super::dcf::{
    build_projection, enterprise_to_equity, enterprise_value, terminal_value, ProjectionYear,
    TerminalValue,
};
use super::health::{financial_health_score, HealthScore};
use super::multiples::{multiples_cross_check, MultiplesBasis, MultiplesCrossCheck};
use super::sensitivity::{sensitivity_grid, SensitivityCell};
use super::wacc::{compute_wacc, wacc_warnings, WaccBreakdown};

/// Weight of the DCF value in the blend; multiples take the rest.
pub const DCF_BLEND_WEIGHT: Decimal = dec!(0.7);
pub const MULTIPLES_BLEND_WEIGHT: Decimal = dec!(0.3);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    pub dcf_value_per_share: Decimal,
    pub multiples_value_per_share: Decimal,
    /// 0.7 * DCF + 0.3 * multiples
    pub blended_value_per_share: Decimal,
    /// Financial-health score (0-8); see `health` for the breakdown
    pub f_score: u8,
    pub notes: Vec<String>,
    pub sensitivity: Vec<SensitivityCell>,

    pub base: BaseValues,
    pub wacc: WaccBreakdown,
    pub projections: Vec<ProjectionYear>,
    pub terminal: TerminalValue,
    pub enterprise_value: Money,
    pub equity_value: Money,
    pub multiples: MultiplesCrossCheck,
    pub health: HealthScore,
}

/// Everything needed to value an entity from its stored history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub history: Vec<PeriodRecord>,
    /// Period to value from; the latest record when absent or not found
    #[serde(default)]
    pub period: Option<String>,
    /// Explicit base record, bypassing the history lookup
    #[serde(default)]
    pub base_record: Option<PeriodRecord>,
    #[serde(default)]
    pub assumptions: ValuationAssumptions,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The record for `period`, or the latest one when no period is given or it
/// is not in the history.
pub fn select_base_record<'a>(
    history: &'a [PeriodRecord],
    period: Option<&str>,
) -> FinLensResult<&'a PeriodRecord> {
    let latest = history
        .last()
        .ok_or_else(|| FinLensError::InsufficientData("Valuation needs at least one period".into()))?;
    Ok(period
        .and_then(|p| history.iter().find(|r| r.period == p))
        .unwrap_or(latest))
}

/// Value a request: order the history, resolve the base record and run the
/// valuation. Fails on duplicate periods in the history.
pub fn valuate(request: &ValuationRequest) -> FinLensResult<ComputationOutput<ValuationResult>> {
    let history = sort_history(request.history.clone())?;
    let base = match &request.base_record {
        Some(rec) => rec,
        None => select_base_record(&history, request.period.as_deref())?,
    };
    run_valuation(base, &history, &request.assumptions)
}

/// DCF valuation with a multiples cross-check, a 70/30 blend, a WACC by
/// terminal-growth sensitivity grid and a financial-health score.
///
/// `history` must be in period order; it feeds only the health score.
/// Fails when the resolved revenue or share count is not positive, when
/// WACC is at or below -100%, or when the inputs push a figure outside the
/// decimal range (runaway growth, a discount factor that vanishes).
pub fn run_valuation(
    base_record: &PeriodRecord,
    history: &[PeriodRecord],
    assumptions: &ValuationAssumptions,
) -> FinLensResult<ComputationOutput<ValuationResult>> {
    let start = Instant::now();

    // --- Base extraction ---
    let base = resolve_base(base_record, assumptions)?;

    // --- WACC ---
    let wacc = compute_wacc(assumptions)
        .ok_or_else(|| out_of_range("wacc", "WACC inputs are outside the decimal range"))?;
    if wacc.wacc <= -Decimal::ONE {
        return Err(FinLensError::InvalidInput {
            field: "wacc".into(),
            reason: format!("WACC of {} cannot be discounted", wacc.wacc),
        });
    }
    let mut warnings = wacc_warnings(assumptions, &wacc);
    let w = wacc.wacc;
    debug!(period = %base_record.period, wacc = %w, "valuation base resolved");

    // --- Projection, terminal value, discounting ---
    let projections = build_projection(&base, assumptions, w).ok_or_else(|| {
        out_of_range(
            "growth_stage1 / growth_stage2 / wacc",
            "Projection leaves the decimal range or the discount factor vanishes",
        )
    })?;
    let cash_flows: Vec<Money> = projections.iter().map(|p| p.fcf).collect();
    let last_fcf = cash_flows.last().copied().unwrap_or(Decimal::ZERO);

    let terminal = terminal_value(last_fcf, w, assumptions.terminal_growth)
        .ok_or_else(|| out_of_range("terminal_growth", "Terminal value is outside the decimal range"))?;
    if terminal.clamped {
        warn!(
            wacc = %w,
            terminal_growth = %assumptions.terminal_growth,
            "terminal growth clamped below WACC"
        );
        warnings.push(format!(
            "Terminal growth {} is not below WACC {}; clamped to {}",
            assumptions.terminal_growth,
            w.round_dp(4),
            terminal.growth_used.round_dp(4)
        ));
    }
    if last_fcf < Decimal::ZERO {
        warnings.push(format!(
            "Final-year free cash flow is negative ({}); terminal value is negative",
            last_fcf.round_dp(2)
        ));
    }

    let ev = enterprise_value(&cash_flows, w, terminal.value)
        .ok_or_else(|| out_of_range("wacc", "Enterprise value is outside the decimal range"))?;
    let equity_value = enterprise_to_equity(ev, base.cash, base.debt)
        .ok_or_else(|| out_of_range("cash / debt", "Equity value is outside the decimal range"))?;
    let dcf_value_per_share = equity_value
        .checked_div(base.shares)
        .ok_or_else(|| out_of_range("shares_outstanding", "Value per share is outside the decimal range"))?;

    // --- Multiples cross-check ---
    let basis = multiples_basis(&base, base_record, &projections)
        .ok_or_else(|| out_of_range("capex", "Free cash flow is outside the decimal range"))?;
    let multiples = multiples_cross_check(basis, &base, assumptions, dcf_value_per_share)
        .ok_or_else(|| out_of_range("peer multiples", "Implied value is outside the decimal range"))?;
    if multiples.fell_back_to_dcf {
        warn!("no usable peer multiple; multiples value falls back to DCF");
        warnings.push("No usable peer multiple; multiples value equals the DCF value".into());
    }

    // --- Blend ---
    let blended_value_per_share = DCF_BLEND_WEIGHT
        .checked_mul(dcf_value_per_share)
        .zip(MULTIPLES_BLEND_WEIGHT.checked_mul(multiples.value_per_share))
        .and_then(|(d, m)| d.checked_add(m))
        .ok_or_else(|| out_of_range("peer multiples", "Blended value is outside the decimal range"))?;

    // --- Health and sensitivity ---
    let health = financial_health_score(&derive_ratios(history));
    let sensitivity = sensitivity_grid(&cash_flows, w, assumptions.terminal_growth, &base)
        .ok_or_else(|| out_of_range("wacc", "Sensitivity grid is outside the decimal range"))?;

    let notes = build_notes(assumptions, w);

    let result = ValuationResult {
        dcf_value_per_share,
        multiples_value_per_share: multiples.value_per_share,
        blended_value_per_share,
        f_score: health.score,
        notes,
        sensitivity,
        base,
        wacc,
        projections,
        terminal,
        enterprise_value: ev,
        equity_value,
        multiples,
        health,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-stage DCF (10y, Gordon terminal) blended 70/30 with peer multiples",
        assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn out_of_range(field: &str, reason: &str) -> FinLensError {
    FinLensError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

fn multiples_basis(
    base: &BaseValues,
    record: &PeriodRecord,
    projections: &[ProjectionYear],
) -> Option<MultiplesBasis> {
    let (first_ebit, first_nopat) = projections
        .first()
        .map(|p| (p.ebit, p.nopat))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));

    let free_cash_flow = if base.operating_cash_flow.is_zero() && base.capex.is_zero() {
        first_nopat
    } else {
        base.operating_cash_flow.checked_sub(base.capex)?
    };

    Some(MultiplesBasis {
        ebit: first_ebit,
        free_cash_flow,
        net_income: record.net_income.unwrap_or(first_nopat),
    })
}

fn build_notes(a: &ValuationAssumptions, wacc: Rate) -> Vec<String> {
    let flow = if a.use_ocf_capex {
        "FCF = min(NOPAT-based, OCF-CapEx-based) per year (conservative)."
    } else {
        "FCF = NOPAT-based with reinvestment rate."
    };
    vec![
        format!("WACC={}, g={}", wacc.round_dp(4), a.terminal_growth),
        flow.to_string(),
        "Blended = 70% DCF + 30% Multiples.".to_string(),
        format!(
            "Inputs: margin={}, tax={}, reinvest={}",
            a.operating_margin, a.tax_rate, a.reinvestment_rate
        ),
        "Peer multiples used when meaningful/positive.".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<PeriodRecord> {
        vec![
            PeriodRecord {
                revenue: Some(dec!(900)),
                net_income: Some(dec!(60)),
                ..PeriodRecord::new("2023-Q4")
            },
            PeriodRecord {
                revenue: Some(dec!(1000)),
                net_income: Some(dec!(80)),
                operating_cash_flow: Some(dec!(150)),
                capex: Some(dec!(50)),
                shares_outstanding: Some(dec!(100)),
                cash: Some(dec!(200)),
                debt: Some(dec!(100)),
                ..PeriodRecord::new("2024-Q4")
            },
        ]
    }

    #[test]
    fn test_select_base_record() {
        let h = history();
        assert_eq!(select_base_record(&h, None).unwrap().period, "2024-Q4");
        assert_eq!(select_base_record(&h, Some("2023-Q4")).unwrap().period, "2023-Q4");
        assert_eq!(select_base_record(&h, Some("1999-Q1")).unwrap().period, "2024-Q4");
        assert!(matches!(
            select_base_record(&[], None),
            Err(FinLensError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_run_valuation_shape() {
        let h = history();
        let out = run_valuation(&h[1], &h, &ValuationAssumptions::default()).unwrap();
        let r = &out.result;
        assert_eq!(r.projections.len(), 10);
        assert_eq!(r.sensitivity.len(), 15);
        assert_eq!(r.notes.len(), 5);
        assert_eq!(
            r.blended_value_per_share,
            dec!(0.7) * r.dcf_value_per_share + dec!(0.3) * r.multiples_value_per_share
        );
        assert!(!r.multiples.fell_back_to_dcf);
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_multiples_basis_uses_ocf_minus_capex() {
        let h = history();
        let out = run_valuation(&h[1], &h, &ValuationAssumptions::default()).unwrap();
        let basis = out.result.multiples.basis;
        assert_eq!(basis.free_cash_flow, dec!(100));
        assert_eq!(basis.net_income, dec!(80));
        assert_eq!(basis.ebit, out.result.projections[0].ebit);
    }

    #[test]
    fn test_rejects_missing_shares() {
        let rec = PeriodRecord {
            revenue: Some(dec!(1000)),
            ..PeriodRecord::new("2024-Q4")
        };
        let err = run_valuation(&rec, &[], &ValuationAssumptions::default()).unwrap_err();
        assert!(matches!(err, FinLensError::InvalidInput { .. }));
    }

    #[test]
    fn test_clamp_warning() {
        let h = history();
        let a = ValuationAssumptions {
            terminal_growth: dec!(0.10),
            ..Default::default()
        };
        let out = run_valuation(&h[1], &h, &a).unwrap();
        assert!(out.result.terminal.clamped);
        assert!(out.warnings.iter().any(|w| w.contains("clamped")));
    }

    #[test]
    fn test_valuate_request_from_json() {
        let json = r#"{
            "history": [
                {"period": "2024-Q4", "revenue": 1000, "shares_outstanding": 100}
            ],
            "assumptions": {"peer_pe": null, "peer_pfcf": null, "peer_ev_ebit": null}
        }"#;
        let req: ValuationRequest = serde_json::from_str(json).unwrap();
        let out = valuate(&req).unwrap();
        assert!(out.result.multiples.fell_back_to_dcf);
        assert_eq!(
            out.result.multiples_value_per_share,
            out.result.dcf_value_per_share
        );
    }
}
