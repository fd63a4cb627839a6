use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

use super::assumptions::BaseValues;
use super::dcf::value_per_share;

/// Offsets applied to the base WACC, in ascending order.
pub const WACC_SHIFTS: [Rate; 5] = [dec!(-0.02), dec!(-0.01), dec!(0), dec!(0.01), dec!(0.02)];
/// Offsets applied to the terminal growth rate.
pub const GROWTH_SHIFTS: [Rate; 3] = [dec!(-0.01), dec!(0), dec!(0.01)];
/// Floor step for the i-th WACC point: 0.5%, 1.0%, ... 2.5%.
pub const WACC_FLOOR_STEP: Rate = dec!(0.005);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCell {
    pub wacc: Rate,
    pub terminal_growth: Rate,
    pub value_per_share: Decimal,
}

/// WACC points of the grid. Each is floored at a positive step-wise minimum
/// so the sequence stays positive and strictly increasing.
pub fn wacc_points(wacc: Rate) -> Vec<Rate> {
    WACC_SHIFTS
        .iter()
        .zip(1u32..)
        .map(|(shift, i)| wacc.saturating_add(*shift).max(WACC_FLOOR_STEP * Decimal::from(i)))
        .collect()
}

/// Terminal growth points, floored at zero.
pub fn growth_points(terminal_growth: Rate) -> Vec<Rate> {
    GROWTH_SHIFTS
        .iter()
        .map(|shift| terminal_growth.saturating_add(*shift).max(Decimal::ZERO))
        .collect()
}

/// Re-run terminal value, discounting and the equity bridge over a 5x3 grid.
/// Cells are ordered WACC-major. `None` if any cell overflows.
pub fn sensitivity_grid(
    cash_flows: &[Money],
    wacc: Rate,
    terminal_growth: Rate,
    base: &BaseValues,
) -> Option<Vec<SensitivityCell>> {
    let growths = growth_points(terminal_growth);
    wacc_points(wacc)
        .into_iter()
        .flat_map(|w| {
            growths.iter().map(move |&g| {
                Some(SensitivityCell {
                    wacc: w,
                    terminal_growth: g,
                    value_per_share: value_per_share(cash_flows, w, g, base)?,
                })
            })
        })
        .collect()
}
