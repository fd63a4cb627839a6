use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::signals::Signal;

/// Maximum number of bullets (and signals counted toward the score).
pub const MAX_BULLETS: usize = 6;
/// Score reported when nothing fired.
pub const NEUTRAL_SCORE: u8 = 50;
pub const NO_FINDINGS_HEADLINE: &str = "No notable findings for this period";

/// Ranked, human-readable summary of a signal set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    pub headline: String,
    pub bullets: Vec<String>,
    /// Bounded score in [0, 100]
    pub score: u8,
    /// Every signal, in ranked order
    pub signals: Vec<Signal>,
}

/// Rank signals by weight (stable on ties) and summarise the top of the list.
pub fn synthesize(mut signals: Vec<Signal>) -> InsightResult {
    // sort_by is stable, so equal weights keep their emission order
    signals.sort_by(|a, b| b.weight.cmp(&a.weight));

    let headline = signals
        .first()
        .map(|s| s.title.clone())
        .unwrap_or_else(|| NO_FINDINGS_HEADLINE.to_string());

    let top = &signals[..signals.len().min(MAX_BULLETS)];
    let bullets = top
        .iter()
        .map(|s| format!("{}: {}", s.title, s.detail))
        .collect();

    let score = if top.is_empty() {
        NEUTRAL_SCORE
    } else {
        let total = top.iter().fold(Decimal::ZERO, |acc, s| {
            acc.saturating_add(s.weight.saturating_mul(dec!(100)))
        });
        let raw = (total / Decimal::from(MAX_BULLETS as u32))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        raw.clamp(Decimal::ZERO, dec!(100)).to_u8().unwrap_or(NEUTRAL_SCORE)
    };

    InsightResult {
        headline,
        bullets,
        score,
        signals,
    }
}
