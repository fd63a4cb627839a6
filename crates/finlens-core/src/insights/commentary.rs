use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Multiple;

/// Market-quoted multiples for the entity, any of which may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMultiples {
    #[serde(default)]
    pub pe: Option<Multiple>,
    #[serde(default, alias = "pbr")]
    pub pb: Option<Multiple>,
    #[serde(default)]
    pub eps: Option<Decimal>,
}

pub const NO_COMMENTARY: &str =
    "Not enough market data to comment on valuation multiples.";

/// Plain-language remarks on quoted multiples.
pub fn multiple_commentary(m: &MarketMultiples) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(pe) = m.pe {
        let line = if pe < dec!(15) {
            format!("P/E of {:.1}x screens cheap against a 15-25x band.", pe.round_dp(1))
        } else if pe > dec!(25) {
            format!("P/E of {:.1}x screens rich against a 15-25x band.", pe.round_dp(1))
        } else {
            format!("P/E of {:.1}x sits within a fair 15-25x band.", pe.round_dp(1))
        };
        out.push(line);
    }

    if let Some(pb) = m.pb {
        if pb < Decimal::ONE {
            out.push(format!("Trades below book value (P/B {:.2}).", pb.round_dp(2)));
        } else if pb > dec!(3) {
            out.push(format!("Price-to-book is high (P/B {:.2}).", pb.round_dp(2)));
        }
    }

    if let Some(eps) = m.eps {
        if eps > Decimal::ZERO {
            out.push("Trailing earnings per share are positive.".to_string());
        } else if eps < Decimal::ZERO {
            out.push("Trailing earnings per share are negative.".to_string());
        }
    }

    if out.is_empty() {
        out.push(NO_COMMENTARY.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pe_bands() {
        let cheap = multiple_commentary(&MarketMultiples {
            pe: Some(dec!(12)),
            ..Default::default()
        });
        assert!(cheap[0].contains("cheap"));
        let fair = multiple_commentary(&MarketMultiples {
            pe: Some(dec!(25)),
            ..Default::default()
        });
        assert!(fair[0].contains("fair"));
        let rich = multiple_commentary(&MarketMultiples {
            pe: Some(dec!(30.25)),
            ..Default::default()
        });
        assert!(rich[0].contains("rich"));
    }

    #[test]
    fn test_book_and_eps() {
        let lines = multiple_commentary(&MarketMultiples {
            pe: None,
            pb: Some(dec!(0.8)),
            eps: Some(dec!(-1.2)),
        });
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("below book"));
        assert!(lines[1].contains("negative"));
    }

    #[test]
    fn test_fallback_when_nothing_applies() {
        let lines = multiple_commentary(&MarketMultiples {
            pb: Some(dec!(2)),
            eps: Some(Decimal::ZERO),
            ..Default::default()
        });
        assert_eq!(lines, vec![NO_COMMENTARY.to_string()]);
    }
}
