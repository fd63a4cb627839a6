//! Rule-based signals over a derived record and its peer benchmarks.
//!
//! Each rule is evaluated independently; none short-circuits another and a
//! rule whose inputs are missing simply does not fire.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::metrics::margin;
use crate::peers::{PeerMetric, PeerStatistics};
use crate::ratios::DerivedRecord;

/// Whether a signal reads as a strength or a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Strength,
    Risk,
}

/// A single weighted finding. Weight lies in (0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Identifier of the rule that emitted it
    pub rule: String,
    pub title: String,
    pub detail: String,
    pub weight: Decimal,
    pub kind: SignalKind,
}

impl Signal {
    fn new(rule: &str, title: &str, detail: String, weight: Decimal, kind: SignalKind) -> Self {
        Signal {
            rule: rule.to_string(),
            title: title.to_string(),
            detail,
            weight,
            kind,
        }
    }
}

/// A named rule. Extend the set by passing your own slice to
/// [`evaluate_with_rules`].
#[derive(Clone, Copy)]
pub struct SignalRule {
    pub id: &'static str,
    pub check: fn(&DerivedRecord, &PeerStatistics) -> Option<Signal>,
}

impl std::fmt::Debug for SignalRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRule").field("id", &self.id).finish()
    }
}

pub const REVENUE_GROWTH_THRESHOLD: Decimal = dec!(0.10);
pub const MARGIN_PREMIUM_THRESHOLD: Decimal = dec!(0.05);
pub const ROIC_PREMIUM_FACTOR: Decimal = dec!(1.2);
pub const RECEIVABLES_RATIO_THRESHOLD: Decimal = dec!(0.25);
pub const CCC_DAYS_THRESHOLD: Decimal = dec!(90);

pub const DEFAULT_RULES: [SignalRule; 6] = [
    SignalRule {
        id: "revenue_growth",
        check: revenue_growth,
    },
    SignalRule {
        id: "margin_premium",
        check: margin_premium,
    },
    SignalRule {
        id: "roic_premium",
        check: roic_premium,
    },
    SignalRule {
        id: "negative_fcf",
        check: negative_fcf,
    },
    SignalRule {
        id: "receivables_build",
        check: receivables_build,
    },
    SignalRule {
        id: "long_cash_cycle",
        check: long_cash_cycle,
    },
];

/// Evaluate the default rule set.
pub fn evaluate_signals(record: &DerivedRecord, peers: &PeerStatistics) -> Vec<Signal> {
    evaluate_with_rules(&DEFAULT_RULES, record, peers)
}

/// Evaluate an arbitrary rule set in order.
pub fn evaluate_with_rules(
    rules: &[SignalRule],
    record: &DerivedRecord,
    peers: &PeerStatistics,
) -> Vec<Signal> {
    rules
        .iter()
        .filter_map(|rule| (rule.check)(record, peers))
        .collect()
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Percentage points rounded to one decimal for display.
fn pct(v: Decimal) -> Decimal {
    v.saturating_mul(dec!(100)).round_dp(1)
}

fn revenue_growth(rec: &DerivedRecord, _: &PeerStatistics) -> Option<Signal> {
    let yoy = rec.rev_yoy?;
    (yoy > REVENUE_GROWTH_THRESHOLD).then(|| {
        Signal::new(
            "revenue_growth",
            "Double-digit revenue growth",
            format!("YoY {:.1}%", pct(yoy)),
            dec!(0.7),
            SignalKind::Strength,
        )
    })
}

fn margin_premium(rec: &DerivedRecord, peers: &PeerStatistics) -> Option<Signal> {
    let own = rec.ebit_margin?;
    let median = peers.median(PeerMetric::EbitMargin)?;
    let premium = own.checked_sub(median)?;
    (premium >= MARGIN_PREMIUM_THRESHOLD).then(|| {
        Signal::new(
            "margin_premium",
            "Profitability above peers",
            format!(
                "EBIT margin {:.1}% vs peer median {:.1}%",
                pct(own),
                pct(median)
            ),
            dec!(0.8),
            SignalKind::Strength,
        )
    })
}

fn roic_premium(rec: &DerivedRecord, peers: &PeerStatistics) -> Option<Signal> {
    let own = rec.roic?;
    let median = peers.median(PeerMetric::Roic)?;
    (own > median.saturating_mul(ROIC_PREMIUM_FACTOR)).then(|| {
        Signal::new(
            "roic_premium",
            "Superior capital efficiency",
            format!("ROIC {:.1}% (peer median {:.1}%)", pct(own), pct(median)),
            dec!(0.9),
            SignalKind::Strength,
        )
    })
}

fn negative_fcf(rec: &DerivedRecord, _: &PeerStatistics) -> Option<Signal> {
    let fcf = rec.fcf_ttm?;
    (fcf < Decimal::ZERO).then(|| {
        Signal::new(
            "negative_fcf",
            "Negative free cash flow",
            "Trailing four-quarter FCF is negative".to_string(),
            dec!(0.6),
            SignalKind::Risk,
        )
    })
}

fn receivables_build(rec: &DerivedRecord, _: &PeerStatistics) -> Option<Signal> {
    let ratio = margin(rec.record.receivables, rec.record.revenue)?;
    (ratio > RECEIVABLES_RATIO_THRESHOLD).then(|| {
        Signal::new(
            "receivables_build",
            "Elevated receivables",
            format!("Receivables/Revenue ≈ {:.2}", ratio.round_dp(2)),
            dec!(0.5),
            SignalKind::Risk,
        )
    })
}

fn long_cash_cycle(rec: &DerivedRecord, _: &PeerStatistics) -> Option<Signal> {
    let ccc = rec.ccc?;
    (ccc > CCC_DAYS_THRESHOLD).then(|| {
        Signal::new(
            "long_cash_cycle",
            "Stretched cash conversion cycle",
            format!("CCC ≈ {:.0} days", ccc.round_dp(0)),
            dec!(0.6),
            SignalKind::Risk,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peers::peer_snapshot;
    use crate::ratios::PeriodRecord;

    fn peers_with(ebit_margin: Decimal, roic: Decimal) -> PeerStatistics {
        let peer = DerivedRecord {
            ebit_margin: Some(ebit_margin),
            roic: Some(roic),
            ..Default::default()
        };
        peer_snapshot(&[Some(peer)])
    }

    #[test]
    fn test_no_inputs_no_signals() {
        let signals = evaluate_signals(&DerivedRecord::default(), &PeerStatistics::default());
        assert!(signals.is_empty());
    }

    #[test]
    fn test_revenue_growth_boundary() {
        let mut rec = DerivedRecord {
            rev_yoy: Some(dec!(0.10)),
            ..Default::default()
        };
        assert!(revenue_growth(&rec, &PeerStatistics::default()).is_none());
        rec.rev_yoy = Some(dec!(0.125));
        let sig = revenue_growth(&rec, &PeerStatistics::default()).unwrap();
        assert_eq!(sig.detail, "YoY 12.5%");
        assert_eq!(sig.weight, dec!(0.7));
    }

    #[test]
    fn test_margin_premium_inclusive_at_five_points() {
        let rec = DerivedRecord {
            ebit_margin: Some(dec!(0.20)),
            ..Default::default()
        };
        assert!(margin_premium(&rec, &peers_with(dec!(0.15), dec!(0.1))).is_some());
        assert!(margin_premium(&rec, &peers_with(dec!(0.16), dec!(0.1))).is_none());
    }

    #[test]
    fn test_margin_premium_needs_peer_median() {
        let rec = DerivedRecord {
            ebit_margin: Some(dec!(0.50)),
            ..Default::default()
        };
        assert!(margin_premium(&rec, &PeerStatistics::default()).is_none());
    }

    #[test]
    fn test_roic_premium() {
        let rec = DerivedRecord {
            roic: Some(dec!(0.13)),
            ..Default::default()
        };
        assert!(roic_premium(&rec, &peers_with(dec!(0.1), dec!(0.1))).is_some());
        assert!(roic_premium(&rec, &peers_with(dec!(0.1), dec!(0.11))).is_none());
    }

    #[test]
    fn test_risk_rules() {
        let rec = DerivedRecord {
            record: PeriodRecord {
                revenue: Some(dec!(100)),
                receivables: Some(dec!(30)),
                ..PeriodRecord::new("2024-Q1")
            },
            fcf_ttm: Some(dec!(-5)),
            ccc: Some(dec!(95)),
            ..Default::default()
        };
        let signals = evaluate_signals(&rec, &PeerStatistics::default());
        let rules: Vec<&str> = signals.iter().map(|s| s.rule.as_str()).collect();
        assert_eq!(
            rules,
            vec!["negative_fcf", "receivables_build", "long_cash_cycle"]
        );
        assert!(signals.iter().all(|s| s.kind == SignalKind::Risk));
        assert_eq!(signals[1].detail, "Receivables/Revenue ≈ 0.30");
        assert_eq!(signals[2].detail, "CCC ≈ 95 days");
    }

    #[test]
    fn test_custom_rule_set() {
        fn always(_: &DerivedRecord, _: &PeerStatistics) -> Option<Signal> {
            Some(Signal::new(
                "always",
                "Always",
                String::new(),
                dec!(0.1),
                SignalKind::Strength,
            ))
        }
        let rules = [SignalRule {
            id: "always",
            check: always,
        }];
        let signals =
            evaluate_with_rules(&rules, &DerivedRecord::default(), &PeerStatistics::default());
        assert_eq!(signals.len(), 1);
    }
}
