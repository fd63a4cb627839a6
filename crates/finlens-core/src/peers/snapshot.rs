//! Peer aggregation: reduce the latest derived record of each peer into
//! per-metric mean / population standard deviation / median.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ratios::DerivedRecord;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Metrics aggregated across peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerMetric {
    Revenue,
    Ebit,
    NetIncome,
    EbitMargin,
    NetMargin,
    Roic,
    FcfTtm,
}

impl PeerMetric {
    pub const ALL: [PeerMetric; 7] = [
        PeerMetric::Revenue,
        PeerMetric::Ebit,
        PeerMetric::NetIncome,
        PeerMetric::EbitMargin,
        PeerMetric::NetMargin,
        PeerMetric::Roic,
        PeerMetric::FcfTtm,
    ];

    /// Read this metric off a derived record.
    pub fn value(&self, rec: &DerivedRecord) -> Option<Decimal> {
        match self {
            PeerMetric::Revenue => rec.record.revenue,
            PeerMetric::Ebit => rec.record.operating_income,
            PeerMetric::NetIncome => rec.record.net_income,
            PeerMetric::EbitMargin => rec.ebit_margin,
            PeerMetric::NetMargin => rec.net_margin,
            PeerMetric::Roic => rec.roic,
            PeerMetric::FcfTtm => rec.fcf_ttm,
        }
    }
}

impl std::fmt::Display for PeerMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerMetric::Revenue => write!(f, "revenue"),
            PeerMetric::Ebit => write!(f, "ebit"),
            PeerMetric::NetIncome => write!(f, "net_income"),
            PeerMetric::EbitMargin => write!(f, "ebit_margin"),
            PeerMetric::NetMargin => write!(f, "net_margin"),
            PeerMetric::Roic => write!(f, "roic"),
            PeerMetric::FcfTtm => write!(f, "fcf_ttm"),
        }
    }
}

/// Statistics for one metric. All three are `None` when no peer reported it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub mean: Option<Decimal>,
    /// Population standard deviation (divides by N)
    pub std_dev: Option<Decimal>,
    pub median: Option<Decimal>,
    /// Number of peers that reported this metric
    pub values: usize,
}

/// Aggregated peer benchmarks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerStatistics {
    /// Peers with a usable record, regardless of which metrics they report
    pub count: usize,
    pub metrics: BTreeMap<PeerMetric, MetricStatistics>,
}

impl PeerStatistics {
    pub fn get(&self, metric: PeerMetric) -> Option<&MetricStatistics> {
        self.metrics.get(&metric)
    }

    pub fn mean(&self, metric: PeerMetric) -> Option<Decimal> {
        self.get(metric).and_then(|s| s.mean)
    }

    pub fn std_dev(&self, metric: PeerMetric) -> Option<Decimal> {
        self.get(metric).and_then(|s| s.std_dev)
    }

    pub fn median(&self, metric: PeerMetric) -> Option<Decimal> {
        self.get(metric).and_then(|s| s.median)
    }

    /// `(value - mean) / std`, undefined when std is absent or zero.
    pub fn z_score(&self, metric: PeerMetric, value: Option<Decimal>) -> Option<Decimal> {
        let value = value?;
        let mean = self.mean(metric)?;
        let std = self.std_dev(metric)?;
        if std.is_zero() {
            return None;
        }
        value.checked_sub(mean)?.checked_div(std)
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Aggregate the latest derived record of each peer. Absent entries are
/// skipped and do not count towards `count`.
pub fn peer_snapshot(peers: &[Option<DerivedRecord>]) -> PeerStatistics {
    let present: Vec<&DerivedRecord> = peers.iter().flatten().collect();

    let metrics = PeerMetric::ALL
        .iter()
        .map(|&metric| {
            let values: Vec<Decimal> = present.iter().filter_map(|r| metric.value(r)).collect();
            (metric, describe(&values))
        })
        .collect();

    PeerStatistics {
        count: present.len(),
        metrics,
    }
}

fn describe(values: &[Decimal]) -> MetricStatistics {
    if values.is_empty() {
        return MetricStatistics::default();
    }
    let n = Decimal::from(values.len() as u64);
    let mean = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .and_then(|total| total.checked_div(n));

    // Squared deviations of large absolute figures can leave the decimal
    // range; the spread is then undefined.
    let std_dev = mean.and_then(|m| {
        values
            .iter()
            .try_fold(Decimal::ZERO, |acc, &v| {
                let d = v.checked_sub(m)?;
                acc.checked_add(d.checked_mul(d)?)
            })
            .and_then(|ss| ss.checked_div(n))
            .map(sqrt_decimal)
    });

    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        let (lo, hi) = (sorted[mid - 1], sorted[mid]);
        lo.checked_add(hi)
            .map(|sum| sum / dec!(2))
            .unwrap_or(lo / dec!(2) + hi / dec!(2))
    };

    MetricStatistics {
        mean,
        std_dev,
        median: Some(median),
        values: values.len(),
    }
}

fn sqrt_decimal(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value.sqrt().unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn with_roic(roic: Decimal) -> Option<DerivedRecord> {
        Some(DerivedRecord {
            roic: Some(roic),
            ..Default::default()
        })
    }

    #[test]
    fn test_constant_series_has_zero_std() {
        let peers = vec![with_roic(dec!(10)), with_roic(dec!(10)), with_roic(dec!(10))];
        let stats = peer_snapshot(&peers);
        assert_eq!(stats.mean(PeerMetric::Roic), Some(dec!(10)));
        assert_eq!(stats.std_dev(PeerMetric::Roic), Some(Decimal::ZERO));
    }

    #[test]
    fn test_absent_entries_skipped() {
        let peers = vec![with_roic(dec!(0.1)), with_roic(dec!(0.2)), None];
        let stats = peer_snapshot(&peers);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean(PeerMetric::Roic), Some(dec!(0.15)));
        let std = stats.std_dev(PeerMetric::Roic).unwrap();
        assert!((std - dec!(0.05)).abs() < dec!(0.0000001), "std = {std}");
    }

    #[test]
    fn test_metric_with_no_values_is_undefined() {
        let peers = vec![with_roic(dec!(0.1))];
        let stats = peer_snapshot(&peers);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean(PeerMetric::EbitMargin), None);
        assert_eq!(stats.std_dev(PeerMetric::EbitMargin), None);
        assert_eq!(stats.get(PeerMetric::EbitMargin).unwrap().values, 0);
    }

    #[test]
    fn test_median_even_and_odd() {
        let odd = peer_snapshot(&[with_roic(dec!(3)), with_roic(dec!(1)), with_roic(dec!(2))]);
        assert_eq!(odd.median(PeerMetric::Roic), Some(dec!(2)));

        let even = peer_snapshot(&[
            with_roic(dec!(4)),
            with_roic(dec!(1)),
            with_roic(dec!(2)),
            with_roic(dec!(3)),
        ]);
        assert_eq!(even.median(PeerMetric::Roic), Some(dec!(2.5)));
    }

    #[test]
    fn test_z_score() {
        let stats = peer_snapshot(&[with_roic(dec!(0.1)), with_roic(dec!(0.3))]);
        // mean 0.2, std 0.1
        let z = stats.z_score(PeerMetric::Roic, Some(dec!(0.4))).unwrap();
        assert!((z - dec!(2)).abs() < dec!(0.000001));

        let flat = peer_snapshot(&[with_roic(dec!(0.1)), with_roic(dec!(0.1))]);
        assert_eq!(flat.z_score(PeerMetric::Roic, Some(dec!(0.4))), None);
    }

    #[test]
    fn test_spread_out_of_range_is_undefined() {
        let with_revenue = |revenue: Decimal| {
            let mut rec = DerivedRecord::default();
            rec.record.revenue = Some(revenue);
            Some(rec)
        };
        let huge = Decimal::MAX - Decimal::ONE;
        let stats = peer_snapshot(&[with_revenue(huge), with_revenue(Decimal::ONE)]);
        assert!(stats.mean(PeerMetric::Revenue).is_some());
        assert_eq!(stats.std_dev(PeerMetric::Revenue), None);
        assert_eq!(stats.z_score(PeerMetric::Revenue, Some(Decimal::ONE)), None);
    }

    #[test]
    fn test_empty_peer_set() {
        let stats = peer_snapshot(&[None, None]);
        assert_eq!(stats.count, 0);
        assert!(stats.metrics.values().all(|m| m.mean.is_none()));
    }
}
