pub mod snapshot;

pub use snapshot::{peer_snapshot, MetricStatistics, PeerMetric, PeerStatistics};
