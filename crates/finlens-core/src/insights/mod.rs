pub mod commentary;
pub mod signals;
pub mod synthesis;
pub mod trend;

pub use commentary::{multiple_commentary, MarketMultiples};
pub use signals::{
    evaluate_signals, evaluate_with_rules, Signal, SignalKind, SignalRule, DEFAULT_RULES,
};
pub use synthesis::{synthesize, InsightResult};
pub use trend::{
    data_confidence, quality_flags, screen_trend_risks, FlagLevel, QualityFlag, TrendReview,
};
