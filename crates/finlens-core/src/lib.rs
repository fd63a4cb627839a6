pub mod config;
pub mod error;
pub mod metrics;
pub mod peers;
pub mod ratios;
pub mod types;

#[cfg(feature = "anomaly")]
pub mod anomaly;

#[cfg(feature = "insights")]
pub mod insights;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use config::AnalysisConfig;
pub use error::FinLensError;
pub use types::*;

/// Standard result type for all finlens computations
pub type FinLensResult<T> = Result<T, FinLensError>;
