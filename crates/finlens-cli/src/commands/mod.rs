pub mod anomaly;
pub mod insights;
pub mod ratios;
pub mod valuation;
