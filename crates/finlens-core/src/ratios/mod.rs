pub mod derivation;
pub mod records;

pub use derivation::{derive_ratios, derive_ratios_with, DerivationConfig};
pub use records::{sort_history, DerivedRecord, PeriodRecord};
