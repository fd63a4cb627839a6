pub mod assumptions;
pub mod dcf;
pub mod engine;
pub mod health;
pub mod multiples;
pub mod sensitivity;
pub mod wacc;

pub use assumptions::{resolve_base, BaseValues, ValuationAssumptions};
pub use dcf::{effective_terminal_growth, terminal_value, ProjectionYear, TerminalValue};
pub use engine::{
    run_valuation, select_base_record, valuate, ValuationRequest, ValuationResult,
};
pub use health::{financial_health_score, HealthScore, HealthStrength};
pub use multiples::{MultiplesBasis, MultiplesCrossCheck};
pub use sensitivity::SensitivityCell;
pub use wacc::{compute_wacc, WaccBreakdown};
