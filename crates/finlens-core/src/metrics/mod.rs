pub mod kernel;

pub use kernel::{
    ccc, days_ratio, growth_rate, invested_capital, margin, roic, ttm, DEFAULT_DAYS_PER_PERIOD,
};
