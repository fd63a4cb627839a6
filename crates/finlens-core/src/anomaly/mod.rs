pub mod detector;
pub mod isolation;
pub mod zscore;

pub use detector::{
    flag_outliers, flag_outliers_report, flag_outliers_with, AnomalyConfig, OutlierFlags,
    OutlierInput,
};
pub use isolation::IsolationForest;
pub use zscore::threshold_flags;
