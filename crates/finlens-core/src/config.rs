use serde::{Deserialize, Serialize};

#[cfg(feature = "anomaly")]
use crate::anomaly::AnomalyConfig;
use crate::ratios::DerivationConfig;
use crate::FinLensResult;

/// Tunable settings shared by the analysis entry points. Missing sections
/// and fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub derivation: DerivationConfig,
    #[cfg(feature = "anomaly")]
    pub anomaly: AnomalyConfig,
}

impl AnalysisConfig {
    pub fn validate(&self) -> FinLensResult<()> {
        self.derivation.validate()?;
        #[cfg(feature = "anomaly")]
        self.anomaly.validate()?;
        Ok(())
    }

    /// Parse from JSON text.
    pub fn from_json(text: &str) -> FinLensResult<Self> {
        let config: AnalysisConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinLensError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json(r#"{"derivation": {"tax_rate": "0.25"}}"#).unwrap();
        assert_eq!(config.derivation.tax_rate, dec!(0.25));
        assert_eq!(config.derivation.days_per_period, dec!(90));
    }

    #[test]
    fn test_rejects_bad_tax_rate() {
        let err = AnalysisConfig::from_json(r#"{"derivation": {"tax_rate": "1.5"}}"#).unwrap_err();
        assert!(matches!(err, FinLensError::InvalidInput { .. }));
    }

    #[cfg(feature = "anomaly")]
    #[test]
    fn test_rejects_bad_contamination() {
        let err = AnalysisConfig::from_json(r#"{"anomaly": {"contamination": 0.9}}"#).unwrap_err();
        assert!(matches!(err, FinLensError::InvalidInput { ref field, .. } if field == "contamination"));
    }
}
