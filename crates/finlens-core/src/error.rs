use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinLensError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Duplicate period: {0} appears more than once in the history")]
    DuplicatePeriod(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinLensError {
    fn from(e: serde_json::Error) -> Self {
        FinLensError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message() {
        let err = FinLensError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: "Must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid input: shares_outstanding — Must be positive"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: FinLensError = parse.unwrap_err().into();
        assert!(matches!(err, FinLensError::SerializationError(_)));
    }
}
