//! Structured errors for analysis requests
//!
//! Errors never crash the service. Every analyzer entry point returns a
//! `StatResult`, and the transport layer surfaces failures to the client
//! as a single `{"error": message}` object.

use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const COLUMN_NOT_FOUND: &str = "COLUMN_NOT_FOUND";
    pub const INSUFFICIENT_DATA: &str = "INSUFFICIENT_DATA";
    pub const INVALID_OUTCOME: &str = "INVALID_OUTCOME";
    pub const INVALID_TRANSFORM: &str = "INVALID_TRANSFORM";
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    pub const MISSING_PARAMETER: &str = "MISSING_PARAMETER";
    pub const UNKNOWN_VARIANT: &str = "UNKNOWN_VARIANT";
    pub const COMPUTATION_FAILURE: &str = "COMPUTATION_FAILURE";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
}

/// Errors that can occur while validating or running an analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatError {
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),

    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Computation failure: {0}")]
    ComputationFailure(String),

    #[error("CSV parse error: {0}")]
    ParseError(String),
}

impl StatError {
    /// Machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StatError::ColumnNotFound(_) => codes::COLUMN_NOT_FOUND,
            StatError::InsufficientData(_) => codes::INSUFFICIENT_DATA,
            StatError::InvalidOutcome(_) => codes::INVALID_OUTCOME,
            StatError::InvalidTransform(_) => codes::INVALID_TRANSFORM,
            StatError::InvalidInput(_) => codes::INVALID_INPUT,
            StatError::MissingParameter(_) => codes::MISSING_PARAMETER,
            StatError::UnknownVariant { .. } => codes::UNKNOWN_VARIANT,
            StatError::ComputationFailure(_) => codes::COMPUTATION_FAILURE,
            StatError::ParseError(_) => codes::PARSE_ERROR,
        }
    }

    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        StatError::UnknownVariant {
            kind,
            value: value.into(),
        }
    }
}

/// Result type for analysis operations
pub type StatResult<T> = Result<T, StatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StatError::ColumnNotFound("x".into()).code(),
            codes::COLUMN_NOT_FOUND
        );
        assert_eq!(
            StatError::unknown_variant("test_type", "bogus").code(),
            codes::UNKNOWN_VARIANT
        );
    }

    #[test]
    fn test_error_display() {
        let e = StatError::ColumnNotFound("score".into());
        assert_eq!(e.to_string(), "Column 'score' not found in dataset");

        let e = StatError::unknown_variant("transform", "cube");
        assert_eq!(e.to_string(), "Unknown transform: 'cube'");
    }
}
