use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field-level validation failure reported back to the caller.
///
/// Validation never fails fast: the engine collects every problem it finds
/// and returns the full list, so the caller can report all of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: String,
    pub message: String,
    pub field: String,
}

impl ValidationError {
    pub fn new(code: &str, message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (field: {})", self.code, self.message, self.field)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("recovery total {total} exceeds gross amount {gross} for loss event {event_id}")]
    RecoveryExceedsGross {
        event_id: String,
        total: Decimal,
        gross: Decimal,
    },

    #[error("loss event {0} is already excluded")]
    AlreadyExcluded(String),

    #[error("exclusion of loss event {0} requires an approval reference")]
    MissingApprovalReference(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// The collected validation errors, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            EngineError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("ENTITY_ID_MISSING", "entity_id is empty", "entity_id");
        assert_eq!(
            err.to_string(),
            "ENTITY_ID_MISSING: entity_id is empty (field: entity_id)"
        );
    }

    #[test]
    fn test_engine_error_counts_validation_errors() {
        let err = EngineError::Validation(vec![
            ValidationError::new("A", "a", "f1"),
            ValidationError::new("B", "b", "f2"),
        ]);
        assert_eq!(err.to_string(), "validation failed with 2 error(s)");
        assert_eq!(err.validation_errors().unwrap().len(), 2);
    }
}
