//! Domain errors for value object construction.

use thiserror::Error;

/// Errors raised when raw input cannot become a domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Invalid value for a field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl DomainError {
    /// Build an `InvalidValue` error for a field.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Name of the offending field.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidValue { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = DomainError::invalid("symbol", "Symbol cannot be empty");
        assert_eq!(
            err.to_string(),
            "Invalid value for symbol: Symbol cannot be empty"
        );
        assert_eq!(err.field(), "symbol");
    }
}
