//! Custom error types for the budget ledger
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

use crate::models::money::MoneyError;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed or missing fields, unknown mask paths, non-positive amounts
    #[error("Validation error: {0}")]
    Validation(String),

    /// Programmer errors surfaced explicitly (uninitialized entity, mismatched IDs)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Currency conversion failures, wrapped with operation context
    #[error("{context}: {source}")]
    Conversion {
        context: String,
        #[source]
        source: MoneyError,
    },

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Wrap a money-layer failure with the operation that triggered it
    pub fn conversion(context: impl Into<String>, source: MoneyError) -> Self {
        Self::Conversion {
            context: context.into(),
            source,
        }
    }

    /// Create a "not found" error for budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for budget periods
    pub fn period_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "BudgetPeriod",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for currencies
    pub fn currency_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Currency",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an invariant violation
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a conversion error
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
