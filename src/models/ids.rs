//! Strongly-typed ID wrappers for all entity types
//!
//! IDs are prefixed strings (`bdg_…`, `bpd_…`, `exp_…`, `trx_…`). Newtype
//! wrappers prevent mixing up IDs from different entity types at compile
//! time. New IDs are minted through an injected [`IdGenerator`] rather than a
//! global.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of fresh identifiers
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier of the form `{prefix}_{unique}`
    fn generate(&self, prefix: &str) -> String;
}

/// Random UUIDv4-backed generator for production use
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, Uuid::new_v4().simple())
    }
}

/// Deterministic counter-backed generator (`bdg_1`, `bdg_2`, ...)
#[derive(Debug)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequenceGenerator {
    fn generate(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", prefix, n)
    }
}

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix every ID of this type starts with
            pub const PREFIX: &'static str = $prefix;

            /// Wrap an existing identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mint a new identifier
            pub fn generate(ids: &dyn IdGenerator) -> Self {
                Self(ids.generate($prefix))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Check the `{prefix}_{suffix}` shape
            pub fn is_valid(&self) -> bool {
                self.0
                    .strip_prefix(concat!($prefix, "_"))
                    .is_some_and(|rest| {
                        !rest.is_empty()
                            && rest
                                .chars()
                                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(BudgetId, "bdg");
define_id!(BudgetPeriodId, "bpd");
define_id!(ExpenseId, "exp");
define_id!(TransactionId, "trx");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_generator_prefixes() {
        let id = BudgetId::generate(&UuidGenerator);
        assert!(id.as_str().starts_with("bdg_"));
        assert!(id.is_valid());
        assert_eq!(id.as_str().len(), 4 + 32);
    }

    #[test]
    fn test_uuid_generator_unique() {
        let a = TransactionId::generate(&UuidGenerator);
        let b = TransactionId::generate(&UuidGenerator);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequence_generator() {
        let ids = SequenceGenerator::new();
        assert_eq!(BudgetId::generate(&ids).as_str(), "bdg_1");
        assert_eq!(BudgetPeriodId::generate(&ids).as_str(), "bpd_2");
        assert_eq!(ExpenseId::generate(&ids).as_str(), "exp_3");
    }

    #[test]
    fn test_validity() {
        assert!(BudgetId::new("bdg_1").is_valid());
        assert!(!BudgetId::new("bdg_").is_valid());
        assert!(!BudgetId::new("").is_valid());
        assert!(!BudgetId::new("trx_1").is_valid());
        assert!(!BudgetId::new("bdg_1 2").is_valid());
    }

    #[test]
    fn test_id_serialization() {
        let id = BudgetId::new("bdg_42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"bdg_42\"");
        let deserialized: BudgetId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
