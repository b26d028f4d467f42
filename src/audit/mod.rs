//! Audit trail for the budget ledger
//!
//! Every create, update and delete performed through the services is
//! recorded as one JSON line with before/after snapshots. Updates carry a
//! short diff summary.
//!
//! ```rust,ignore
//! use budget_ledger::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::updated(
//!     EntityType::Currency,
//!     "EUR",
//!     Some("Euro".to_string()),
//!     &before,
//!     &after,
//! ))?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditAction, AuditEntry, EntityType};
pub use logger::AuditLogger;
