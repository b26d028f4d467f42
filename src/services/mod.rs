//! Service layer for the budget ledger
//!
//! Services orchestrate the models over the storage layer: they resolve
//! currencies and periods, enforce cross-entity rules, and record every
//! change in the audit log.

pub mod budget;
pub mod currency;
pub mod expense;
pub mod insights;
pub mod period;

pub use budget::BudgetService;
pub use currency::{CurrencyService, CurrencyUpdate};
pub use expense::ExpenseService;
pub use insights::InsightsService;
pub use period::PeriodService;
