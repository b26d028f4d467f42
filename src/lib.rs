//! Budget Ledger - multi-currency budget periods and spending insights
//!
//! This library keeps monthly snapshots of budgets consistent with changing
//! exchange rates, posts expenses as transactions in the base currency, and
//! rolls spending up into per-budget and per-period insights.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Data directory resolution and persisted settings
//! - `error`: Custom error types
//! - `fieldmask`: Field masks and update schemas for partial updates
//! - `models`: Core data models (budgets, periods, expenses, insights, etc.)
//! - `storage`: Store traits and the JSON file implementation
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `log`: Diagnostic logging setup
//!
//! # Example
//!
//! ```rust,ignore
//! use budget_ledger::config::{LedgerPaths, Settings};
//! use budget_ledger::models::UuidGenerator;
//! use budget_ledger::services::BudgetService;
//! use budget_ledger::storage::Storage;
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(&paths, settings)?;
//! let budgets = BudgetService::new(&storage, &UuidGenerator);
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod fieldmask;
pub mod log;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
