//! Configuration module for the budget ledger
//!
//! This module provides configuration management including:
//! - Platform-aware data directory resolution
//! - Persisted settings with field-mask gated updates

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::{Settings, SETTINGS_UPDATE_SCHEMA};
