//! Diagnostic logging setup
//!
//! Installs a `tracing-subscriber` registry for the crate's `tracing`
//! events. `RUST_LOG` takes precedence over the verbosity flag.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt, EnvFilter,
};

use crate::config::Settings;
use crate::error::{LedgerError, LedgerResult};

/// Install the global subscriber at the verbosity stored in `settings`
pub fn init_logging_from(settings: &Settings) -> LedgerResult<()> {
    init_logging(settings.verbose_logging)
}

/// Install the global subscriber
///
/// Fails if a global subscriber is already set.
pub fn init_logging(verbose: bool) -> LedgerResult<()> {
    let (level_filter, level) = levels(verbose);
    let app_filter = Targets::new().with_target("budget_ledger", level_filter);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .try_init()
        .map_err(|e| LedgerError::Config(format!("Failed to initialize logging: {}", e)))
}

fn levels(verbose: bool) -> (LevelFilter, &'static str) {
    if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::OFF, "off")
    }
}
