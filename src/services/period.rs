//! Budget period service
//!
//! Finds, creates and resyncs the monthly snapshots of budgets.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::currency::CurrencyService;
use crate::audit::{AuditEntry, EntityType};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Budget, BudgetId, BudgetPeriod, Currency, IdGenerator, Month};
use crate::storage::Storage;

/// Service for budget period management
pub struct PeriodService<'a> {
    storage: &'a Storage,
    ids: &'a dyn IdGenerator,
}

impl<'a> PeriodService<'a> {
    pub fn new(storage: &'a Storage, ids: &'a dyn IdGenerator) -> Self {
        Self { storage, ids }
    }

    /// The current calendar month (UTC)
    pub fn current_month(&self) -> Month {
        Month::containing(Utc::now())
    }

    /// Parse a month reference
    ///
    /// Accepts `YYYY-MM` as well as `current`, `last` and `next` relative
    /// to the current month.
    pub fn parse_month(&self, s: &str) -> LedgerResult<Month> {
        match s.trim().to_lowercase().as_str() {
            "current" | "now" | "this" => Ok(self.current_month()),
            "last" | "previous" | "prev" => Ok(self.current_month().prev()),
            "next" => Ok(self.current_month().next()),
            other => Month::parse(other)
                .map_err(|_| LedgerError::Validation(format!("Invalid period format: {}", s))),
        }
    }

    pub fn find(&self, budget_id: &BudgetId, month: Month) -> LedgerResult<Option<BudgetPeriod>> {
        self.storage.periods.find_for_month(budget_id, month)
    }

    pub fn list(&self, budget_id: &BudgetId) -> LedgerResult<Vec<BudgetPeriod>> {
        self.storage.periods.list_for_budget(budget_id)
    }

    /// The budget's period for the month containing `at`, created on demand
    /// at the budget currency's current rate
    pub fn ensure(&self, budget: &Budget, at: DateTime<Utc>) -> LedgerResult<BudgetPeriod> {
        let month = Month::containing(at);
        if let Some(period) = self.find(&budget.id, month)? {
            return Ok(period);
        }

        let currency = CurrencyService::new(self.storage).resolve(budget.currency())?;
        let period = budget.create_period(&currency, at, self.ids)?;
        self.storage.periods.store(&period)?;
        self.storage.log_create(
            EntityType::BudgetPeriod,
            period.id.to_string(),
            Some(format!("{} {}", budget.name, month)),
            &period,
        )?;

        debug!(
            budget = %budget.id,
            period = %period.id,
            month = %month,
            base = %period.base_amount,
            "created budget period"
        );
        Ok(period)
    }

    /// Resync the budget's periods from `since` onward with the current rate
    pub fn sync(&self, budget: &Budget, since: Month) -> LedgerResult<Vec<BudgetPeriod>> {
        let currency = CurrencyService::new(self.storage).resolve(budget.currency())?;
        resync_periods(self.storage, budget, &currency, since)
    }
}

/// Recompute and store every period of `budget` starting in or after `since`
pub(crate) fn resync_periods(
    storage: &Storage,
    budget: &Budget,
    currency: &Currency,
    since: Month,
) -> LedgerResult<Vec<BudgetPeriod>> {
    let mut synced = Vec::new();
    let mut entries = Vec::new();

    for mut period in storage.periods.list_for_budget(&budget.id)? {
        if period.month() < since {
            continue;
        }
        let before = period.clone();
        budget.sync_period(&mut period, currency)?;
        storage.periods.store(&period)?;

        if before.base_amount != period.base_amount || before.exchange_rate != period.exchange_rate {
            entries.push(AuditEntry::updated(
                EntityType::BudgetPeriod,
                period.id.to_string(),
                Some(format!("{} {}", budget.name, period.month())),
                &before,
                &period,
            ));
        }
        synced.push(period);
    }

    storage.log_batch(&entries)?;
    if !synced.is_empty() {
        info!(
            budget = %budget.id,
            since = %since,
            periods = synced.len(),
            changed = entries.len(),
            "resynced budget periods"
        );
    }
    Ok(synced)
}
