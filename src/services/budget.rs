//! Budget service
//!
//! Provides business logic for budget management: creation in a known
//! currency, masked updates that flow into the current period, and deletes
//! guarded by posted transactions.

use chrono::{DateTime, Utc};
use tracing::info;

use super::currency::CurrencyService;
use super::period::PeriodService;
use crate::audit::{AuditEntry, EntityType};
use crate::error::{LedgerError, LedgerResult};
use crate::fieldmask::FieldMask;
use crate::models::{Budget, BudgetId, BudgetPeriod, IdGenerator, Money, Month};
use crate::storage::{Storage, TransactionCriteria};

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
    ids: &'a dyn IdGenerator,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage, ids: &'a dyn IdGenerator) -> Self {
        Self { storage, ids }
    }

    /// Create a new budget
    ///
    /// An amount without a currency takes the configured default currency.
    /// The currency must be known (or be the base currency).
    pub fn create(&self, name: &str, amount: Money) -> LedgerResult<Budget> {
        let amount = if amount.currency().is_empty() {
            Money::new(amount.cents(), self.storage.settings().default_currency.clone())
        } else {
            amount
        };

        let budget = Budget::create(self.ids, name, amount);
        budget.validate()?;
        self.ensure_unique_name(&budget.name, None)?;
        CurrencyService::new(self.storage).resolve(budget.currency())?;

        self.storage.budgets.store(&budget)?;
        self.storage.log_create(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &budget,
        )?;

        info!(budget = %budget.id, name = %budget.name, amount = %budget.amount, "budget created");
        Ok(budget)
    }

    pub fn get(&self, id: &BudgetId) -> LedgerResult<Option<Budget>> {
        self.storage.budgets.get(id)
    }

    /// Get a budget, failing if it does not exist
    pub fn require(&self, id: &BudgetId) -> LedgerResult<Budget> {
        self.get(id)?
            .ok_or_else(|| LedgerError::budget_not_found(id.as_str()))
    }

    /// Find a budget by name or ID string
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Budget>> {
        if let Some(budget) = self.storage.budgets.find_by_name(identifier)? {
            return Ok(Some(budget));
        }
        self.get(&BudgetId::new(identifier.trim()))
    }

    pub fn list(&self) -> LedgerResult<Vec<Budget>> {
        self.storage.budgets.list()
    }

    /// Apply the masked fields of `other` to a stored budget
    ///
    /// An amount change is pushed into the current month's period, if any.
    pub fn update(&self, id: &BudgetId, other: &Budget, mask: &FieldMask) -> LedgerResult<Budget> {
        let mut budget = self.require(id)?;
        let before = budget.clone();

        budget.update(other, mask)?;
        if budget.name != before.name {
            self.ensure_unique_name(&budget.name, Some(&budget.id))?;
        }

        self.storage.budgets.store(&budget)?;
        self.storage.log_update(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &before,
            &budget,
        )?;

        if budget.amount != before.amount {
            let periods = self.periods();
            periods.sync(&budget, periods.current_month())?;
        }

        info!(budget = %budget.id, mask = ?mask.paths(), "budget updated");
        Ok(budget)
    }

    /// Delete a budget and its periods
    ///
    /// Refused while any transaction references the budget.
    pub fn delete(&self, id: &BudgetId) -> LedgerResult<Budget> {
        let budget = self.require(id)?;

        if self
            .storage
            .transactions
            .exists_by(&TransactionCriteria::budget(budget.id.clone()))?
        {
            return Err(LedgerError::Validation(format!(
                "Cannot delete budget '{}': transactions reference it",
                budget.name
            )));
        }

        let periods = self.storage.periods.delete_for_budget(&budget.id)?;
        self.storage.budgets.delete(&budget.id)?;

        let mut entries: Vec<AuditEntry> = periods
            .iter()
            .map(|p| AuditEntry::deleted(EntityType::BudgetPeriod, p.id.to_string(), None, p))
            .collect();
        entries.push(AuditEntry::deleted(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &budget,
        ));
        self.storage.log_batch(&entries)?;

        info!(budget = %budget.id, periods = periods.len(), "budget deleted");
        Ok(budget)
    }

    /// The budget's period for the month containing `at`, created on demand
    pub fn ensure_period(&self, budget: &Budget, at: DateTime<Utc>) -> LedgerResult<BudgetPeriod> {
        self.periods().ensure(budget, at)
    }

    /// Resync the budget's periods from `since` onward
    pub fn sync_periods(&self, budget: &Budget, since: Month) -> LedgerResult<Vec<BudgetPeriod>> {
        self.periods().sync(budget, since)
    }

    fn periods(&self) -> PeriodService<'a> {
        PeriodService::new(self.storage, self.ids)
    }

    fn ensure_unique_name(&self, name: &str, exclude: Option<&BudgetId>) -> LedgerResult<()> {
        match self.storage.budgets.find_by_name(name)? {
            Some(existing) if Some(&existing.id) != exclude => Err(LedgerError::Validation(
                format!("Budget '{}' already exists", name),
            )),
            _ => Ok(()),
        }
    }
}
