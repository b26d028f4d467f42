//! Expense service
//!
//! Posts expenses as transactions against the period their date falls in,
//! and applies masked updates to posted expense transactions.

use tracing::{debug, info};

use super::budget::BudgetService;
use super::currency::CurrencyService;
use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::fieldmask::FieldMask;
use crate::models::{
    BudgetPeriod, ExchangeRate, Expense, IdGenerator, Transaction, TransactionId,
};
use crate::storage::{Storage, TransactionFilter};

/// Service for recording and maintaining expenses
pub struct ExpenseService<'a> {
    storage: &'a Storage,
    ids: &'a dyn IdGenerator,
}

impl<'a> ExpenseService<'a> {
    pub fn new(storage: &'a Storage, ids: &'a dyn IdGenerator) -> Self {
        Self { storage, ids }
    }

    /// Record an expense and return the posted transaction
    ///
    /// The expense is posted to its budget's period for the month of its
    /// effective date; the period is created if needed. The expense must be
    /// in the budget's currency or carry none. Unless it has its own rate,
    /// the currency's current rate is used.
    pub fn record(&self, mut expense: Expense) -> LedgerResult<Transaction> {
        expense.initialize(self.ids)?;
        expense.validate_for_create()?;

        let budgets = BudgetService::new(self.storage, self.ids);
        let budget = budgets.require(&expense.budget_id)?;

        let at = expense
            .operation
            .effective_at()
            .ok_or_else(|| LedgerError::Validation("date is required".into()))?;
        let period = budgets.ensure_period(&budget, at)?;
        let rate = self.rate_for(&expense, &period)?;

        let trx = expense.transaction(&period, &rate, self.ids)?;
        self.storage.transactions.store(&trx)?;
        self.storage.log_create(
            EntityType::Transaction,
            trx.id.to_string(),
            Some(trx.title.clone()),
            &trx,
        )?;

        info!(
            expense = %expense.id,
            transaction = %trx.id,
            period = %period.id,
            amount = %trx.amount,
            base = %trx.base_amount,
            "expense recorded"
        );
        Ok(trx)
    }

    /// Apply the masked fields of `expense` to a posted expense transaction
    ///
    /// The new date must stay within the transaction's period.
    pub fn update(&self, id: &TransactionId, expense: &Expense, mask: &FieldMask) -> LedgerResult<Transaction> {
        let mut trx = self.require(id)?;
        let before = trx.clone();

        expense.update_transaction(&mut trx, mask)?;

        if trx.date != before.date {
            let period = self.period_of(&trx)?;
            if !period.contains(trx.date) {
                return Err(LedgerError::Validation(format!(
                    "transaction date must stay within period {}",
                    period.month()
                )));
            }
        }

        self.storage.transactions.store(&trx)?;
        self.storage.log_update(
            EntityType::Transaction,
            trx.id.to_string(),
            Some(trx.title.clone()),
            &before,
            &trx,
        )?;

        debug!(transaction = %trx.id, mask = ?mask.paths(), "expense updated");
        Ok(trx)
    }

    pub fn delete(&self, id: &TransactionId) -> LedgerResult<Transaction> {
        let trx = self.require(id)?;
        self.storage.transactions.delete(&trx.id)?;
        self.storage.log_delete(
            EntityType::Transaction,
            trx.id.to_string(),
            Some(trx.title.clone()),
            &trx,
        )?;
        info!(transaction = %trx.id, "expense deleted");
        Ok(trx)
    }

    pub fn get(&self, id: &TransactionId) -> LedgerResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Expense transactions matching `filter`, newest first
    pub fn list(&self, filter: &TransactionFilter) -> LedgerResult<Vec<Transaction>> {
        Ok(self
            .storage
            .transactions
            .list(filter)?
            .into_iter()
            .filter(Transaction::is_expense)
            .collect())
    }

    fn require(&self, id: &TransactionId) -> LedgerResult<Transaction> {
        self.get(id)?
            .filter(Transaction::is_expense)
            .ok_or_else(|| LedgerError::transaction_not_found(id.as_str()))
    }

    fn period_of(&self, trx: &Transaction) -> LedgerResult<BudgetPeriod> {
        let id = trx.budget_period_id.as_ref().ok_or_else(|| {
            LedgerError::InvalidArgument(format!("transaction {} has no budget period", trx.id))
        })?;
        self.storage
            .periods
            .get(id)?
            .ok_or_else(|| LedgerError::period_not_found(id.as_str()))
    }

    fn rate_for(&self, expense: &Expense, period: &BudgetPeriod) -> LedgerResult<ExchangeRate> {
        let code = period.amount.currency();
        match expense.operation.exchange_rate {
            Some(custom) => Ok(ExchangeRate::new(
                code.clone(),
                custom,
                code == period.base_amount.currency(),
            )),
            None => CurrencyService::new(self.storage).exchange_rate(code),
        }
    }
}
