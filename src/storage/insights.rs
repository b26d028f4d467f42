//! Spending series read model
//!
//! Joins stored periods with the expense transactions posted to them. Each
//! row compares a period's base amount with the base amounts spent in it,
//! so every row is expressed in the base currency.

use std::sync::Arc;

use super::query::{InsightsFilter, TransactionFilter};
use super::{BudgetPeriodStore, BudgetStore, InsightsStore, TransactionStore};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Budget, BudgetPeriod, Money, SpendingSeries};

pub struct LedgerInsights {
    budgets: Arc<dyn BudgetStore>,
    periods: Arc<dyn BudgetPeriodStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl LedgerInsights {
    pub fn new(
        budgets: Arc<dyn BudgetStore>,
        periods: Arc<dyn BudgetPeriodStore>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            budgets,
            periods,
            transactions,
        }
    }

    fn series_for(&self, budget: &Budget, period: &BudgetPeriod) -> LedgerResult<SpendingSeries> {
        let posted = self
            .transactions
            .list(&TransactionFilter::for_period(period.id.clone()))?;

        let mut spent = Money::zero(period.base_amount.currency().clone());
        let mut count = 0;
        for trx in posted.iter().filter(|t| t.is_expense()) {
            spent = spent
                .checked_add(&trx.base_amount)
                .map_err(|e| LedgerError::conversion("cannot total spending in base currency", e))?;
            count += 1;
        }

        Ok(SpendingSeries {
            budget_id: budget.id.clone(),
            budget_name: budget.name.clone(),
            period: period.month().to_string(),
            period_start: period.start_date,
            period_end: period.end_date,
            budgeted: period.base_amount.clone(),
            spent,
            count,
        })
    }
}

impl InsightsStore for LedgerInsights {
    /// One row per (budget, period) overlapping the window, including
    /// periods with nothing spent
    fn get_spending_series(&self, filter: &InsightsFilter) -> LedgerResult<Vec<SpendingSeries>> {
        let mut rows = Vec::new();
        for budget in self.budgets.list()? {
            if !filter.includes_budget(&budget.id) {
                continue;
            }
            for period in self.periods.list_for_budget(&budget.id)? {
                if filter.overlaps(&period) {
                    rows.push(self.series_for(&budget, &period)?);
                }
            }
        }
        Ok(rows)
    }
}
