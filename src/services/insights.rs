//! Spending insights service

use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::models::SpendingInsights;
use crate::storage::{InsightsFilter, Storage};

pub struct InsightsService<'a> {
    storage: &'a Storage,
}

impl<'a> InsightsService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Roll up spending for every period overlapping the filter window
    pub fn spending(&self, filter: &InsightsFilter) -> LedgerResult<SpendingInsights> {
        if filter.from > filter.to {
            return Err(LedgerError::Validation(format!(
                "insights window starts after it ends ({} > {})",
                filter.from.format("%Y-%m-%d"),
                filter.to.format("%Y-%m-%d")
            )));
        }

        let rows = self.storage.insights.get_spending_series(filter)?;
        let insights = SpendingInsights::from_series(&rows)?;

        debug!(
            rows = rows.len(),
            budgets = insights.by_budget.len(),
            periods = insights.trends.len(),
            "spending insights aggregated"
        );
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LedgerPaths, Settings};
    use crate::models::{CurrencyCode, Expense, Money, Month, Operation, SequenceGenerator};
    use crate::services::{BudgetService, CurrencyService, ExpenseService};
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(&paths, Settings::default()).unwrap();
        (temp_dir, storage)
    }

    fn this_month() -> InsightsFilter {
        let month = Month::containing(Utc::now());
        InsightsFilter::new(month.start().unwrap(), month.end().unwrap())
    }

    #[test_log::test]
    fn test_empty_ledger() {
        let (_temp, storage) = create_test_storage();
        let insights = InsightsService::new(&storage).spending(&this_month()).unwrap();
        assert_eq!(insights.summary.count, 0);
        assert!(insights.by_budget.is_empty());
        assert!(insights.trends.is_empty());
    }

    #[test_log::test]
    fn test_rejects_inverted_window() {
        let (_temp, storage) = create_test_storage();
        let now = Utc::now();
        let filter = InsightsFilter::new(now, now - Duration::days(1));
        assert!(InsightsService::new(&storage)
            .spending(&filter)
            .unwrap_err()
            .is_validation());
    }

    #[test_log::test]
    fn test_spending_in_base_currency() {
        let (_temp, storage) = create_test_storage();
        let ids = SequenceGenerator::new();
        CurrencyService::new(&storage)
            .upsert("EUR", "Euro", "1.10".parse().unwrap())
            .unwrap();

        let budgets = BudgetService::new(&storage, &ids);
        let food = budgets
            .create("Food", Money::new(20000, CurrencyCode::base()))
            .unwrap();
        let travel = budgets
            .create("Travel", Money::new(10000, CurrencyCode::new("EUR")))
            .unwrap();
        // Idle budget still reports its period once one exists
        let idle = budgets
            .create("Idle", Money::new(5000, CurrencyCode::base()))
            .unwrap();
        budgets.ensure_period(&idle, Utc::now()).unwrap();

        let expenses = ExpenseService::new(&storage, &ids);
        for (budget, cents) in [(&food, 5000), (&food, 2500)] {
            expenses
                .record(Expense::new(
                    budget.id.clone(),
                    Operation::new("Market", Money::new(cents, CurrencyCode::default()), Utc::now()),
                ))
                .unwrap();
        }
        expenses
            .record(Expense::new(
                travel.id.clone(),
                Operation::new("Train ticket", Money::new(4000, CurrencyCode::new("EUR")), Utc::now()),
            ))
            .unwrap();

        let insights = InsightsService::new(&storage).spending(&this_month()).unwrap();

        assert_eq!(insights.summary.count, 3);
        assert_eq!(insights.summary.spent, Money::new(7500 + 4400, CurrencyCode::base()));
        assert_eq!(
            insights.summary.budgeted,
            Money::new(20000 + 11000 + 5000, CurrencyCode::base())
        );

        let travel_row = insights.budget(&travel.id).unwrap();
        assert_eq!(travel_row.totals.spent.cents(), 4400);
        assert!((travel_row.totals.usage() - 40.0).abs() < 1e-9);

        let idle_row = insights.budget(&idle.id).unwrap();
        assert_eq!(idle_row.totals.count, 0);
        assert_eq!(idle_row.totals.remaining().cents(), 5000);

        assert_eq!(insights.trends.len(), 1);
        assert_eq!(insights.trends[0].budgets.len(), 3);
    }

    #[test_log::test]
    fn test_budget_subset() {
        let (_temp, storage) = create_test_storage();
        let ids = SequenceGenerator::new();
        let budgets = BudgetService::new(&storage, &ids);
        let food = budgets
            .create("Food", Money::new(20000, CurrencyCode::base()))
            .unwrap();
        let rent = budgets
            .create("Rent", Money::new(90000, CurrencyCode::base()))
            .unwrap();
        budgets.ensure_period(&food, Utc::now()).unwrap();
        budgets.ensure_period(&rent, Utc::now()).unwrap();

        let filter = this_month().with_budgets([rent.id.clone()]);
        let insights = InsightsService::new(&storage).spending(&filter).unwrap();
        assert_eq!(insights.by_budget.len(), 1);
        assert!(insights.budget(&food.id).is_none());
        assert_eq!(insights.summary.budgeted.cents(), 90000);
    }
}
