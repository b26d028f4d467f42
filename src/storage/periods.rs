//! Budget period repository backed by periods.json

use std::path::PathBuf;

use super::table::JsonTable;
use super::BudgetPeriodStore;
use crate::error::LedgerResult;
use crate::models::{BudgetId, BudgetPeriod, BudgetPeriodId, Month};

pub struct PeriodRepository {
    table: JsonTable<BudgetPeriodId, BudgetPeriod>,
}

impl PeriodRepository {
    pub fn open(path: PathBuf) -> LedgerResult<Self> {
        Ok(Self {
            table: JsonTable::open(path, |p: &BudgetPeriod| p.id.clone())?,
        })
    }
}

impl BudgetPeriodStore for PeriodRepository {
    fn get(&self, id: &BudgetPeriodId) -> LedgerResult<Option<BudgetPeriod>> {
        self.table.get(id)
    }

    fn list(&self) -> LedgerResult<Vec<BudgetPeriod>> {
        let mut periods = self.table.select(|_| true)?;
        periods.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.budget_id.cmp(&b.budget_id)));
        Ok(periods)
    }

    fn list_for_budget(&self, budget_id: &BudgetId) -> LedgerResult<Vec<BudgetPeriod>> {
        let mut periods = self.table.select(|p| &p.budget_id == budget_id)?;
        periods.sort_by_key(|p| p.start_date);
        Ok(periods)
    }

    fn find_for_month(&self, budget_id: &BudgetId, month: Month) -> LedgerResult<Option<BudgetPeriod>> {
        Ok(self
            .table
            .select(|p| &p.budget_id == budget_id && p.month() == month)?
            .into_iter()
            .next())
    }

    fn store(&self, period: &BudgetPeriod) -> LedgerResult<()> {
        self.table.upsert(period.clone())
    }

    fn delete_for_budget(&self, budget_id: &BudgetId) -> LedgerResult<Vec<BudgetPeriod>> {
        self.table.remove_where(|p| &p.budget_id == budget_id)
    }
}
