//! Budget repository backed by budgets.json

use std::path::PathBuf;

use super::table::JsonTable;
use super::BudgetStore;
use crate::error::LedgerResult;
use crate::models::{Budget, BudgetId};

pub struct BudgetRepository {
    table: JsonTable<BudgetId, Budget>,
}

impl BudgetRepository {
    /// Open the repository, loading budgets already on disk
    pub fn open(path: PathBuf) -> LedgerResult<Self> {
        Ok(Self {
            table: JsonTable::open(path, |b: &Budget| b.id.clone())?,
        })
    }
}

impl BudgetStore for BudgetRepository {
    fn get(&self, id: &BudgetId) -> LedgerResult<Option<Budget>> {
        self.table.get(id)
    }

    fn list(&self) -> LedgerResult<Vec<Budget>> {
        let mut budgets = self.table.select(|_| true)?;
        budgets.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(budgets)
    }

    fn store(&self, budget: &Budget) -> LedgerResult<()> {
        self.table.upsert(budget.clone())
    }

    fn delete(&self, id: &BudgetId) -> LedgerResult<bool> {
        Ok(self.table.remove(id)?.is_some())
    }

    fn find_by_name(&self, name: &str) -> LedgerResult<Option<Budget>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .table
            .select(|b| b.name.to_lowercase() == name)?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrencyCode, Money, SequenceGenerator};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BudgetRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = BudgetRepository::open(temp_dir.path().join("budgets.json")).unwrap();
        (temp_dir, repo)
    }

    fn budget(ids: &SequenceGenerator, name: &str) -> Budget {
        Budget::create(ids, name, Money::new(50000, CurrencyCode::base()))
    }

    #[test]
    fn test_store_and_get() {
        let (_temp, repo) = create_test_repo();
        let ids = SequenceGenerator::new();
        let groceries = budget(&ids, "Groceries");

        repo.store(&groceries).unwrap();
        assert_eq!(repo.get(&groceries.id).unwrap(), Some(groceries));
        assert!(repo.get(&BudgetId::new("bdg_99")).unwrap().is_none());
    }

    #[test]
    fn test_list_sorted_by_name() {
        let (_temp, repo) = create_test_repo();
        let ids = SequenceGenerator::new();
        for name in ["rent", "Groceries", "Fuel"] {
            repo.store(&budget(&ids, name)).unwrap();
        }

        let names: Vec<_> = repo.list().unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, ["Fuel", "Groceries", "rent"]);
    }

    #[test]
    fn test_find_by_name_and_delete() {
        let (temp, repo) = create_test_repo();
        let ids = SequenceGenerator::new();
        let groceries = budget(&ids, "Groceries");
        repo.store(&groceries).unwrap();

        assert_eq!(repo.find_by_name(" groceries ").unwrap().unwrap().id, groceries.id);

        assert!(repo.delete(&groceries.id).unwrap());
        assert!(!repo.delete(&groceries.id).unwrap());

        let reopened = BudgetRepository::open(temp.path().join("budgets.json")).unwrap();
        assert!(reopened.list().unwrap().is_empty());
    }
}
