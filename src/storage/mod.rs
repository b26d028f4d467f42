//! Storage layer for the budget ledger
//!
//! Services talk to storage through the store traits below. The JSON-file
//! repositories are the bundled implementation: write-through, atomic
//! writes, one file per collection.

pub mod budgets;
pub mod currencies;
pub mod insights;
pub mod periods;
pub mod query;
mod table;
pub mod transactions;

pub use budgets::BudgetRepository;
pub use currencies::CurrencyRepository;
pub use insights::LedgerInsights;
pub use periods::PeriodRepository;
pub use query::{InsightsFilter, TransactionCriteria, TransactionFilter};
pub use transactions::TransactionRepository;

use serde::Serialize;
use std::sync::Arc;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::LedgerPaths;
use crate::config::settings::Settings;
use crate::error::LedgerResult;
use crate::models::{
    Budget, BudgetId, BudgetPeriod, BudgetPeriodId, Currency, CurrencyCode, Month,
    SpendingSeries, Transaction, TransactionId,
};

pub trait BudgetStore: Send + Sync {
    fn get(&self, id: &BudgetId) -> LedgerResult<Option<Budget>>;

    fn list(&self) -> LedgerResult<Vec<Budget>>;

    /// Insert or replace
    fn store(&self, budget: &Budget) -> LedgerResult<()>;

    /// Returns whether a budget was removed
    fn delete(&self, id: &BudgetId) -> LedgerResult<bool>;

    /// Case-insensitive name lookup
    fn find_by_name(&self, name: &str) -> LedgerResult<Option<Budget>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .find(|b| b.name.to_lowercase() == name))
    }
}

pub trait BudgetPeriodStore: Send + Sync {
    fn get(&self, id: &BudgetPeriodId) -> LedgerResult<Option<BudgetPeriod>>;

    fn list(&self) -> LedgerResult<Vec<BudgetPeriod>>;

    /// Periods of one budget, oldest first
    fn list_for_budget(&self, budget_id: &BudgetId) -> LedgerResult<Vec<BudgetPeriod>>;

    fn find_for_month(&self, budget_id: &BudgetId, month: Month) -> LedgerResult<Option<BudgetPeriod>>;

    fn store(&self, period: &BudgetPeriod) -> LedgerResult<()>;

    /// Remove every period of a budget, returning what was removed
    fn delete_for_budget(&self, budget_id: &BudgetId) -> LedgerResult<Vec<BudgetPeriod>>;
}

pub trait CurrencyStore: Send + Sync {
    fn get(&self, code: &CurrencyCode) -> LedgerResult<Option<Currency>>;

    fn list(&self) -> LedgerResult<Vec<Currency>>;

    fn store(&self, currency: &Currency) -> LedgerResult<()>;
}

pub trait TransactionStore: Send + Sync {
    fn get(&self, id: &TransactionId) -> LedgerResult<Option<Transaction>>;

    fn list(&self, filter: &TransactionFilter) -> LedgerResult<Vec<Transaction>>;

    fn store(&self, trx: &Transaction) -> LedgerResult<()>;

    fn delete(&self, id: &TransactionId) -> LedgerResult<bool>;

    fn exists_by(&self, criteria: &TransactionCriteria) -> LedgerResult<bool>;
}

/// Pre-joined spending rows; the aggregator never queries on its own
pub trait InsightsStore: Send + Sync {
    fn get_spending_series(&self, filter: &InsightsFilter) -> LedgerResult<Vec<SpendingSeries>>;
}

/// Main storage coordinator handed to the services
pub struct Storage {
    pub budgets: Arc<dyn BudgetStore>,
    pub periods: Arc<dyn BudgetPeriodStore>,
    pub currencies: Arc<dyn CurrencyStore>,
    pub transactions: Arc<dyn TransactionStore>,
    pub insights: Arc<dyn InsightsStore>,
    audit: AuditLogger,
    settings: Settings,
}

impl Storage {
    /// Open the JSON-file stores under `paths`
    pub fn open(paths: &LedgerPaths, settings: Settings) -> LedgerResult<Self> {
        paths.ensure_directories()?;

        let budgets: Arc<dyn BudgetStore> = Arc::new(BudgetRepository::open(paths.budgets_file())?);
        let periods: Arc<dyn BudgetPeriodStore> =
            Arc::new(PeriodRepository::open(paths.periods_file())?);
        let currencies: Arc<dyn CurrencyStore> =
            Arc::new(CurrencyRepository::open(paths.currencies_file())?);
        let transactions: Arc<dyn TransactionStore> =
            Arc::new(TransactionRepository::open(paths.transactions_file())?);
        let insights: Arc<dyn InsightsStore> = Arc::new(LedgerInsights::new(
            budgets.clone(),
            periods.clone(),
            transactions.clone(),
        ));
        let audit = AuditLogger::new(paths.audit_log()).with_enabled(settings.audit_enabled);

        Ok(Self::from_parts(
            budgets,
            periods,
            currencies,
            transactions,
            insights,
            audit,
            settings,
        ))
    }

    /// Assemble storage from arbitrary store implementations
    pub fn from_parts(
        budgets: Arc<dyn BudgetStore>,
        periods: Arc<dyn BudgetPeriodStore>,
        currencies: Arc<dyn CurrencyStore>,
        transactions: Arc<dyn TransactionStore>,
        insights: Arc<dyn InsightsStore>,
        audit: AuditLogger,
        settings: Settings,
    ) -> Self {
        Self {
            budgets,
            periods,
            currencies,
            transactions,
            insights,
            audit,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> LedgerResult<()> {
        self.audit
            .log(&AuditEntry::created(entity_type, entity_id, entity_name, entity))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> LedgerResult<()> {
        self.audit.log(&AuditEntry::updated(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> LedgerResult<()> {
        self.audit
            .log(&AuditEntry::deleted(entity_type, entity_id, entity_name, entity))
    }

    /// Write a batch of audit entries with a single flush
    pub fn log_batch(&self, entries: &[AuditEntry]) -> LedgerResult<()> {
        self.audit.log_batch(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(&paths, Settings::default()).unwrap();

        assert!(paths.data_dir().exists());
        assert!(storage.budgets.list().unwrap().is_empty());
        assert!(storage.audit().is_enabled());
    }

    #[test]
    fn test_audit_follows_settings() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings {
            audit_enabled: false,
            ..Settings::default()
        };
        let storage = Storage::open(&paths, settings).unwrap();

        storage
            .log_create(EntityType::Settings, "settings", None, storage.settings())
            .unwrap();
        assert!(!paths.audit_log().exists());
    }
}
