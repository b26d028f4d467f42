//! Transaction repository backed by transactions.json

use std::path::PathBuf;

use super::query::{TransactionCriteria, TransactionFilter};
use super::table::JsonTable;
use super::TransactionStore;
use crate::error::LedgerResult;
use crate::models::{Transaction, TransactionId};

pub struct TransactionRepository {
    table: JsonTable<TransactionId, Transaction>,
}

impl TransactionRepository {
    pub fn open(path: PathBuf) -> LedgerResult<Self> {
        Ok(Self {
            table: JsonTable::open(path, |t: &Transaction| t.id.clone())?,
        })
    }
}

impl TransactionStore for TransactionRepository {
    fn get(&self, id: &TransactionId) -> LedgerResult<Option<Transaction>> {
        self.table.get(id)
    }

    /// Newest first
    fn list(&self, filter: &TransactionFilter) -> LedgerResult<Vec<Transaction>> {
        let mut transactions = self.table.select(|t| filter.matches(t))?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(transactions)
    }

    fn store(&self, trx: &Transaction) -> LedgerResult<()> {
        self.table.upsert(trx.clone())
    }

    fn delete(&self, id: &TransactionId) -> LedgerResult<bool> {
        Ok(self.table.remove(id)?.is_some())
    }

    fn exists_by(&self, criteria: &TransactionCriteria) -> LedgerResult<bool> {
        self.table.any(|t| criteria.matches(t))
    }
}
