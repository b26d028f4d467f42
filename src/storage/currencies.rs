//! Currency repository backed by currencies.json

use std::path::PathBuf;

use super::table::JsonTable;
use super::CurrencyStore;
use crate::error::LedgerResult;
use crate::models::{Currency, CurrencyCode};

pub struct CurrencyRepository {
    table: JsonTable<CurrencyCode, Currency>,
}

impl CurrencyRepository {
    pub fn open(path: PathBuf) -> LedgerResult<Self> {
        Ok(Self {
            table: JsonTable::open(path, |c: &Currency| c.code.clone())?,
        })
    }
}

impl CurrencyStore for CurrencyRepository {
    fn get(&self, code: &CurrencyCode) -> LedgerResult<Option<Currency>> {
        self.table.get(code)
    }

    fn list(&self) -> LedgerResult<Vec<Currency>> {
        self.table.select(|_| true)
    }

    fn store(&self, currency: &Currency) -> LedgerResult<()> {
        self.table.upsert(currency.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    #[test]
    fn test_store_replaces_by_code() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("currencies.json");
        let repo = CurrencyRepository::open(path.clone()).unwrap();

        let mut eur = Currency::new(CurrencyCode::new("EUR"), "Euro", Decimal::new(108, 2));
        repo.store(&eur).unwrap();
        eur.set_rate(Decimal::new(110, 2));
        repo.store(&eur).unwrap();
        repo.store(&Currency::base("US Dollar")).unwrap();

        let reopened = CurrencyRepository::open(path).unwrap();
        let all = reopened.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].code.as_str(), "EUR");
        assert_eq!(
            reopened.get(&CurrencyCode::new("EUR")).unwrap().unwrap().rate,
            Decimal::new(110, 2)
        );
    }
}
