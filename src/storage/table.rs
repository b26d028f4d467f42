//! Keyed JSON table shared by the file repositories
//!
//! Rows live in a `RwLock<HashMap>` and every mutation is written through to
//! disk as a JSON array ordered by key. The file is replaced by rename, so it
//! always holds a complete table. A failed write rolls the in-memory change
//! back.

use std::collections::HashMap;
use std::fs::{self, File};
use std::hash::Hash;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{LedgerError, LedgerResult};

pub(crate) struct JsonTable<K, V> {
    path: PathBuf,
    rows: RwLock<HashMap<K, V>>,
    key_of: fn(&V) -> K,
}

impl<K, V> JsonTable<K, V>
where
    K: Eq + Hash + Ord + Clone,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Open the table and load any rows already on disk
    pub fn open(path: PathBuf, key_of: fn(&V) -> K) -> LedgerResult<Self> {
        let table = Self {
            path,
            rows: RwLock::new(HashMap::new()),
            key_of,
        };
        table.load()?;
        Ok(table)
    }

    /// Replace the in-memory rows with the file contents
    pub fn load(&self) -> LedgerResult<()> {
        let stored: Vec<V> = read_rows(&self.path)?;
        let mut rows = self.write()?;
        *rows = stored.into_iter().map(|v| ((self.key_of)(&v), v)).collect();
        Ok(())
    }

    pub fn get(&self, key: &K) -> LedgerResult<Option<V>> {
        Ok(self.read()?.get(key).cloned())
    }

    /// Rows matching `keep`, ordered by key
    pub fn select(&self, keep: impl Fn(&V) -> bool) -> LedgerResult<Vec<V>> {
        let rows = self.read()?;
        let mut selected: Vec<(&K, &V)> = rows.iter().filter(|(_, v)| keep(v)).collect();
        selected.sort_by(|a, b| a.0.cmp(b.0));
        Ok(selected.into_iter().map(|(_, v)| v.clone()).collect())
    }

    pub fn any(&self, matches: impl Fn(&V) -> bool) -> LedgerResult<bool> {
        Ok(self.read()?.values().any(matches))
    }

    /// Insert or replace a row
    pub fn upsert(&self, value: V) -> LedgerResult<()> {
        let key = (self.key_of)(&value);
        let mut rows = self.write()?;
        let previous = rows.insert(key.clone(), value);

        if let Err(e) = self.persist(&rows) {
            match previous {
                Some(old) => rows.insert(key, old),
                None => rows.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove every row matching `remove`, returning the removed rows
    pub fn remove_where(&self, remove: impl Fn(&V) -> bool) -> LedgerResult<Vec<V>> {
        let mut rows = self.write()?;
        let keys: Vec<K> = rows
            .iter()
            .filter(|(_, v)| remove(v))
            .map(|(k, _)| k.clone())
            .collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let removed: Vec<(K, V)> = keys
            .into_iter()
            .filter_map(|k| rows.remove(&k).map(|v| (k, v)))
            .collect();

        if let Err(e) = self.persist(&rows) {
            rows.extend(removed);
            return Err(e);
        }
        Ok(removed.into_iter().map(|(_, v)| v).collect())
    }

    pub fn remove(&self, key: &K) -> LedgerResult<Option<V>> {
        let key = key.clone();
        let key_of = self.key_of;
        Ok(self.remove_where(|v| key_of(v) == key)?.pop())
    }

    fn persist(&self, rows: &HashMap<K, V>) -> LedgerResult<()> {
        let mut ordered: Vec<(&K, &V)> = rows.iter().collect();
        ordered.sort_by(|a, b| a.0.cmp(b.0));
        let values: Vec<&V> = ordered.into_iter().map(|(_, v)| v).collect();
        write_rows(&self.path, &values)
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, HashMap<K, V>>> {
        self.rows
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, HashMap<K, V>>> {
        self.rows
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

/// Rows stored at `path`; a missing file is an empty table
fn read_rows<V: DeserializeOwned>(path: &Path) -> LedgerResult<Vec<V>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(storage_error("open", path, e)),
    };
    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_error("parse", path, e))
}

/// Replace the table file with `rows` via a sibling temp file and a rename
fn write_rows<V: Serialize>(path: &Path, rows: &[&V]) -> LedgerResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| storage_error("create directory for", path, e))?;
    }

    let staging = path.with_extension("json.tmp");
    let staged = File::create(&staging)
        .map_err(|e| storage_error("stage", &staging, e))
        .and_then(|file| {
            let mut out = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut out, rows)
                .map_err(|e| storage_error("serialize", path, e))?;
            out.flush().map_err(|e| storage_error("flush", &staging, e))?;
            out.get_ref()
                .sync_all()
                .map_err(|e| storage_error("sync", &staging, e))
        })
        .and_then(|()| fs::rename(&staging, path).map_err(|e| storage_error("replace", path, e)));

    if staged.is_err() {
        let _ = fs::remove_file(&staging);
    }
    staged
}

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;
    use crate::models::CurrencyCode;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn table(dir: &TempDir) -> JsonTable<CurrencyCode, Currency> {
        JsonTable::open(dir.path().join("currencies.json"), |c: &Currency| c.code.clone()).unwrap()
    }

    fn currency(code: &str) -> Currency {
        Currency::new(CurrencyCode::new(code), code, Decimal::ONE)
    }

    #[test]
    fn test_rows_are_written_through() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        t.upsert(currency("GBP")).unwrap();
        t.upsert(currency("EUR")).unwrap();

        let reopened = table(&dir);
        let codes: Vec<_> = reopened
            .select(|_| true)
            .unwrap()
            .into_iter()
            .map(|c| c.code.to_string())
            .collect();
        assert_eq!(codes, ["EUR", "GBP"]);
    }

    #[test]
    fn test_remove_where() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        for code in ["EUR", "GBP", "JPY"] {
            t.upsert(currency(code)).unwrap();
        }

        let removed = t.remove_where(|c| c.code.as_str() != "EUR").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(t.remove(&CurrencyCode::new("CHF")).unwrap().is_none());
        assert_eq!(table(&dir).select(|_| true).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        t.upsert(currency("EUR")).unwrap();

        // A directory where the temp file should go makes the write fail
        std::fs::create_dir(dir.path().join("currencies.json.tmp")).unwrap();
        assert!(t.upsert(currency("GBP")).is_err());
        assert!(t.get(&CurrencyCode::new("GBP")).unwrap().is_none());
        assert!(t.remove(&CurrencyCode::new("EUR")).is_err());
        assert!(t.get(&CurrencyCode::new("EUR")).unwrap().is_some());
    }

    #[test]
    fn test_missing_file_is_empty_table() {
        let dir = TempDir::new().unwrap();
        let t: JsonTable<CurrencyCode, Currency> = JsonTable::open(
            dir.path().join("nested").join("currencies.json"),
            |c: &Currency| c.code.clone(),
        )
        .unwrap();
        assert!(t.select(|_| true).unwrap().is_empty());

        t.upsert(currency("EUR")).unwrap();
        assert!(dir.path().join("nested").join("currencies.json").exists());
        assert!(!dir.path().join("nested").join("currencies.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("currencies.json"), "not json at all").unwrap();

        let err = JsonTable::<CurrencyCode, Currency>::open(
            dir.path().join("currencies.json"),
            |c: &Currency| c.code.clone(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, LedgerError::Storage(_)));
    }
}
