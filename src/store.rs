//! Persistence: a key-value store contract and the history log on top of it.
//!
//! The engine only ever talks to [`HistoryLog`], which owns the persisted
//! schema (two singleton totals keys plus a zero-padded expense sequence)
//! and exposes `append` / `last_entry` / `remove_last` instead of raw key
//! arithmetic. The backing [`Store`] is SQLite here, but anything honoring
//! the trait contract works.

use crate::error::Result;
use crate::expense::{Balances, Expense};
use crate::ratio::RatioTable;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;

/// A batched write against the store.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Set(String, String),
    Delete(String),
}

/// Minimal key-value contract the ledger persists through.
///
/// `scan` returns values for all keys sharing a prefix, ordered by key.
/// `commit` applies a batch of writes as one unit; the default
/// implementation applies them sequentially, and stores with real
/// transactions should override it.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
    fn count(&self) -> Result<usize>;
    fn scan(&self, prefix: &str) -> Result<Vec<String>>;

    fn commit(&mut self, batch: &[WriteOp]) -> Result<()> {
        for op in batch {
            match op {
                WriteOp::Set(key, value) => self.set(key, value)?,
                WriteOp::Delete(key) => self.delete(key)?,
            }
        }
        Ok(())
    }
}

/// SQLite-backed key-value store with a single `kv` table.
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file and ensures the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SqliteStore> {
        let connection = Connection::open(path)?;
        Self::with_connection(connection)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<SqliteStore> {
        let connection = Connection::open_in_memory()?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<SqliteStore> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SqliteStore { connection })
    }
}

impl Store for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .connection
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.connection.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.connection
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<String>> {
        // keys never contain LIKE wildcards, so plain concatenation is safe
        let mut statement = self
            .connection
            .prepare_cached("SELECT value FROM kv WHERE key LIKE ?1 || '%' ORDER BY key")?;
        let rows = statement.query_map(params![prefix], |row| row.get(0))?;
        let mut values = Vec::new();
        for value in rows {
            values.push(value?);
        }
        Ok(values)
    }

    fn commit(&mut self, batch: &[WriteOp]) -> Result<()> {
        let tx = self.connection.transaction()?;
        for op in batch {
            match op {
                WriteOp::Set(key, value) => {
                    tx.execute(
                        "INSERT INTO kv (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                        params![key, value],
                    )?;
                }
                WriteOp::Delete(key) => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

const KEY_TOTAL_BREAKDOWN: &str = "totals:breakdown";
const KEY_TOTAL_DEBT: &str = "totals:debt";
const EXPENSE_PREFIX: &str = "expense:";

/// The append-only expense history plus the two running totals.
pub struct HistoryLog<S: Store> {
    store: S,
}

impl<S: Store> HistoryLog<S> {
    pub fn new(store: S) -> Self {
        HistoryLog { store }
    }

    /// Writes zero totals for every known user if the store is empty.
    pub fn ensure_seeded(&mut self, ratios: &RatioTable) -> Result<()> {
        if self.store.count()? > 0 {
            return Ok(());
        }
        debug!("seeding empty store with zero totals for {} users", ratios.len());
        let zeros: Balances = ratios
            .users()
            .map(|u| (u.clone(), Decimal::ZERO))
            .collect();
        let encoded = serde_json::to_string(&zeros)?;
        self.store.commit(&[
            WriteOp::Set(KEY_TOTAL_BREAKDOWN.to_string(), encoded.clone()),
            WriteOp::Set(KEY_TOTAL_DEBT.to_string(), encoded),
        ])?;
        Ok(())
    }

    /// Loads `(totalBreakdown, totalDebt)` from the store.
    pub fn load_totals(&self) -> Result<(Balances, Balances)> {
        Ok((
            self.load_balances(KEY_TOTAL_BREAKDOWN)?,
            self.load_balances(KEY_TOTAL_DEBT)?,
        ))
    }

    fn load_balances(&self, key: &str) -> Result<Balances> {
        match self.store.get(key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Balances::new()),
        }
    }

    /// Number of expense records in the history.
    pub fn len(&self) -> Result<usize> {
        Ok(self.store.scan(EXPENSE_PREFIX)?.len())
    }

    /// Returns `true` if no expenses have been recorded.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All expense records in append order.
    pub fn entries(&self) -> Result<Vec<Expense>> {
        let mut expenses = Vec::new();
        for raw in self.store.scan(EXPENSE_PREFIX)? {
            expenses.push(serde_json::from_str(&raw)?);
        }
        Ok(expenses)
    }

    /// The most recent expense record, if any.
    pub fn last_entry(&self) -> Result<Option<Expense>> {
        let values = self.store.scan(EXPENSE_PREFIX)?;
        match values.last() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    /// Appends one expense and persists the updated totals as one commit.
    pub fn append(
        &mut self,
        expense: &Expense,
        total_breakdown: &Balances,
        total_debt: &Balances,
    ) -> Result<()> {
        let index = self.len()?;
        self.store.commit(&[
            WriteOp::Set(Self::expense_key(index), serde_json::to_string(expense)?),
            WriteOp::Set(
                KEY_TOTAL_BREAKDOWN.to_string(),
                serde_json::to_string(total_breakdown)?,
            ),
            WriteOp::Set(KEY_TOTAL_DEBT.to_string(), serde_json::to_string(total_debt)?),
        ])?;
        debug!("appended expense {index}: {}", expense.narration);
        Ok(())
    }

    /// Deletes the most recent expense and persists the restored totals as
    /// one commit. No-op on an empty history.
    pub fn remove_last(
        &mut self,
        total_breakdown: &Balances,
        total_debt: &Balances,
    ) -> Result<()> {
        let count = self.len()?;
        if count == 0 {
            return Ok(());
        }
        self.store.commit(&[
            WriteOp::Delete(Self::expense_key(count - 1)),
            WriteOp::Set(
                KEY_TOTAL_BREAKDOWN.to_string(),
                serde_json::to_string(total_breakdown)?,
            ),
            WriteOp::Set(KEY_TOTAL_DEBT.to_string(), serde_json::to_string(total_debt)?),
        ])?;
        debug!("removed expense {}", count - 1);
        Ok(())
    }

    /// Zero-padded so that key order is append order under prefix scans.
    fn expense_key(index: usize) -> String {
        format!("{EXPENSE_PREFIX}{index:010}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::DebtMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_expense(narration: &str) -> Expense {
        let mut breakdown = Balances::new();
        breakdown.insert("A".to_string(), dec("100"));
        Expense {
            date: "2024-01-01".to_string(),
            narration: narration.to_string(),
            amount: dec("100"),
            breakdown,
            debt: DebtMap::new(),
        }
    }

    fn ratios() -> RatioTable {
        RatioTable::load_tsv("a\t0.5\nb\t0.5\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_kv_roundtrip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v1".to_string()));
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));
        assert_eq!(store.count().unwrap(), 1);
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_scan_returns_prefix_matches_in_key_order() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set("expense:0000000001", "b").unwrap();
        store.set("expense:0000000000", "a").unwrap();
        store.set("totals:debt", "t").unwrap();
        assert_eq!(store.scan("expense:").unwrap(), ["a", "b"]);
        assert_eq!(store.scan("totals:").unwrap(), ["t"]);
        assert!(store.scan("missing:").unwrap().is_empty());
    }

    #[test]
    fn test_commit_applies_batch() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set("gone", "x").unwrap();
        store
            .commit(&[
                WriteOp::Set("a".to_string(), "1".to_string()),
                WriteOp::Set("b".to_string(), "2".to_string()),
                WriteOp::Delete("gone".to_string()),
            ])
            .unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.get("b").unwrap(), Some("2".to_string()));
        assert_eq!(store.get("gone").unwrap(), None);
    }

    #[test]
    fn test_seed_writes_zero_totals_once() {
        let mut log = HistoryLog::new(SqliteStore::open_in_memory().unwrap());
        log.ensure_seeded(&ratios()).unwrap();
        let (breakdown, debt) = log.load_totals().unwrap();
        assert_eq!(breakdown["A"], Decimal::ZERO);
        assert_eq!(breakdown["B"], Decimal::ZERO);
        assert_eq!(debt.len(), 2);

        // a non-empty store is left alone
        let mut tweaked = breakdown.clone();
        tweaked.insert("A".to_string(), dec("5"));
        log.append(&sample_expense("x"), &tweaked, &debt).unwrap();
        log.ensure_seeded(&ratios()).unwrap();
        let (after, _) = log.load_totals().unwrap();
        assert_eq!(after["A"], dec("5"));
    }

    #[test]
    fn test_append_and_last_entry() {
        let mut log = HistoryLog::new(SqliteStore::open_in_memory().unwrap());
        log.ensure_seeded(&ratios()).unwrap();
        assert!(log.is_empty().unwrap());
        assert_eq!(log.last_entry().unwrap(), None);

        let totals = log.load_totals().unwrap();
        log.append(&sample_expense("first"), &totals.0, &totals.1)
            .unwrap();
        log.append(&sample_expense("second"), &totals.0, &totals.1)
            .unwrap();

        assert_eq!(log.len().unwrap(), 2);
        assert_eq!(log.last_entry().unwrap().unwrap().narration, "second");
        let entries = log.entries().unwrap();
        assert_eq!(entries[0].narration, "first");
        assert_eq!(entries[1].narration, "second");
    }

    #[test]
    fn test_remove_last_drops_newest_record() {
        let mut log = HistoryLog::new(SqliteStore::open_in_memory().unwrap());
        log.ensure_seeded(&ratios()).unwrap();
        let (breakdown, debt) = log.load_totals().unwrap();
        log.append(&sample_expense("keep"), &breakdown, &debt).unwrap();
        log.append(&sample_expense("drop"), &breakdown, &debt).unwrap();

        log.remove_last(&breakdown, &debt).unwrap();
        assert_eq!(log.len().unwrap(), 1);
        assert_eq!(log.last_entry().unwrap().unwrap().narration, "keep");
    }

    #[test]
    fn test_remove_last_on_empty_history_is_noop() {
        let mut log = HistoryLog::new(SqliteStore::open_in_memory().unwrap());
        log.ensure_seeded(&ratios()).unwrap();
        let (breakdown, debt) = log.load_totals().unwrap();
        log.remove_last(&breakdown, &debt).unwrap();
        assert!(log.is_empty().unwrap());
    }

    #[test]
    fn test_history_survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let mut log = HistoryLog::new(SqliteStore::open(&path).unwrap());
            log.ensure_seeded(&ratios()).unwrap();
            let (breakdown, debt) = log.load_totals().unwrap();
            log.append(&sample_expense("persisted"), &breakdown, &debt)
                .unwrap();
        }

        let log = HistoryLog::new(SqliteStore::open(&path).unwrap());
        assert_eq!(log.len().unwrap(), 1);
        assert_eq!(log.last_entry().unwrap().unwrap().narration, "persisted");
    }
}
