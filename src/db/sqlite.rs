//! SQLite-backed record store.
//!
//! Amounts are stored as TEXT so they come back with the exact scale they
//! were written with.

use super::RecordStore;
use crate::error::Result;
use crate::models::{Budget, Goal, Principal, Priority, Transaction, TransactionKind};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        category TEXT NOT NULL,
        date TEXT NOT NULL,
        kind TEXT NOT NULL,
        payment_method TEXT,
        currency TEXT
    );

    CREATE TABLE IF NOT EXISTS budgets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        start_date TEXT,
        end_date TEXT
    );

    CREATE TABLE IF NOT EXISTS goals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        target_amount TEXT NOT NULL,
        current_amount TEXT NOT NULL,
        deadline TEXT,
        priority TEXT NOT NULL DEFAULT 'Medium',
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_transactions_owner ON transactions(owner, date);
    CREATE INDEX IF NOT EXISTS idx_budgets_owner ON budgets(owner);
    CREATE INDEX IF NOT EXISTS idx_goals_owner ON goals(owner);
"#;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl RecordStore for SqliteStore {
    fn transactions(&self, owner: &Principal) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, description, amount, category, date, kind, payment_method, currency
             FROM transactions WHERE owner = ?1 ORDER BY date, id",
        )?;

        let rows = stmt
            .query_map(params![owner.username], |row| {
                let kind: String = row.get(5)?;
                Ok(Transaction {
                    id: Some(row.get(0)?),
                    description: row.get(1)?,
                    amount: decimal_column(row, 2)?,
                    category: row.get(3)?,
                    date: row.get(4)?,
                    kind: TransactionKind::resolve(&kind),
                    payment_method: row.get(6)?,
                    currency: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn budgets(&self, owner: &Principal) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category, amount, start_date, end_date
             FROM budgets WHERE owner = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![owner.username], |row| {
                Ok(Budget {
                    id: Some(row.get(0)?),
                    category: row.get(1)?,
                    amount: decimal_column(row, 2)?,
                    start_date: row.get(3)?,
                    end_date: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn goals(&self, owner: &Principal) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, target_amount, current_amount, deadline, priority, created_at
             FROM goals WHERE owner = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![owner.username], |row| {
                let priority: String = row.get(6)?;
                Ok(Goal {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    category: row.get(2)?,
                    target_amount: decimal_column(row, 3)?,
                    current_amount: decimal_column(row, 4)?,
                    deadline: row.get(5)?,
                    priority: Priority::parse(&priority),
                    created_at: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn insert_transaction(&mut self, owner: &Principal, transaction: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (owner, description, amount, category, date, kind, payment_method, currency)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                owner.username,
                transaction.description,
                transaction.amount.to_string(),
                transaction.category,
                transaction.date,
                transaction.kind.as_str(),
                transaction.payment_method,
                transaction.currency,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_budget(&mut self, owner: &Principal, budget: &Budget) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO budgets (owner, category, amount, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                owner.username,
                budget.category,
                budget.amount.to_string(),
                budget.start_date,
                budget.end_date,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_goal(&mut self, owner: &Principal, goal: &Goal) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO goals (owner, name, category, target_amount, current_amount, deadline, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                owner.username,
                goal.name,
                goal.category,
                goal.target_amount.to_string(),
                goal.current_amount.to_string(),
                goal.deadline,
                goal.priority.as_str(),
                goal.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
