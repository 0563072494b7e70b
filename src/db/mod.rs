//! Record storage.
//!
//! The exchange engine never talks to a database directly; it goes through
//! [`RecordStore`], which lists and inserts records for one owner.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::models::{Budget, Goal, Principal, Transaction};
use std::collections::HashMap;

pub trait RecordStore {
    fn transactions(&self, owner: &Principal) -> Result<Vec<Transaction>>;
    fn budgets(&self, owner: &Principal) -> Result<Vec<Budget>>;
    fn goals(&self, owner: &Principal) -> Result<Vec<Goal>>;

    /// Insert and return the new id. Any id on the record is ignored.
    fn insert_transaction(&mut self, owner: &Principal, transaction: &Transaction) -> Result<i64>;
    fn insert_budget(&mut self, owner: &Principal, budget: &Budget) -> Result<i64>;
    fn insert_goal(&mut self, owner: &Principal, goal: &Goal) -> Result<i64>;
}

/// Per-owner records kept in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: i64,
    transactions: HashMap<String, Vec<Transaction>>,
    budgets: HashMap<String, Vec<Budget>>,
    goals: HashMap<String, Vec<Goal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn owned<T: Clone>(map: &HashMap<String, Vec<T>>, owner: &Principal) -> Vec<T> {
    map.get(&owner.username).cloned().unwrap_or_default()
}

impl RecordStore for MemoryStore {
    fn transactions(&self, owner: &Principal) -> Result<Vec<Transaction>> {
        Ok(owned(&self.transactions, owner))
    }

    fn budgets(&self, owner: &Principal) -> Result<Vec<Budget>> {
        Ok(owned(&self.budgets, owner))
    }

    fn goals(&self, owner: &Principal) -> Result<Vec<Goal>> {
        Ok(owned(&self.goals, owner))
    }

    fn insert_transaction(&mut self, owner: &Principal, transaction: &Transaction) -> Result<i64> {
        let id = self.allocate_id();
        let mut stored = transaction.clone();
        stored.id = Some(id);
        self.transactions
            .entry(owner.username.clone())
            .or_default()
            .push(stored);
        Ok(id)
    }

    fn insert_budget(&mut self, owner: &Principal, budget: &Budget) -> Result<i64> {
        let id = self.allocate_id();
        let mut stored = budget.clone();
        stored.id = Some(id);
        self.budgets
            .entry(owner.username.clone())
            .or_default()
            .push(stored);
        Ok(id)
    }

    fn insert_goal(&mut self, owner: &Principal, goal: &Goal) -> Result<i64> {
        let id = self.allocate_id();
        let mut stored = goal.clone();
        stored.id = Some(id);
        self.goals
            .entry(owner.username.clone())
            .or_default()
            .push(stored);
        Ok(id)
    }
}
