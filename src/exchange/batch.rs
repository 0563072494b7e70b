use crate::db::RecordStore;
use crate::error::Rejection;
use crate::models::{Budget, Goal, ImportOutcome, Principal, Transaction};

/// Records parsed from one file, not yet saved.
#[derive(Debug, Default)]
pub struct ImportBatch {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub goals: Vec<Goal>,
    pub warnings: Vec<String>,
}

impl ImportBatch {
    /// True when no record was accepted. Warnings do not count.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.budgets.is_empty() && self.goals.is_empty()
    }

    pub(crate) fn reject(&mut self, line_idx: usize, what: &str, line: &str, reason: &Rejection) {
        log::debug!("Line {} rejected as {}: {} ({:?})", line_idx + 1, what, reason, line);
        self.warnings
            .push(format!("line {}: {} rejected: {}", line_idx + 1, what, reason));
    }
}

/// Save a batch record by record.
///
/// A failed insert becomes a warning; records saved before it stay saved.
pub fn persist_batch<S: RecordStore + ?Sized>(
    store: &mut S,
    owner: &Principal,
    batch: ImportBatch,
) -> ImportOutcome {
    let mut outcome = ImportOutcome {
        success: true,
        warnings: batch.warnings,
        ..ImportOutcome::default()
    };

    for txn in &batch.transactions {
        match store.insert_transaction(owner, txn) {
            Ok(_) => outcome.transactions_imported += 1,
            Err(e) => {
                log::warn!("Failed to save transaction '{}': {}", txn.description, e);
                outcome
                    .warnings
                    .push(format!("transaction '{}' not saved: {}", txn.description, e));
            }
        }
    }

    for budget in &batch.budgets {
        match store.insert_budget(owner, budget) {
            Ok(_) => outcome.budgets_imported += 1,
            Err(e) => {
                log::warn!("Failed to save budget '{}': {}", budget.category, e);
                outcome
                    .warnings
                    .push(format!("budget '{}' not saved: {}", budget.category, e));
            }
        }
    }

    for goal in &batch.goals {
        match store.insert_goal(owner, goal) {
            Ok(_) => outcome.goals_imported += 1,
            Err(e) => {
                log::warn!("Failed to save goal '{}': {}", goal.name, e);
                outcome
                    .warnings
                    .push(format!("goal '{}' not saved: {}", goal.name, e));
            }
        }
    }

    outcome.message = format!(
        "Import completed: {} transactions, {} budgets, {} goals imported",
        outcome.transactions_imported, outcome.budgets_imported, outcome.goals_imported
    );
    if !outcome.warnings.is_empty() {
        outcome
            .message
            .push_str(&format!(" ({} skipped)", outcome.warnings.len()));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::{ExchangeError, Result};
    use crate::models::{Priority, TransactionKind};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    /// Accepts transactions, refuses every budget.
    struct NoBudgets(MemoryStore);

    impl RecordStore for NoBudgets {
        fn transactions(&self, owner: &Principal) -> Result<Vec<Transaction>> {
            self.0.transactions(owner)
        }
        fn budgets(&self, owner: &Principal) -> Result<Vec<Budget>> {
            self.0.budgets(owner)
        }
        fn goals(&self, owner: &Principal) -> Result<Vec<Goal>> {
            self.0.goals(owner)
        }
        fn insert_transaction(&mut self, owner: &Principal, t: &Transaction) -> Result<i64> {
            self.0.insert_transaction(owner, t)
        }
        fn insert_budget(&mut self, _owner: &Principal, _b: &Budget) -> Result<i64> {
            Err(ExchangeError::InvalidData("budgets are read-only".to_string()))
        }
        fn insert_goal(&mut self, owner: &Principal, g: &Goal) -> Result<i64> {
            self.0.insert_goal(owner, g)
        }
    }

    #[test]
    fn test_failed_insert_does_not_undo_earlier_records() {
        let owner = Principal::new("alice");
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let batch = ImportBatch {
            transactions: vec![Transaction {
                id: None,
                description: "Coffee".to_string(),
                amount: Decimal::new(450, 2),
                category: "Food".to_string(),
                date: day.and_hms_opt(8, 0, 0).unwrap(),
                kind: TransactionKind::Expense,
                payment_method: None,
                currency: Some("USD".to_string()),
            }],
            budgets: vec![Budget {
                id: None,
                category: "Food".to_string(),
                amount: Decimal::from(500),
                start_date: Some(day),
                end_date: None,
            }],
            goals: vec![Goal {
                id: None,
                name: "Bike".to_string(),
                category: "Savings".to_string(),
                target_amount: Decimal::from(800),
                current_amount: Decimal::ZERO,
                deadline: None,
                priority: Priority::Medium,
                created_at: day,
            }],
            warnings: vec!["line 3: budget rejected: no amount found".to_string()],
        };

        let mut store = NoBudgets(MemoryStore::new());
        let outcome = persist_batch(&mut store, &owner, batch);

        assert!(outcome.success);
        assert_eq!(outcome.transactions_imported, 1);
        assert_eq!(outcome.budgets_imported, 0);
        assert_eq!(outcome.goals_imported, 1);
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(store.transactions(&owner).unwrap().len(), 1);
    }
}
