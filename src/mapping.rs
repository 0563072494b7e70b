//! Field-by-field record mapping shared by the JSON and CSV importers.
//!
//! A missing or unreadable field falls back to its default; it never causes
//! the record to be dropped. Only the validation rules on [`Budget`] and
//! [`Goal`] can reject a record.

use crate::config::ExchangeConfig;
use crate::error::Rejection;
use crate::models::{Budget, Goal, Priority, Transaction, TransactionKind};
use crate::primitives::{parse_amount, parse_flexible_date, parse_flexible_day};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

const DEFAULT_DESCRIPTION: &str = "Imported";
const DEFAULT_CATEGORY: &str = "Other";
const DEFAULT_GOAL_NAME: &str = "Imported Goal";

/// Named fields of one incoming record.
///
/// Field names are the camelCase export names (`paymentMethod`, `goalName`).
/// Empty values must be reported as `None`.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<String>;

    /// True when the source explicitly carries "no value" for `name`, as
    /// opposed to leaving it out.
    fn is_null(&self, _name: &str) -> bool {
        false
    }

    fn text_or(&self, name: &str, default: &str) -> String {
        self.field(name).unwrap_or_else(|| default.to_string())
    }

    fn amount(&self, name: &str) -> Option<Decimal> {
        self.field(name).as_deref().and_then(parse_amount)
    }

    fn date_time(&self, name: &str) -> Option<NaiveDateTime> {
        self.field(name).as_deref().and_then(parse_flexible_date)
    }

    fn day(&self, name: &str) -> Option<NaiveDate> {
        self.field(name).as_deref().and_then(parse_flexible_day)
    }
}

/// Transactions are never rejected; a zero amount is kept as is.
pub fn transaction_from(
    source: &dyn FieldSource,
    now: NaiveDateTime,
    config: &ExchangeConfig,
) -> Transaction {
    Transaction {
        id: None,
        description: source.text_or("description", DEFAULT_DESCRIPTION),
        amount: source.amount("amount").unwrap_or(Decimal::ZERO).abs(),
        category: source.text_or("category", DEFAULT_CATEGORY),
        date: source.date_time("date").unwrap_or(now),
        kind: source
            .field("type")
            .map(|t| TransactionKind::resolve(&t))
            .unwrap_or(TransactionKind::Expense),
        payment_method: source.field("paymentMethod"),
        currency: if source.is_null("currency") {
            None
        } else {
            Some(source.text_or("currency", &config.default_currency))
        },
    }
}

pub fn budget_from(source: &dyn FieldSource) -> Result<Budget, Rejection> {
    let budget = Budget {
        id: None,
        category: source.text_or("category", DEFAULT_CATEGORY),
        amount: source.amount("amount").unwrap_or(Decimal::ZERO),
        start_date: source.day("startDate"),
        end_date: source.day("endDate"),
    };
    budget.validate()?;
    Ok(budget)
}

pub fn goal_from(source: &dyn FieldSource, today: NaiveDate) -> Result<Goal, Rejection> {
    let goal = Goal {
        id: None,
        name: source.text_or("goalName", DEFAULT_GOAL_NAME),
        category: source.text_or("category", DEFAULT_CATEGORY),
        target_amount: source.amount("targetAmount").unwrap_or(Decimal::ZERO),
        current_amount: source.amount("currentAmount").unwrap_or(Decimal::ZERO),
        deadline: source.day("deadline"),
        priority: source
            .field("priority")
            .map(|p| Priority::parse(&p))
            .unwrap_or_default(),
        created_at: source.day("createdAt").unwrap_or(today),
    };
    goal.validate()?;
    Ok(goal)
}
