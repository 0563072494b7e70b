//! JSON interchange format.
//!
//! The export is a single pretty-printed object:
//!
//! ```json
//! {
//!   "exportDate": "2024-03-15T12:00:00",
//!   "exportedBy": "alice",
//!   "transactions": [ { "id": 1, "description": "Coffee", "amount": 4.5, ... } ],
//!   "budgets": [ ... ],
//!   "goals": [ ... ]
//! }
//! ```
//!
//! Arrays are present only for the sections that were exported.

use crate::config::ExchangeConfig;
use crate::error::{Rejection, Result};
use crate::exchange::{ExchangeContext, ImportBatch};
use crate::mapping::{budget_from, goal_from, transaction_from, FieldSource};
use crate::models::{Budget, Goal, Sections, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    export_date: String,
    exported_by: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    transactions: Option<Vec<TransactionRecord<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    budgets: Option<Vec<BudgetRecord<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    goals: Option<Vec<GoalRecord<'a>>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRecord<'a> {
    id: Option<i64>,
    description: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    category: &'a str,
    date: String,
    #[serde(rename = "type")]
    kind: &'static str,
    payment_method: Option<&'a str>,
    currency: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BudgetRecord<'a> {
    id: Option<i64>,
    category: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalRecord<'a> {
    id: Option<i64>,
    goal_name: &'a str,
    category: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    target_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    current_amount: Decimal,
    deadline: Option<String>,
    priority: &'static str,
    created_at: String,
}

impl<'a> From<&'a Transaction> for TransactionRecord<'a> {
    fn from(t: &'a Transaction) -> Self {
        Self {
            id: t.id,
            description: &t.description,
            amount: t.amount,
            category: &t.category,
            date: t.date.format(DATE_TIME_FORMAT).to_string(),
            kind: t.kind.as_str(),
            payment_method: t.payment_method.as_deref(),
            currency: t.currency.as_deref(),
        }
    }
}

impl<'a> From<&'a Budget> for BudgetRecord<'a> {
    fn from(b: &'a Budget) -> Self {
        Self {
            id: b.id,
            category: &b.category,
            amount: b.amount,
            start_date: b.start_date.map(|d| d.format(DATE_FORMAT).to_string()),
            end_date: b.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }
}

impl<'a> From<&'a Goal> for GoalRecord<'a> {
    fn from(g: &'a Goal) -> Self {
        Self {
            id: g.id,
            goal_name: &g.name,
            category: &g.category,
            target_amount: g.target_amount,
            current_amount: g.current_amount,
            deadline: g.deadline.map(|d| d.format(DATE_FORMAT).to_string()),
            priority: g.priority.as_str(),
            created_at: g.created_at.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Serialize the enabled sections. Disabled sections are omitted, not empty.
pub fn write_json(
    ctx: &ExchangeContext,
    sections: Sections,
    transactions: &[Transaction],
    budgets: &[Budget],
    goals: &[Goal],
) -> Result<Vec<u8>> {
    let document = ExportDocument {
        export_date: ctx.now.format(DATE_TIME_FORMAT).to_string(),
        exported_by: &ctx.principal.username,
        transactions: sections
            .transactions
            .then(|| transactions.iter().map(TransactionRecord::from).collect()),
        budgets: sections
            .budgets
            .then(|| budgets.iter().map(BudgetRecord::from).collect()),
        goals: sections
            .goals
            .then(|| goals.iter().map(GoalRecord::from).collect()),
    };

    Ok(serde_json::to_vec_pretty(&document)?)
}

/// One element of an imported array.
struct JsonFields<'a>(&'a Map<String, Value>);

impl FieldSource for JsonFields<'_> {
    fn field(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn is_null(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(Value::Null))
    }
}

/// Parse a JSON export. Only malformed JSON is fatal.
pub fn parse_json(
    bytes: &[u8],
    sections: Sections,
    ctx: &ExchangeContext,
    config: &ExchangeConfig,
) -> Result<ImportBatch> {
    let root: Value = serde_json::from_slice(bytes)?;
    let mut batch = ImportBatch::default();

    if sections.transactions {
        for_each_object(&root, "transactions", &mut batch, |batch, fields| {
            batch
                .transactions
                .push(transaction_from(fields, ctx.now, config));
            Ok(())
        });
    }

    if sections.budgets {
        for_each_object(&root, "budgets", &mut batch, |batch, fields| {
            batch.budgets.push(budget_from(fields)?);
            Ok(())
        });
    }

    if sections.goals {
        let today = ctx.now.date();
        for_each_object(&root, "goals", &mut batch, |batch, fields| {
            batch.goals.push(goal_from(fields, today)?);
            Ok(())
        });
    }

    Ok(batch)
}

fn for_each_object<F>(root: &Value, key: &str, batch: &mut ImportBatch, mut accept: F)
where
    F: FnMut(&mut ImportBatch, &dyn FieldSource) -> std::result::Result<(), Rejection>,
{
    let Some(items) = root.get(key).and_then(Value::as_array) else {
        return;
    };

    for (idx, item) in items.iter().enumerate() {
        let outcome = match item.as_object() {
            Some(object) => accept(batch, &JsonFields(object)),
            None => Err(Rejection::NotAnObject),
        };
        if let Err(reason) = outcome {
            log::debug!("{}[{}] skipped: {}", key, idx, reason);
            batch.warnings.push(format!("{}[{}] skipped: {}", key, idx, reason));
        }
    }
}
