use crate::error::Rejection;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user an export or import runs for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub username: String,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Which record kinds an export or import touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sections {
    pub transactions: bool,
    pub budgets: bool,
    pub goals: bool,
}

impl Sections {
    pub const fn all() -> Self {
        Self {
            transactions: true,
            budgets: true,
            goals: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            transactions: false,
            budgets: false,
            goals: false,
        }
    }

    pub const fn only_transactions() -> Self {
        Self {
            transactions: true,
            ..Self::none()
        }
    }

    pub const fn only_budgets() -> Self {
        Self {
            budgets: true,
            ..Self::none()
        }
    }

    pub const fn only_goals() -> Self {
        Self {
            goals: true,
            ..Self::none()
        }
    }
}

impl Default for Sections {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Anything mentioning INCOME is income, everything else is an expense.
    pub fn resolve(text: &str) -> Self {
        if text.to_uppercase().contains("INCOME") {
            Self::Income
        } else {
            Self::Expense
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Case-insensitive; unknown values fall back to Medium.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single income or expense entry. `amount` is always the absolute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Option<i64>,
    pub description: String,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDateTime,
    pub kind: TransactionKind,
    pub payment_method: Option<String>,
    pub currency: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Option<i64>,
    pub category: String,
    pub amount: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Budget {
    pub fn validate(&self) -> Result<(), Rejection> {
        if self.amount <= Decimal::ZERO {
            return Err(Rejection::NonPositiveAmount);
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(Rejection::EndBeforeStart);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
    pub created_at: NaiveDate,
}

impl Goal {
    pub fn validate(&self) -> Result<(), Rejection> {
        if self.target_amount <= Decimal::ZERO {
            return Err(Rejection::NonPositiveAmount);
        }
        Ok(())
    }

    /// Progress in percent, capped at 100.
    pub fn progress_percent(&self) -> Decimal {
        if self.target_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let pct = self.current_amount * Decimal::from(100) / self.target_amount;
        pct.min(Decimal::from(100))
    }
}

/// Aggregate result of one import call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    pub transactions_imported: usize,
    pub budgets_imported: usize,
    pub goals_imported: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ImportOutcome {
    /// The file could not be read at all; nothing was imported.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn total_imported(&self) -> usize {
        self.transactions_imported + self.budgets_imported + self.goals_imported
    }
}
