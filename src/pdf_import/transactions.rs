//! Transaction rows from the "Transaction History" table.
//!
//! Rows are tried against the column-aligned layout the report writer
//! produces, then a tighter single-space layout, and finally a positional
//! split on column gaps or pipes.

use crate::config::ExchangeConfig;
use crate::error::Rejection;
use crate::models::{Transaction, TransactionKind};
use crate::primitives::{clip, parse_amount, parse_flexible_date};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const MAX_DESCRIPTION_CHARS: usize = 100;

static RE_ALIGNED_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<date>[a-z]{3}\s+\d{1,2},\s*\d{4}|\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{4})\s{2,}(?P<desc>.+?)\s{2,}(?P<cat>.+?)\s{2,}(?P<kind>income|expense)\s{2,}(?P<amount>[+-]?\$?[\d,]*\.\d{2})(?:\s{2,}(?P<method>.+?))?$",
    )
    .unwrap()
});

static RE_COMPACT_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<date>[a-z]{3}\s+\d{1,2},\s*\d{4})\s+(?P<desc>.+?)\s+(?P<cat>\S+)\s+(?P<kind>income|expense)\s+(?P<amount>[+-]?\$?[\d,]*\.\d{2})\s+(?P<method>\S+)$",
    )
    .unwrap()
});

static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\s*|\s{2,}").unwrap());

/// Columns pulled out of one row, before validation.
#[derive(Debug, Default)]
struct RowFields<'a> {
    date: Option<NaiveDateTime>,
    description: &'a str,
    category: &'a str,
    kind: &'a str,
    amount: &'a str,
    method: Option<&'a str>,
}

fn from_captures<'a>(caps: &Captures<'a>) -> RowFields<'a> {
    let text = |name: &str| caps.name(name).map(|m| m.as_str().trim()).unwrap_or("");
    RowFields {
        date: parse_flexible_date(text("date")),
        description: text("desc"),
        category: text("cat"),
        kind: text("kind"),
        amount: text("amount"),
        method: caps.name("method").map(|m| m.as_str().trim()),
    }
}

/// Positional split. The date may have been broken over up to three tokens
/// ("Jan", "05,", "2024"), so the longest prefix that parses wins.
fn from_columns(line: &str) -> Option<RowFields<'_>> {
    let tokens: Vec<&str> = RE_COLUMN_GAP
        .split(line)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let mut date = None;
    let mut consumed = 1;
    for take in (1..=tokens.len().min(3)).rev() {
        if let Some(parsed) = parse_flexible_date(&tokens[..take].join(" ")) {
            date = Some(parsed);
            consumed = take;
            break;
        }
    }

    let rest = tokens.get(consumed..)?;
    if rest.len() < 4 {
        return None;
    }

    Some(RowFields {
        date,
        description: rest[0],
        category: rest[1],
        kind: rest[2],
        amount: rest[3],
        method: rest.get(4).copied(),
    })
}

/// Turn one report row into a transaction, or say why it cannot be one.
pub fn extract_transaction(
    line: &str,
    now: NaiveDateTime,
    config: &ExchangeConfig,
) -> Result<Transaction, Rejection> {
    let line = line.trim();
    let fields = RE_ALIGNED_ROW
        .captures(line)
        .or_else(|| RE_COMPACT_ROW.captures(line))
        .map(|caps| from_captures(&caps))
        .or_else(|| from_columns(line))
        .ok_or(Rejection::Unrecognized)?;

    let amount = parse_amount(fields.amount).ok_or(Rejection::NoAmount)?;
    if amount.is_zero() {
        return Err(Rejection::ZeroAmount);
    }

    let description = clip(fields.description, MAX_DESCRIPTION_CHARS).trim().to_string();
    if description.is_empty() {
        return Err(Rejection::EmptyDescription);
    }

    let category = match fields.category {
        "" | "-" => "Other".to_string(),
        other => other.to_string(),
    };

    let payment_method = fields
        .method
        .filter(|m| !m.is_empty() && *m != "-")
        .map(str::to_string);

    Ok(Transaction {
        id: None,
        description,
        amount: amount.abs(),
        category,
        date: fields.date.unwrap_or(now),
        kind: TransactionKind::resolve(fields.kind),
        payment_method,
        currency: Some(config.default_currency.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_compact_row() {
        let config = ExchangeConfig::default();
        let txn = extract_transaction("Jan 05, 2024 Coffee Food EXPENSE -$4.50 Cash", now(), &config)
            .unwrap();

        assert_eq!(txn.date, day(2024, 1, 5));
        assert_eq!(txn.description, "Coffee");
        assert_eq!(txn.category, "Food");
        assert_eq!(txn.kind, TransactionKind::Expense);
        assert_eq!(txn.amount, Decimal::new(450, 2));
        assert_eq!(txn.payment_method.as_deref(), Some("Cash"));
        assert_eq!(txn.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_report_row_as_printed() {
        let config = ExchangeConfig::default();
        let line = "Jan 05, 2024   Coffee   Food   EXPENSE   $4.50   Cash";
        assert!(crate::pdf_import::classify::is_transaction_candidate(line));

        let txn = extract_transaction(line, now(), &config).unwrap();
        assert_eq!(txn.date, day(2024, 1, 5));
        assert_eq!(txn.description, "Coffee");
        assert_eq!(txn.category, "Food");
        assert_eq!(txn.kind, TransactionKind::Expense);
        assert_eq!(txn.amount, Decimal::new(450, 2));
        assert_eq!(txn.payment_method.as_deref(), Some("Cash"));
    }

    #[test]
    fn test_aligned_row_with_spaces_in_columns() {
        let config = ExchangeConfig::default();
        let line = "Feb 01, 2024   Monthly salary payment   Salary   INCOME   +$3,200.00   Bank Transfer";
        let txn = extract_transaction(line, now(), &config).unwrap();

        assert_eq!(txn.description, "Monthly salary payment");
        assert_eq!(txn.category, "Salary");
        assert_eq!(txn.kind, TransactionKind::Income);
        assert_eq!(txn.amount, Decimal::new(320000, 2));
        assert_eq!(txn.payment_method.as_deref(), Some("Bank Transfer"));
    }

    #[test]
    fn test_aligned_row_without_method() {
        let config = ExchangeConfig::default();
        let line = "Feb 02, 2024   Groceries   Food & Dining   EXPENSE   -$85.20   -";
        let txn = extract_transaction(line, now(), &config).unwrap();
        assert_eq!(txn.category, "Food & Dining");
        assert_eq!(txn.payment_method, None);
    }

    #[test]
    fn test_pipe_separated_fallback() {
        let config = ExchangeConfig::default();
        let line = "2024-01-05 | Coffee | Food | expense | 4.50 | Card";
        let txn = extract_transaction(line, now(), &config).unwrap();
        assert_eq!(txn.date, day(2024, 1, 5));
        assert_eq!(txn.description, "Coffee");
        assert_eq!(txn.amount, Decimal::new(450, 2));
        assert_eq!(txn.payment_method.as_deref(), Some("Card"));
    }

    #[test]
    fn test_unparseable_date_falls_back_to_now() {
        let config = ExchangeConfig::default();
        let line = "31/31/2024 | Coffee | Food | EXPENSE | $4.50";
        let txn = extract_transaction(line, now(), &config).unwrap();
        assert_eq!(txn.date, now());
    }

    #[test]
    fn test_rejections() {
        let config = ExchangeConfig::default();
        assert_eq!(
            extract_transaction("Jan 05, 2024 Coffee Food EXPENSE $0.00 Cash", now(), &config),
            Err(Rejection::ZeroAmount)
        );
        assert_eq!(
            extract_transaction("Jan 05, 2024   $4.50", now(), &config),
            Err(Rejection::Unrecognized)
        );
        assert_eq!(
            extract_transaction("2024-01-05 | Coffee | Food | EXPENSE | n/a", now(), &config),
            Err(Rejection::NoAmount)
        );
    }

    #[test]
    fn test_long_description_clipped() {
        let config = ExchangeConfig::default();
        let long = "x".repeat(150);
        let line = format!("Jan 05, 2024   {}   Misc   EXPENSE   $1.00   Cash", long);
        let txn = extract_transaction(&line, now(), &config).unwrap();
        assert_eq!(txn.description.chars().count(), 100);
    }
}
