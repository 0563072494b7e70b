//! Budget rows from the "Budget Overview" table.

use crate::error::Rejection;
use crate::models::Budget;
use crate::primitives::{clip, month_bounds, parse_amount};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

const MAX_CATEGORY_CHARS: usize = 50;

/// category, budget, spent, remaining, status
static RE_BUDGET_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<category>.+?)\s+[+-]?\$?(?P<budget>[\d,]*\.\d{2})\s+[+-]?\$?(?P<spent>[\d,]*\.\d{2})\s+[+-]?\$?(?P<remaining>[\d,]*\.\d{2})\s+(?P<status>.+)$",
    )
    .unwrap()
});

static RE_MONEY_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+-]?\$?\d+[.,]\d{2}").unwrap());

static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\s*|\s{2,}").unwrap());

/// Recover a budget from one row. The budget period is the month of `now`;
/// the report does not print it.
pub fn extract_budget(line: &str, now: NaiveDateTime) -> Result<Budget, Rejection> {
    let line = line.trim();

    let (category, amount) = match RE_BUDGET_ROW.captures(line) {
        Some(caps) => {
            let category = caps.name("category").map(|m| m.as_str().trim()).unwrap_or("");
            let amount = caps
                .name("budget")
                .and_then(|m| parse_amount(m.as_str()))
                .ok_or(Rejection::NoAmount)?;
            let category = if category.is_empty() { "Other" } else { category };
            (category.to_string(), amount)
        }
        None => first_money_column(line)?,
    };

    if amount <= Decimal::ZERO {
        return Err(Rejection::NonPositiveAmount);
    }

    let (start, end) = month_bounds(now.date());
    Ok(Budget {
        id: None,
        category: clip(&category, MAX_CATEGORY_CHARS),
        amount,
        start_date: Some(start),
        end_date: Some(end),
    })
}

/// Fallback: first column is the category, the first money-looking column
/// after it is the budget amount.
fn first_money_column(line: &str) -> Result<(String, Decimal), Rejection> {
    let tokens: Vec<&str> = RE_COLUMN_GAP
        .split(line)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.len() < 2 {
        return Err(Rejection::Unrecognized);
    }

    let category = tokens[0];
    if category.is_empty() {
        return Err(Rejection::EmptyCategory);
    }

    let amount = tokens[1..]
        .iter()
        .find_map(|t| RE_MONEY_TOKEN.find(t))
        .and_then(|m| parse_amount(m.as_str()))
        .ok_or(Rejection::NoAmount)?;

    Ok((category.to_string(), amount))
}
