//! Line classification for recovered report text.
//!
//! Each extracted line is judged on its own: is it chrome (titles, column
//! headers, footers), or could it hold a record for the section we are in?

use super::sections::{section_heading, Section};
use once_cell::sync::Lazy;
use regex::Regex;

/// Report chrome vocabulary. Alphabetic tokens match on word boundaries so
/// that "Update" does not count as a DATE header.
static RE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:date|description|category|type|amount|method|budget|spent|remaining|status|history|overview|goals|budgetwise|financial|report|generated|email)\b|user:|---|===",
    )
    .unwrap()
});

static RE_MONEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+-]?\$?\d+[.,]\d{2}").unwrap());

static RE_DATE_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}-\d{1,2}-\d{1,2}|\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}",
    )
    .unwrap()
});

static RE_ALPHABETIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\s]*$").unwrap());

static RE_GOAL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9\s]*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    SectionHeader(Section),
    TableHeader,
    TransactionRow,
    BudgetRow,
    GoalStart,
    Other,
}

pub fn is_header_line(line: &str) -> bool {
    RE_HEADER.is_match(line)
}

pub fn contains_money(line: &str) -> bool {
    RE_MONEY.is_match(line)
}

pub fn contains_date(line: &str) -> bool {
    RE_DATE_LIKE.is_match(line)
}

pub fn is_alphabetic(line: &str) -> bool {
    RE_ALPHABETIC.is_match(line)
}

pub fn is_transaction_candidate(line: &str) -> bool {
    contains_date(line) && contains_money(line) && !is_header_line(line)
}

pub fn is_budget_candidate(line: &str) -> bool {
    contains_money(line) && !is_alphabetic(line) && !line.contains('%') && !is_header_line(line)
}

pub fn is_goal_start(line: &str) -> bool {
    line.len() > 2 && RE_GOAL_NAME.is_match(line) && !is_header_line(line)
}

/// Classify one line given the section it appears in.
pub fn classify(line: &str, section: Section) -> LineKind {
    let line = line.trim();
    if line.chars().count() < 2 {
        return LineKind::Blank;
    }
    if let Some(heading) = section_heading(line) {
        return LineKind::SectionHeader(heading);
    }
    if is_header_line(line) {
        return LineKind::TableHeader;
    }

    match section {
        Section::Transactions if is_transaction_candidate(line) => LineKind::TransactionRow,
        Section::Budgets if is_budget_candidate(line) => LineKind::BudgetRow,
        Section::Goals if is_goal_start(line) => LineKind::GoalStart,
        _ => LineKind::Other,
    }
}
