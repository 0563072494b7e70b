//! Date and amount parsing shared by every importer.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static RE_AMOUNT_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.,+\-]").unwrap());

/// Date-time patterns, tried in order. The first that parses wins.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only patterns, tried after the date-time ones.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%b %d, %Y"];

/// Parse a date or date-time in any of the supported layouts.
///
/// Date-only inputs resolve to midnight. Returns `None` when nothing matches;
/// the caller decides what the fallback is.
pub fn parse_flexible_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Same as [`parse_flexible_date`] but keeps only the calendar day.
pub fn parse_flexible_day(text: &str) -> Option<NaiveDate> {
    parse_flexible_date(text).map(|dt| dt.date())
}

/// Parse a signed amount such as `-$1,234.56` or `+4.50`.
///
/// Everything except digits, `.`, `,`, `+` and `-` is stripped and commas are
/// treated as thousands separators.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let cleaned = RE_AMOUNT_CHARS.replace_all(text, "").replace(',', "");
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// Render `1234.5` as `1,234.50`. The sign is dropped.
pub fn format_money(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.abs().round_dp(2));
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}.{}", grouped, frac_part)
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Keep the first `max` characters without any marker.
pub fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// First and last day of the month containing `day`.
pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let next_first = first
        .checked_add_months(Months::new(1))
        .unwrap_or(first);
    let last = next_first.pred_opt().unwrap_or(first);
    (first, last)
}
