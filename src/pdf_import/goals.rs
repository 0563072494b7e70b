//! Goal cards from the "Savings Goals" part of a report.
//!
//! A card starts with the goal name on a line of its own and continues for a
//! few lines (amounts, progress, details) until a blank line, the next name,
//! or report chrome.

use super::classify::{is_goal_start, is_header_line};
use crate::config::ExchangeConfig;
use crate::error::Rejection;
use crate::models::{Goal, Priority};
use crate::primitives::{clip, parse_amount};
use chrono::{Months, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

/// Longest card, name line included.
pub const MAX_BLOCK_LINES: usize = 10;

const MAX_NAME_CHARS: usize = 100;
const RECOVERED_CATEGORY: &str = "Savings";

static RE_DOLLARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$((?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})").unwrap());

/// Collect the card that starts at `start`.
pub fn goal_block<'a>(lines: &[&'a str], start: usize) -> Vec<&'a str> {
    let Some(first) = lines.get(start) else {
        return Vec::new();
    };

    let mut block = vec![*first];
    for line in lines.iter().skip(start + 1).take(MAX_BLOCK_LINES - 1) {
        let line = line.trim();
        if line.is_empty() || is_goal_start(line) || is_header_line(line) {
            break;
        }
        block.push(line);
    }
    block
}

/// Build a goal from a card.
///
/// One dollar figure is read as the target. With two or more, the card
/// reads "$current of $target" and the first two are taken in that order.
/// No figure at all gives the configured placeholder target.
pub fn extract_goal(
    block: &[&str],
    now: NaiveDateTime,
    config: &ExchangeConfig,
) -> Result<Goal, Rejection> {
    let name = block
        .first()
        .map(|line| clip(line.trim(), MAX_NAME_CHARS))
        .unwrap_or_default();
    if name.is_empty() {
        return Err(Rejection::Unrecognized);
    }

    let amounts: Vec<Decimal> = block
        .iter()
        .skip(1)
        .flat_map(|line| RE_DOLLARS.captures_iter(line))
        .filter_map(|caps| caps.get(1).and_then(|m| parse_amount(m.as_str())))
        .collect();

    let (current, target) = match amounts.as_slice() {
        [] => (Decimal::ZERO, config.goal_placeholder_target),
        [target] => (Decimal::ZERO, *target),
        [current, target, ..] => (*current, *target),
    };
    let target = if target > Decimal::ZERO {
        target
    } else {
        config.goal_placeholder_target
    };

    let today = now.date();
    Ok(Goal {
        id: None,
        name,
        category: RECOVERED_CATEGORY.to_string(),
        target_amount: target,
        current_amount: current,
        deadline: today.checked_add_months(Months::new(config.goal_deadline_months)),
        priority: Priority::Medium,
        created_at: today,
    })
}
