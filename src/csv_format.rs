//! Sectioned CSV interchange format.
//!
//! One file holds up to three tables, each introduced by a `# NAME` marker
//! line and its own header row:
//!
//! ```text
//! # TRANSACTIONS
//! id,description,amount,category,date,type,paymentMethod,currency
//! 1,"Coffee",4.50,"Food","2024-01-05T08:00:00","EXPENSE","Cash","USD"
//!
//! # BUDGETS
//! id,category,amount,startDate,endDate
//! ```
//!
//! On import, a table without a marker is recognised by its header row.
//! Other `#` lines are comments.

use crate::config::ExchangeConfig;
use crate::error::{ExchangeError, Result};
use crate::exchange::{ExchangeContext, ImportBatch};
use crate::mapping::{budget_from, goal_from, transaction_from, FieldSource};
use crate::models::{Budget, Goal, Sections, Transaction};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use rust_decimal::Decimal;
use std::fmt;

const TRANSACTION_HEADER: &str = "id,description,amount,category,date,type,paymentMethod,currency";
const BUDGET_HEADER: &str = "id,category,amount,startDate,endDate";
const GOAL_HEADER: &str = "id,goalName,category,targetAmount,currentAmount,deadline,priority,createdAt";

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Transactions,
    Budgets,
    Goals,
}

impl Table {
    fn from_marker(line: &str) -> Option<Self> {
        let name = line.trim_start_matches('#').trim().to_uppercase();
        if name.starts_with("TRANSACTION") {
            Some(Self::Transactions)
        } else if name.starts_with("BUDGET") {
            Some(Self::Budgets)
        } else if name.starts_with("GOAL") {
            Some(Self::Goals)
        } else {
            None
        }
    }

    /// Guess the table from a lowercased header row.
    fn from_headers(headers: &[String]) -> Option<Self> {
        let has = |name: &str| headers.iter().any(|h| h == name);
        if has("description") && has("type") {
            Some(Self::Transactions)
        } else if has("startdate") && has("enddate") {
            Some(Self::Budgets)
        } else if has("goalname") || has("targetamount") {
            Some(Self::Goals)
        } else {
            None
        }
    }

    fn enabled(&self, sections: Sections) -> bool {
        match self {
            Self::Transactions => sections.transactions,
            Self::Budgets => sections.budgets,
            Self::Goals => sections.goals,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transactions => "transactions",
            Self::Budgets => "budgets",
            Self::Goals => "goals",
        })
    }
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn id(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write one table body. Text is quoted, numbers are not.
fn write_rows<I, R>(rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExchangeError::Io(e.into_error()))
}

fn push_table(out: &mut Vec<u8>, marker: &str, header: &str, body: Vec<u8>) {
    if !out.is_empty() {
        out.push(b'\n');
    }
    out.extend_from_slice(marker.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(header.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(&body);
}

pub fn write_csv(
    sections: Sections,
    transactions: &[Transaction],
    budgets: &[Budget],
    goals: &[Goal],
) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    if sections.transactions {
        let body = write_rows(transactions.iter().map(|t| {
            vec![
                id(t.id),
                t.description.clone(),
                money(t.amount),
                t.category.clone(),
                t.date.format(DATE_TIME_FORMAT).to_string(),
                t.kind.as_str().to_string(),
                t.payment_method.clone().unwrap_or_default(),
                t.currency.clone().unwrap_or_default(),
            ]
        }))?;
        push_table(&mut out, "# TRANSACTIONS", TRANSACTION_HEADER, body);
    }

    if sections.budgets {
        let body = write_rows(budgets.iter().map(|b| {
            vec![
                id(b.id),
                b.category.clone(),
                money(b.amount),
                b.start_date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default(),
                b.end_date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default(),
            ]
        }))?;
        push_table(&mut out, "# BUDGETS", BUDGET_HEADER, body);
    }

    if sections.goals {
        let body = write_rows(goals.iter().map(|g| {
            vec![
                id(g.id),
                g.name.clone(),
                g.category.clone(),
                money(g.target_amount),
                money(g.current_amount),
                g.deadline.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default(),
                g.priority.as_str().to_string(),
                g.created_at.format(DATE_FORMAT).to_string(),
            ]
        }))?;
        push_table(&mut out, "# GOALS", GOAL_HEADER, body);
    }

    Ok(out)
}

struct CsvFields<'a> {
    headers: &'a [String],
    record: &'a StringRecord,
}

impl FieldSource for CsvFields<'_> {
    fn field(&self, name: &str) -> Option<String> {
        let idx = self
            .headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))?;
        self.record
            .get(idx)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Parse a sectioned CSV file. Only non-UTF-8 input is fatal.
///
/// The whole file goes through one reader so quoted fields may span lines.
/// A record whose first field starts with `#` is a marker or a comment; the
/// record after a marker is that table's header row.
pub fn parse_csv(
    bytes: &[u8],
    sections: Sections,
    ctx: &ExchangeContext,
    config: &ExchangeConfig,
) -> Result<ImportBatch> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut batch = ImportBatch::default();

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut marker: Option<Table> = None;
    let mut headers: Option<Vec<String>> = None;
    let mut table: Option<Table> = None;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                batch.warnings.push(format!("line {}: {}", line, e));
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let first = record.get(0).unwrap_or_default();
        if first.starts_with('#') {
            if let Some(found) = Table::from_marker(first) {
                marker = Some(found);
                headers = None;
                table = None;
            }
            continue;
        }

        if headers.is_none() {
            let columns: Vec<String> = record.iter().map(str::to_lowercase).collect();
            table = marker.take().or_else(|| Table::from_headers(&columns));
            match table {
                None => batch
                    .warnings
                    .push(format!("line {}: table with unknown columns skipped", line)),
                Some(found) if !found.enabled(sections) => {
                    log::debug!("Skipping {} table, section not selected", found)
                }
                Some(_) => {}
            }
            headers = Some(columns);
            continue;
        }

        let (Some(columns), Some(current)) = (headers.as_deref(), table) else {
            continue;
        };
        if !current.enabled(sections) {
            continue;
        }

        let fields = CsvFields {
            headers: columns,
            record: &record,
        };
        let accepted = match current {
            Table::Transactions => {
                batch
                    .transactions
                    .push(transaction_from(&fields, ctx.now, config));
                Ok(())
            }
            Table::Budgets => budget_from(&fields).map(|b| batch.budgets.push(b)),
            Table::Goals => goal_from(&fields, ctx.now.date()).map(|g| batch.goals.push(g)),
        };
        if let Err(reason) = accepted {
            log::debug!("CSV line {} skipped: {}", line, reason);
            batch
                .warnings
                .push(format!("line {}: {} row skipped: {}", line, current, reason));
        }
    }

    Ok(batch)
}
