//! PDF report export.
//!
//! The report is laid out once, against [`ReportSurface`], and can be drawn
//! onto a real PDF ([`PdfSurface`]) or captured as plain text
//! ([`TextSurface`]). Every table row is emitted as a single text run with
//! columns padded and separated by three spaces, so the PDF importer sees
//! one line per row when the text is extracted again.

mod surface;

pub use surface::{PdfSurface, TextSurface};

use crate::config::ExchangeConfig;
use crate::exchange::ExchangeContext;
use crate::models::{Budget, Goal, Sections, Transaction};
use crate::primitives::{format_money, month_bounds, truncate};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

const GAP: &str = "   ";
const TOP_CATEGORIES: usize = 10;
const TREND_MONTHS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Subtitle,
    Heading,
    Strong,
    Body,
    TableHeader,
    TableRow,
    Small,
}

/// Something a report can be drawn on.
pub trait ReportSurface {
    /// One line of text at the current position.
    fn text(&mut self, style: TextStyle, text: &str);
    /// A horizontal divider.
    fn rule(&mut self);
    /// Vertical space in millimetres.
    fn spacer(&mut self, height: f32);
    fn page_break(&mut self);
}

/// The records a report is built from.
pub struct ReportData<'a> {
    pub transactions: &'a [Transaction],
    pub budgets: &'a [Budget],
    pub goals: &'a [Goal],
}

/// `$1,234.50`, with a leading `-` or `+` when `sign` is given.
fn dollars(amount: Decimal, sign: Option<bool>) -> String {
    let prefix = match sign {
        Some(true) => "+",
        Some(false) => "-",
        None => "",
    };
    format!("{}${}", prefix, format_money(amount))
}

fn signed(amount: Decimal) -> String {
    dollars(amount, Some(amount >= Decimal::ZERO))
}

fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part * Decimal::from(100) / whole).round_dp(1)
    }
}

struct Summary {
    income: Decimal,
    expenses: Decimal,
}

impl Summary {
    fn of(transactions: &[Transaction]) -> Self {
        let (income, expenses) = transactions.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expenses), t| {
                if t.is_income() {
                    (income + t.amount, expenses)
                } else {
                    (income, expenses + t.amount)
                }
            },
        );
        Self { income, expenses }
    }

    fn net(&self) -> Decimal {
        self.income - self.expenses
    }

    fn savings_rate(&self) -> Decimal {
        percent(self.net(), self.income)
    }
}

/// Status label for a budget given how much of it is spent. The labels avoid
/// the word "budget" so the importer does not take the row for a header.
pub fn budget_status(spent: Decimal, amount: Decimal) -> &'static str {
    let used = percent(spent, amount);
    if used >= Decimal::from(100) {
        "Overspent"
    } else if used >= Decimal::from(80) {
        "Warning"
    } else {
        "On Track"
    }
}

fn render_header(
    surface: &mut dyn ReportSurface,
    ctx: &ExchangeContext,
    config: &ExchangeConfig,
) {
    surface.text(TextStyle::Title, &config.report_title);
    surface.text(TextStyle::Subtitle, "Personal Financial Report");
    surface.text(
        TextStyle::Small,
        &format!("Generated: {}", ctx.now.format("%b %d, %Y at %I:%M %p")),
    );
    surface.text(TextStyle::Small, &format!("User: {}", ctx.principal.username));
    if let Some(email) = &ctx.principal.email {
        surface.text(TextStyle::Small, &format!("Email: {}", email));
    }
    surface.rule();
    surface.spacer(4.0);
}

fn render_summary(surface: &mut dyn ReportSurface, transactions: &[Transaction]) {
    let summary = Summary::of(transactions);

    surface.text(TextStyle::Heading, "Financial Summary");
    let rows = [
        ("Total Income", dollars(summary.income, None)),
        ("Total Expenses", dollars(summary.expenses, None)),
        ("Net Balance", signed(summary.net())),
        ("Savings Rate", format!("{:.1}%", summary.savings_rate())),
    ];
    for (label, value) in rows {
        surface.text(TextStyle::Body, &format!("{:<16}{}{}", label, GAP, value));
    }
    surface.spacer(4.0);
}

fn render_breakdown(surface: &mut dyn ReportSurface, transactions: &[Transaction]) {
    let mut by_category: HashMap<&str, Decimal> = HashMap::new();
    for t in transactions.iter().filter(|t| !t.is_income()) {
        *by_category.entry(t.category.as_str()).or_default() += t.amount;
    }
    if by_category.is_empty() {
        return;
    }

    let total: Decimal = by_category.values().copied().sum();
    let mut ranked: Vec<(&str, Decimal)> = by_category.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    surface.text(TextStyle::Heading, "Expense Breakdown by Category");
    for (category, amount) in ranked.into_iter().take(TOP_CATEGORIES) {
        surface.text(
            TextStyle::TableRow,
            &format!(
                "{:<20}{}{:>14}{}{:>5.1}%",
                truncate(category, 20),
                GAP,
                dollars(amount, None),
                GAP,
                percent(amount, total)
            ),
        );
    }
    surface.spacer(4.0);
}

fn render_trend(surface: &mut dyn ReportSurface, transactions: &[Transaction], today: NaiveDate) {
    let (this_month, _) = month_bounds(today);
    let first = this_month
        .checked_sub_months(Months::new(TREND_MONTHS - 1))
        .unwrap_or(this_month);

    let mut months: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();
    let mut cursor = first;
    while cursor <= this_month {
        months.insert((cursor.year(), cursor.month()), Default::default());
        cursor = match cursor.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    for t in transactions {
        if let Some(totals) = months.get_mut(&(t.date.year(), t.date.month())) {
            if t.is_income() {
                totals.0 += t.amount;
            } else {
                totals.1 += t.amount;
            }
        }
    }

    surface.text(TextStyle::Heading, "Monthly Income vs Expenses");
    surface.text(
        TextStyle::TableHeader,
        &format!("{:<10}{}{:>14}{}{:>14}{}{:>14}", "Month", GAP, "Income", GAP, "Expenses", GAP, "Net"),
    );
    for ((year, month), (income, expenses)) in months {
        let label = NaiveDate::from_ymd_opt(year, month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_default();
        surface.text(
            TextStyle::TableRow,
            &format!(
                "{:<10}{}{:>14}{}{:>14}{}{:>14}",
                label,
                GAP,
                dollars(income, None),
                GAP,
                dollars(expenses, None),
                GAP,
                signed(income - expenses)
            ),
        );
    }
    surface.spacer(4.0);
}

fn render_transactions(
    surface: &mut dyn ReportSurface,
    transactions: &[Transaction],
    config: &ExchangeConfig,
) {
    surface.page_break();
    surface.text(TextStyle::Heading, "Transaction History");
    surface.text(
        TextStyle::TableHeader,
        &format!(
            "{:<12}{}{:<25}{}{:<14}{}{:<7}{}{:>13}{}{}",
            "Date", GAP, "Description", GAP, "Category", GAP, "Type", GAP, "Amount", GAP, "Method"
        ),
    );

    if transactions.is_empty() {
        surface.text(TextStyle::Small, "No transactions recorded.");
        return;
    }

    let mut recent: Vec<&Transaction> = transactions.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));

    for t in recent.iter().take(config.max_report_transactions) {
        let method = t
            .payment_method
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("-");
        surface.text(
            TextStyle::TableRow,
            &format!(
                "{:<12}{}{:<25}{}{:<14}{}{:<7}{}{:>13}{}{}",
                t.date.format("%b %d, %Y"),
                GAP,
                truncate(&t.description, 25),
                GAP,
                truncate(&t.category, 14),
                GAP,
                t.kind.as_str(),
                GAP,
                dollars(t.amount, Some(t.is_income())),
                GAP,
                truncate(method, 15)
            ),
        );
    }

    if transactions.len() > config.max_report_transactions {
        surface.spacer(2.0);
        surface.text(
            TextStyle::Small,
            &format!(
                "Showing {} most recent of {} in total.",
                config.max_report_transactions,
                transactions.len()
            ),
        );
    }
}

fn render_budgets(
    surface: &mut dyn ReportSurface,
    budgets: &[Budget],
    transactions: &[Transaction],
    today: NaiveDate,
) {
    let (start, end) = month_bounds(today);
    let mut spent: HashMap<&str, Decimal> = HashMap::new();
    for t in transactions
        .iter()
        .filter(|t| !t.is_income() && (start..=end).contains(&t.date.date()))
    {
        *spent.entry(t.category.as_str()).or_default() += t.amount;
    }

    surface.page_break();
    surface.text(TextStyle::Heading, "Budget Overview");
    surface.text(
        TextStyle::TableHeader,
        &format!(
            "{:<20}{}{:>13}{}{:>13}{}{:>13}{}{}",
            "Category", GAP, "Budget", GAP, "Spent", GAP, "Remaining", GAP, "Status"
        ),
    );

    for budget in budgets {
        let used = spent
            .get(budget.category.as_str())
            .copied()
            .unwrap_or(Decimal::ZERO);
        let remaining = budget.amount - used;
        surface.text(
            TextStyle::TableRow,
            &format!(
                "{:<20}{}{:>13}{}{:>13}{}{:>13}{}{}",
                truncate(&budget.category, 20),
                GAP,
                dollars(budget.amount, None),
                GAP,
                dollars(used, None),
                GAP,
                dollars(remaining, (remaining < Decimal::ZERO).then_some(false)),
                GAP,
                budget_status(used, budget.amount)
            ),
        );
    }
}

fn render_goals(surface: &mut dyn ReportSurface, goals: &[Goal]) {
    surface.spacer(8.0);
    surface.text(TextStyle::Heading, "Savings Goals");
    surface.spacer(2.0);

    for goal in goals {
        surface.text(TextStyle::Strong, &goal.name);
        surface.text(
            TextStyle::Body,
            &format!(
                "{} of {} ({:.0}%)",
                dollars(goal.current_amount, None),
                dollars(goal.target_amount, None),
                goal.progress_percent()
            ),
        );

        let mut details = vec![goal.category.clone()];
        if let Some(deadline) = goal.deadline {
            details.push(format!("Deadline: {}", deadline.format("%b %d, %Y")));
        }
        details.push(format!("Priority: {}", goal.priority));
        surface.text(TextStyle::Small, &details.join("   |   "));
        surface.spacer(4.0);
    }
}

fn render_footer(surface: &mut dyn ReportSurface, ctx: &ExchangeContext, config: &ExchangeConfig) {
    surface.spacer(8.0);
    surface.rule();
    surface.text(
        TextStyle::Small,
        &format!(
            "This report was generated by {} - Your Personal Finance Assistant",
            config.report_title
        ),
    );
    surface.text(
        TextStyle::Small,
        &format!(
            "(c) {} {}. All financial data is confidential.",
            ctx.now.year(),
            config.report_title
        ),
    );
}

/// Lay out the full report.
///
/// The summary always covers every transaction in `data`; the selected
/// sections decide which detail tables follow it.
pub fn render_report(
    surface: &mut dyn ReportSurface,
    data: &ReportData<'_>,
    sections: Sections,
    ctx: &ExchangeContext,
    config: &ExchangeConfig,
) {
    let today = ctx.now.date();

    render_header(surface, ctx, config);
    render_summary(surface, data.transactions);

    if sections.transactions && !data.transactions.is_empty() {
        render_breakdown(surface, data.transactions);
        render_trend(surface, data.transactions, today);
    }
    if sections.transactions {
        render_transactions(surface, data.transactions, config);
    }
    if sections.budgets && !data.budgets.is_empty() {
        render_budgets(surface, data.budgets, data.transactions, today);
    }
    if sections.goals && !data.goals.is_empty() {
        render_goals(surface, data.goals);
    }

    render_footer(surface, ctx, config);
}
