//! PDF report import.
//!
//! Recovers transactions, budgets and goals from the text of a report this
//! crate (or a close imitation) produced. Recovery is heuristic: extracted
//! text loses columns and styling, so every line is classified on its own
//! and only rows that survive validation are kept. Nothing here ever fails
//! an import because of a single bad line.

pub mod budgets;
pub mod classify;
pub mod goals;
pub mod sections;
pub mod transactions;

use crate::config::ExchangeConfig;
use crate::error::{ExchangeError, Result};
use crate::exchange::ImportBatch;
use crate::models::Sections;
use chrono::NaiveDateTime;
use classify::{classify, LineKind};
use sections::SectionTracker;

/// PDF magic bytes
const PDF_MAGIC: &[u8] = b"%PDF";

/// Source of plain text for a PDF document.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Text extraction backed by `pdf-extract`.
///
/// `pdf-extract` can panic on malformed documents, so the call is fenced
/// with `catch_unwind` and a panic becomes an ordinary extraction error.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ExchangeError::PdfExtraction(e.to_string())),
            Err(_) => Err(ExchangeError::PdfExtraction(
                "extractor crashed on a malformed document".to_string(),
            )),
        }
    }
}

/// Cheap structural checks before handing bytes to the extractor.
pub fn validate_pdf(bytes: &[u8], max_bytes: usize) -> Result<()> {
    if bytes.len() < 8 {
        return Err(ExchangeError::InvalidPdf(
            "file too small to be a PDF".to_string(),
        ));
    }

    if bytes.len() > max_bytes {
        return Err(ExchangeError::InvalidPdf(format!(
            "file too large ({} MB). Maximum: {} MB",
            bytes.len() / (1024 * 1024),
            max_bytes / (1024 * 1024)
        )));
    }

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ExchangeError::InvalidPdf("missing PDF header".to_string()));
    }

    Ok(())
}

/// Remove the empty lines text extraction leaves between text runs.
///
/// `pdf-extract` ends every run with a blank line, so blank lines carry no
/// layout information and would cut goal cards after their name.
pub fn drop_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Validate and extract the text of a report.
pub fn read_report_text(
    bytes: &[u8],
    extractor: &dyn TextExtractor,
    config: &ExchangeConfig,
) -> Result<String> {
    validate_pdf(bytes, config.max_pdf_bytes)?;
    let text = drop_blank_lines(&extractor.extract_text(bytes)?);
    log::debug!("Extracted {} characters of report text", text.len());
    Ok(text)
}

/// Walk the report text and collect every record the enabled sections allow.
///
/// Rejected rows become warnings naming the line number and reason.
pub fn parse_report_text(
    text: &str,
    sections: Sections,
    now: NaiveDateTime,
    config: &ExchangeConfig,
) -> ImportBatch {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut tracker = SectionTracker::new();
    let mut batch = ImportBatch::default();

    for (idx, line) in lines.iter().enumerate() {
        if tracker.observe(line) {
            continue;
        }

        match classify(line, tracker.current()) {
            LineKind::TransactionRow if sections.transactions => {
                match transactions::extract_transaction(line, now, config) {
                    Ok(txn) => batch.transactions.push(txn),
                    Err(reason) => batch.reject(idx, "transaction", line, &reason),
                }
            }
            LineKind::BudgetRow if sections.budgets => match budgets::extract_budget(line, now) {
                Ok(budget) => batch.budgets.push(budget),
                Err(reason) => batch.reject(idx, "budget", line, &reason),
            },
            LineKind::GoalStart if sections.goals => {
                let block = goals::goal_block(&lines, idx);
                match goals::extract_goal(&block, now, config) {
                    Ok(goal) => batch.goals.push(goal),
                    Err(reason) => batch.reject(idx, "goal", line, &reason),
                }
            }
            _ => {}
        }
    }

    log::info!(
        "Recovered {} transactions, {} budgets, {} goals from report ({} lines)",
        batch.transactions.len(),
        batch.budgets.len(),
        batch.goals.len(),
        lines.len()
    );

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    const REPORT: &str = "BudgetWise
Personal Financial Report
Generated: Mar 15, 2024 at 12:00 PM
User: alice

Financial Summary
Total Income   $3,200.00
Total Expenses   $4.50

Transaction History
Date   Description   Category   Type   Amount   Method
Jan 05, 2024 Coffee Food EXPENSE -$4.50 Cash
Feb 01, 2024   Salary   Salary   INCOME   +$3,200.00   Bank Transfer
Jan 06, 2024 Refund Food EXPENSE $0.00 Cash

Budget Overview
Category   Budget   Spent   Remaining   Status
Food $500.00 $120.00 $380.00 On Track

Savings Goals
Emergency Fund
$2,500.00 of $10,000.00 (25%)
Savings   |   Priority: High

This report was generated by BudgetWise - Your Personal Finance Assistant
";

    struct FixedText(&'static str);

    impl TextExtractor for FixedText {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_parse_full_report() {
        let config = ExchangeConfig::default();
        let batch = parse_report_text(REPORT, Sections::all(), now(), &config);

        assert_eq!(batch.transactions.len(), 2);
        assert_eq!(batch.transactions[0].description, "Coffee");
        assert_eq!(batch.transactions[1].kind, TransactionKind::Income);

        assert_eq!(batch.budgets.len(), 1);
        assert_eq!(batch.budgets[0].amount, Decimal::from(500));

        assert_eq!(batch.goals.len(), 1);
        assert_eq!(batch.goals[0].name, "Emergency Fund");
        assert_eq!(batch.goals[0].target_amount, Decimal::from(10000));

        // the $0.00 row is rejected with its line number
        assert_eq!(batch.warnings.len(), 1);
        assert!(batch.warnings[0].starts_with("line 14:"));
    }

    #[test]
    fn test_disabled_sections_are_skipped() {
        let config = ExchangeConfig::default();
        let batch = parse_report_text(REPORT, Sections::only_goals(), now(), &config);
        assert!(batch.transactions.is_empty());
        assert!(batch.budgets.is_empty());
        assert_eq!(batch.goals.len(), 1);
        assert!(batch.warnings.is_empty());
    }

    #[test]
    fn test_preamble_money_is_ignored() {
        let config = ExchangeConfig::default();
        let text = "Financial Summary\nJan 05, 2024 Coffee Food EXPENSE -$4.50 Cash\nFood $500.00 $1.00 $499.00 On Track";
        let batch = parse_report_text(text, Sections::all(), now(), &config);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_lines_without_money_yield_nothing_outside_goals() {
        let config = ExchangeConfig::default();
        let text = "Transaction History\nCoffee at the corner\nBudget Overview\nFood On Track";
        let batch = parse_report_text(text, Sections::all(), now(), &config);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_validate_pdf() {
        assert!(matches!(validate_pdf(b"%PDF", 1024), Err(ExchangeError::InvalidPdf(_))));
        assert!(matches!(
            validate_pdf(b"PK\x03\x04 not a pdf", 1024),
            Err(ExchangeError::InvalidPdf(_))
        ));
        assert!(matches!(
            validate_pdf(b"%PDF-1.7 plus some body", 8),
            Err(ExchangeError::InvalidPdf(_))
        ));
        assert!(validate_pdf(b"%PDF-1.7\n%%EOF", 1024).is_ok());
    }

    #[test]
    fn test_read_report_text_checks_before_extracting() {
        let config = ExchangeConfig::default();
        let extractor = FixedText("Transaction History");
        assert!(read_report_text(b"hello world", &extractor, &config).is_err());
        assert_eq!(
            read_report_text(b"%PDF-1.4\n...", &extractor, &config).unwrap(),
            "Transaction History\n"
        );
    }

    #[test]
    fn test_gaps_between_runs_keep_goal_cards_whole() {
        let config = ExchangeConfig::default();
        let extractor = FixedText(
            "Savings Goals\n\nEmergency Fund\n\n$5,000.00 of $10,000.00 (50%)\n\n\
             Savings   |   Priority: High\n\n\nNew Car\n\n$0.00 of $20,000.00 (0%)\n\n",
        );
        let text = read_report_text(b"%PDF-1.4\n...", &extractor, &config).unwrap();
        assert!(!text.contains("\n\n"));

        let batch = parse_report_text(&text, Sections::all(), now(), &config);
        assert_eq!(batch.goals.len(), 2);
        assert_eq!(batch.goals[0].current_amount, Decimal::from(5000));
        assert_eq!(batch.goals[0].target_amount, Decimal::from(10000));
        assert_eq!(batch.goals[1].name, "New Car");
        assert_eq!(batch.goals[1].target_amount, Decimal::from(20000));
    }

    #[test]
    fn test_pdf_extractor_survives_garbage() {
        let result = PdfTextExtractor.extract_text(b"%PDF-1.4\n this is not really a pdf");
        assert!(matches!(result, Err(ExchangeError::PdfExtraction(_))));
    }
}
