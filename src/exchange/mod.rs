//! Export and import entry points.
//!
//! [`Exchange`] ties a [`RecordStore`] to the three wire formats. Imports run
//! in two steps: a format parser builds an [`ImportBatch`] without touching
//! the store, then [`persist_batch`] saves it one record at a time.

mod batch;

pub use batch::{persist_batch, ImportBatch};

use crate::config::ExchangeConfig;
use crate::csv_format;
use crate::db::RecordStore;
use crate::error::{ExchangeError, Result};
use crate::json_format;
use crate::models::{ImportOutcome, Principal, Sections};
use crate::pdf_export::{self, PdfSurface, ReportData};
use crate::pdf_import::{self, PdfTextExtractor, TextExtractor};
use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
    Pdf,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    /// Infer the format from a file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
            Self::Pdf => "application/pdf",
        }
    }
}

impl FromStr for Format {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ExchangeError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a call runs for, and the clock it runs at.
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    pub principal: Principal,
    pub now: NaiveDateTime,
}

impl ExchangeContext {
    pub fn new(principal: Principal) -> Self {
        Self::at(principal, chrono::Local::now().naive_local())
    }

    pub fn at(principal: Principal, now: NaiveDateTime) -> Self {
        Self { principal, now }
    }
}

pub struct Exchange<S: RecordStore> {
    store: S,
    config: ExchangeConfig,
    extractor: Box<dyn TextExtractor>,
}

impl<S: RecordStore> Exchange<S> {
    pub fn new(store: S, config: ExchangeConfig) -> Self {
        Self::with_extractor(store, config, Box::new(PdfTextExtractor))
    }

    pub fn with_extractor(
        store: S,
        config: ExchangeConfig,
        extractor: Box<dyn TextExtractor>,
    ) -> Self {
        Self {
            store,
            config,
            extractor,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Export by format name. An unknown name fails before any data is read.
    pub fn export(&self, ctx: &ExchangeContext, format: &str, sections: Sections) -> Result<Vec<u8>> {
        let format: Format = format.parse()?;
        self.export_as(ctx, format, sections)
    }

    pub fn export_as(
        &self,
        ctx: &ExchangeContext,
        format: Format,
        sections: Sections,
    ) -> Result<Vec<u8>> {
        let owner = &ctx.principal;
        // the report summary covers all transactions, whatever the selection
        let wants_transactions = sections.transactions || format == Format::Pdf;
        let transactions = if wants_transactions {
            self.store.transactions(owner)?
        } else {
            Vec::new()
        };
        let budgets = if sections.budgets {
            self.store.budgets(owner)?
        } else {
            Vec::new()
        };
        let goals = if sections.goals {
            self.store.goals(owner)?
        } else {
            Vec::new()
        };

        let bytes = match format {
            Format::Json => json_format::write_json(ctx, sections, &transactions, &budgets, &goals)?,
            Format::Csv => csv_format::write_csv(sections, &transactions, &budgets, &goals)?,
            Format::Pdf => {
                let data = ReportData {
                    transactions: &transactions,
                    budgets: &budgets,
                    goals: &goals,
                };
                let mut surface = PdfSurface::new(&self.config.report_title)?;
                pdf_export::render_report(&mut surface, &data, sections, ctx, &self.config);
                surface.finish()?
            }
        };

        log::info!(
            "Exported {} for {}: {} transactions, {} budgets, {} goals ({} bytes)",
            format,
            owner.username,
            transactions.len(),
            budgets.len(),
            goals.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Import by format name.
    ///
    /// An unknown name is an error. A file that cannot be read as the named
    /// format gives an unsuccessful outcome with zero counts; anything else
    /// gives a successful outcome even if every record was rejected.
    pub fn import(
        &mut self,
        ctx: &ExchangeContext,
        format: &str,
        bytes: &[u8],
        sections: Sections,
    ) -> Result<ImportOutcome> {
        let format: Format = format.parse()?;
        Ok(self.import_as(ctx, format, bytes, sections))
    }

    pub fn import_as(
        &mut self,
        ctx: &ExchangeContext,
        format: Format,
        bytes: &[u8],
        sections: Sections,
    ) -> ImportOutcome {
        let parsed = match format {
            Format::Json => json_format::parse_json(bytes, sections, ctx, &self.config),
            Format::Csv => csv_format::parse_csv(bytes, sections, ctx, &self.config),
            Format::Pdf => {
                pdf_import::read_report_text(bytes, self.extractor.as_ref(), &self.config)
                    .map(|text| pdf_import::parse_report_text(&text, sections, ctx.now, &self.config))
            }
        };

        let batch = match parsed {
            Ok(batch) => batch,
            Err(e) => {
                log::warn!("{} import for {} failed: {}", format, ctx.principal.username, e);
                return ImportOutcome::failed(failure_message(format, &e));
            }
        };

        let mut outcome = persist_batch(&mut self.store, &ctx.principal, batch);
        if format == Format::Pdf && outcome.total_imported() == 0 {
            outcome.message = "The PDF was read but no records could be recognised. \
                               PDF reports are meant for reading; export as JSON or CSV for a \
                               reliable backup."
                .to_string();
        }

        log::info!(
            "{} import for {}: {}",
            format,
            ctx.principal.username,
            outcome.message
        );
        outcome
    }
}

fn failure_message(format: Format, err: &ExchangeError) -> String {
    match format {
        Format::Json => format!("Failed to parse JSON file: {}", err),
        Format::Csv => format!("Failed to read CSV file: {}", err),
        Format::Pdf => format!(
            "Failed to read PDF file: {}. Please try JSON or CSV format.",
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteStore};
    use crate::models::{Budget, Goal, Priority, Transaction, TransactionKind};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    /// Hands back fixed text instead of reading the PDF.
    struct TextOf(String);

    impl TextExtractor for TextOf {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn ctx() -> ExchangeContext {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        ExchangeContext::at(Principal::new("alice").with_email("alice@example.com"), now)
    }

    fn seeded<S: RecordStore>(mut store: S) -> S {
        let owner = ctx().principal;
        let txn = |description: &str, amount: i64, kind: TransactionKind, day: u32| Transaction {
            id: None,
            description: description.to_string(),
            amount: Decimal::new(amount, 2),
            category: if kind == TransactionKind::Income { "Salary" } else { "Food" }.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            kind,
            payment_method: Some("Card".to_string()),
            currency: Some("USD".to_string()),
        };
        store
            .insert_transaction(&owner, &txn("Coffee", 450, TransactionKind::Expense, 5))
            .unwrap();
        store
            .insert_transaction(&owner, &txn("Paycheck", 320000, TransactionKind::Income, 1))
            .unwrap();
        store
            .insert_budget(
                &owner,
                &Budget {
                    id: None,
                    category: "Food".to_string(),
                    amount: Decimal::from(500),
                    start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                    end_date: NaiveDate::from_ymd_opt(2024, 3, 31),
                },
            )
            .unwrap();
        store
            .insert_goal(
                &owner,
                &Goal {
                    id: None,
                    name: "Emergency Fund".to_string(),
                    category: "Savings".to_string(),
                    target_amount: Decimal::from(10000),
                    current_amount: Decimal::from(5000),
                    deadline: NaiveDate::from_ymd_opt(2024, 12, 31),
                    priority: Priority::High,
                    created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!(" csv ".parse::<Format>().unwrap(), Format::Csv);
        assert!(matches!(
            "xml".parse::<Format>(),
            Err(ExchangeError::UnsupportedFormat(_))
        ));
        assert_eq!(Format::from_extension(Path::new("backup.PDF")), Some(Format::Pdf));
        assert_eq!(Format::from_extension(Path::new("backup.xlsx")), None);
        assert_eq!(Format::from_extension(Path::new("backup")), None);
    }

    #[test]
    fn test_unsupported_format_rejected_before_reading() {
        let mut exchange = Exchange::new(MemoryStore::new(), ExchangeConfig::default());
        let result = exchange.import(&ctx(), "xml", b"<data/>", Sections::all());
        assert!(matches!(result, Err(ExchangeError::UnsupportedFormat(_))));
        assert!(exchange.export(&ctx(), "xml", Sections::all()).is_err());
    }

    #[test]
    fn test_json_roundtrip_between_stores() {
        let source = Exchange::new(seeded(MemoryStore::new()), ExchangeConfig::default());
        let bytes = source.export(&ctx(), "json", Sections::all()).unwrap();

        let mut target = Exchange::new(SqliteStore::open_in_memory().unwrap(), ExchangeConfig::default());
        let outcome = target.import(&ctx(), "json", &bytes, Sections::all()).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.transactions_imported, 2);
        assert_eq!(outcome.budgets_imported, 1);
        assert_eq!(outcome.goals_imported, 1);

        let owner = &ctx().principal;
        let mut copied = target.store().transactions(owner).unwrap();
        copied.sort_by_key(|t| t.date);
        let mut original = source.store().transactions(owner).unwrap();
        original.sort_by_key(|t| t.date);
        for (a, b) in copied.iter().zip(&original) {
            assert_eq!(Transaction { id: None, ..a.clone() }, Transaction { id: None, ..b.clone() });
        }
    }

    #[test]
    fn test_csv_import_of_documented_row() {
        let mut exchange = Exchange::new(MemoryStore::new(), ExchangeConfig::default());
        let csv = b"# TRANSACTIONS\n\
            id,description,amount,category,date,type,paymentMethod,currency\n\
            1,\"Coffee\",4.50,\"Food\",\"2024-01-05T08:00:00\",\"EXPENSE\",\"Cash\",\"USD\"\n";
        let outcome = exchange.import(&ctx(), "csv", csv, Sections::all()).unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.transactions_imported, 1);
        let stored = exchange.store().transactions(&ctx().principal).unwrap();
        assert_eq!(stored[0].kind, TransactionKind::Expense);
        assert_eq!(stored[0].amount, Decimal::new(450, 2));
    }

    #[test]
    fn test_broken_json_is_unsuccessful() {
        let mut exchange = Exchange::new(MemoryStore::new(), ExchangeConfig::default());
        let outcome = exchange.import(&ctx(), "json", b"{\"transactions\": [", Sections::all()).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.total_imported(), 0);
        assert!(outcome.message.starts_with("Failed to parse JSON file"));
    }

    #[test]
    fn test_non_pdf_bytes_are_unsuccessful() {
        let mut exchange = Exchange::new(MemoryStore::new(), ExchangeConfig::default());
        let outcome = exchange.import(&ctx(), "pdf", b"PK\x03\x04zipfile", Sections::all()).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("JSON or CSV"));
    }

    #[test]
    fn test_pdf_with_nothing_recognisable_still_succeeds() {
        let extractor = Box::new(TextOf("Some unrelated letter\nDear customer".to_string()));
        let mut exchange =
            Exchange::with_extractor(MemoryStore::new(), ExchangeConfig::default(), extractor);
        let outcome = exchange
            .import(&ctx(), "pdf", b"%PDF-1.4\nwhatever", Sections::all())
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.total_imported(), 0);
        assert!(outcome.message.contains("JSON or CSV"));
    }

    #[test]
    fn test_report_text_recovers_records() {
        let source = Exchange::new(seeded(MemoryStore::new()), ExchangeConfig::default());
        let owner = ctx().principal;
        let transactions = source.store().transactions(&owner).unwrap();
        let budgets = source.store().budgets(&owner).unwrap();
        let goals = source.store().goals(&owner).unwrap();

        let mut surface = pdf_export::TextSurface::new();
        let data = ReportData {
            transactions: &transactions,
            budgets: &budgets,
            goals: &goals,
        };
        pdf_export::render_report(&mut surface, &data, Sections::all(), &ctx(), source.config());

        let extractor = Box::new(TextOf(surface.into_text()));
        let mut target = Exchange::with_extractor(MemoryStore::new(), ExchangeConfig::default(), extractor);
        let outcome = target
            .import(&ctx(), "pdf", b"%PDF-1.4\nrendered elsewhere", Sections::all())
            .unwrap();

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.transactions_imported, 2);
        assert_eq!(outcome.budgets_imported, 1);
        assert_eq!(outcome.goals_imported, 1);

        let recovered = target.store().transactions(&owner).unwrap();
        let coffee = recovered.iter().find(|t| t.description == "Coffee").unwrap();
        assert_eq!(coffee.amount, Decimal::new(450, 2));
        assert_eq!(coffee.category, "Food");
        assert_eq!(coffee.payment_method.as_deref(), Some("Card"));
        assert_eq!(
            coffee.date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );

        let goal = &target.store().goals(&owner).unwrap()[0];
        assert_eq!(goal.name, "Emergency Fund");
        assert_eq!(goal.current_amount, Decimal::from(5000));
        assert_eq!(goal.target_amount, Decimal::from(10000));

        let budget = &target.store().budgets(&owner).unwrap()[0];
        assert_eq!(budget.category, "Food");
        assert_eq!(budget.amount, Decimal::from(500));
    }

    #[test]
    fn test_pdf_export_produces_a_pdf() {
        let exchange = Exchange::new(seeded(MemoryStore::new()), ExchangeConfig::default());
        let bytes = exchange.export(&ctx(), "pdf", Sections::all()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_exported_pdf_keeps_goal_amounts() {
        let source = Exchange::new(seeded(MemoryStore::new()), ExchangeConfig::default());
        let bytes = source.export(&ctx(), "pdf", Sections::only_goals()).unwrap();

        let mut target = Exchange::new(MemoryStore::new(), ExchangeConfig::default());
        let outcome = target.import(&ctx(), "pdf", &bytes, Sections::only_goals()).unwrap();
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.goals_imported, 1);

        let goal = &target.store().goals(&ctx().principal).unwrap()[0];
        assert_eq!(goal.name, "Emergency Fund");
        assert_eq!(goal.current_amount, Decimal::from(5000));
        assert_eq!(goal.target_amount, Decimal::from(10000));
    }
}
