//! BudgetWise exchange CLI
//!
//! Usage:
//!   budgetwise --user alice export --output backup.json
//!   budgetwise --user alice import --file backup.csv --only budgets
//!   budgetwise extract report.pdf
//!   budgetwise inspect report.pdf

use anyhow::{bail, Context, Result};
use budgetwise_exchange::pdf_import::classify::{classify, LineKind};
use budgetwise_exchange::pdf_import::sections::SectionTracker;
use budgetwise_exchange::pdf_import::{self, PdfTextExtractor};
use budgetwise_exchange::{
    Exchange, ExchangeConfig, ExchangeContext, Format, Principal, Sections, SqliteStore,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Export and import BudgetWise data
#[derive(Parser)]
#[command(name = "budgetwise")]
#[command(about = "Export and import BudgetWise transactions, budgets and goals", long_about = None)]
#[command(version)]
struct Cli {
    /// Database path (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User the data belongs to
    #[arg(short, long, global = true, default_value = "default")]
    user: String,

    /// Email printed on PDF reports
    #[arg(long, global = true)]
    email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    Transactions,
    Budgets,
    Goals,
}

#[derive(Subcommand)]
enum Commands {
    /// Export data to a file
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// json, csv or pdf (inferred from the output extension if omitted)
        #[arg(short, long)]
        format: Option<String>,

        /// Restrict to these sections (repeatable; default: all)
        #[arg(long, value_enum)]
        only: Vec<Section>,
    },

    /// Import data from a file
    Import {
        /// Input file
        #[arg(short, long)]
        file: PathBuf,

        /// json, csv or pdf (inferred from the file extension if omitted)
        #[arg(short = 'F', long)]
        format: Option<String>,

        /// Restrict to these sections (repeatable; default: all)
        #[arg(long, value_enum)]
        only: Vec<Section>,
    },

    /// Print the text extracted from a PDF
    Extract {
        /// PDF file
        file: PathBuf,
    },

    /// Show how each line of a report is classified
    Inspect {
        /// PDF or plain text file
        file: PathBuf,
    },
}

fn sections(only: &[Section]) -> Sections {
    if only.is_empty() {
        return Sections::all();
    }
    Sections {
        transactions: only.contains(&Section::Transactions),
        budgets: only.contains(&Section::Budgets),
        goals: only.contains(&Section::Goals),
    }
}

fn resolve_format(explicit: Option<&str>, path: &Path) -> Result<Format> {
    match explicit {
        Some(name) => Ok(name.parse()?),
        None => match Format::from_extension(path) {
            Some(format) => Ok(format),
            None => bail!(
                "Cannot tell the format of {}; pass --format json|csv|pdf",
                path.display()
            ),
        },
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("budgetwise")
        .join("budgetwise.db")
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("budgetwise").join("exchange.json"))
}

fn load_config(path: Option<&Path>) -> Result<ExchangeConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(ExchangeConfig::default()),
        },
    };
    ExchangeConfig::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
}

fn report_text(file: &Path, config: &ExchangeConfig) -> Result<String> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    if Format::from_extension(file) == Some(Format::Pdf) {
        let text = pdf_import::read_report_text(&bytes, &PdfTextExtractor, config)
            .with_context(|| format!("Failed to extract text from {}", file.display()))?;
        Ok(text)
    } else {
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn open_exchange(cli: &Cli, config: ExchangeConfig) -> Result<Exchange<SqliteStore>> {
    let db_path = cli.db.clone().unwrap_or_else(default_db_path);
    log::debug!("Using database {}", db_path.display());
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    Ok(Exchange::new(store, config))
}

fn context(cli: &Cli) -> ExchangeContext {
    let mut principal = Principal::new(cli.user.clone());
    if let Some(email) = &cli.email {
        principal = principal.with_email(email.clone());
    }
    ExchangeContext::new(principal)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Export {
            output,
            format,
            only,
        } => {
            let format = resolve_format(format.as_deref(), output)?;
            let exchange = open_exchange(&cli, config)?;
            let bytes = exchange.export_as(&context(&cli), format, sections(only))?;
            std::fs::write(output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Wrote {} ({} bytes, {})",
                output.display(),
                bytes.len(),
                format.mime_type()
            );
        }
        Commands::Import { file, format, only } => {
            let format = resolve_format(format.as_deref(), file)?;
            let bytes =
                std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
            let mut exchange = open_exchange(&cli, config)?;
            let outcome = exchange.import_as(&context(&cli), format, &bytes, sections(only));

            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                bail!(outcome.message);
            }
        }
        Commands::Extract { file } => {
            print!("{}", report_text(file, &config)?);
        }
        Commands::Inspect { file } => {
            let text = report_text(file, &config)?;
            let mut tracker = SectionTracker::new();
            for (idx, line) in text.lines().enumerate() {
                let line = line.trim();
                let kind = classify(line, tracker.current());
                tracker.observe(line);
                if kind != LineKind::Blank {
                    println!(
                        "{:>4}  {:<12}  {:<15}  {}",
                        idx + 1,
                        tracker.current().as_str(),
                        format!("{:?}", kind),
                        line
                    );
                }
            }
        }
    }

    Ok(())
}
