//! BudgetWise data exchange.
//!
//! Moves a user's transactions, budgets and savings goals in and out of the
//! store as JSON, sectioned CSV or a printable PDF report, and recovers what
//! it can from such a report when it is imported again.

pub mod config;
pub mod csv_format;
pub mod db;
pub mod error;
pub mod exchange;
pub mod json_format;
pub mod mapping;
pub mod models;
pub mod pdf_export;
pub mod pdf_import;
pub mod primitives;

pub use config::ExchangeConfig;
pub use db::{MemoryStore, RecordStore, SqliteStore};
pub use error::{ExchangeError, Rejection, Result};
pub use exchange::{persist_batch, Exchange, ExchangeContext, Format, ImportBatch};
pub use models::{
    Budget, Goal, ImportOutcome, Principal, Priority, Sections, Transaction, TransactionKind,
};
