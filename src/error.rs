//! Error types for the exchange engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid PDF file: {0}")]
    InvalidPdf(String),

    #[error("Failed to extract text from PDF: {0}")]
    PdfExtraction(String),

    #[error("Failed to render PDF report: {0}")]
    PdfRender(String),

    #[error("File is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Why a single record was left out of an import.
///
/// Rejections are never fatal; they end up as warnings on the outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("row does not match the expected column layout")]
    Unrecognized,

    #[error("no amount found")]
    NoAmount,

    #[error("amount is zero")]
    ZeroAmount,

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("description is empty")]
    EmptyDescription,

    #[error("category is empty")]
    EmptyCategory,

    #[error("end date is before start date")]
    EndBeforeStart,

    #[error("not an object")]
    NotAnObject,
}
