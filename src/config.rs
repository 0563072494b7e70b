//! Engine configuration.
//!
//! Every field has a default so a partial (or missing) config file is fine.

use crate::error::{ExchangeError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum accepted PDF size (100 MB)
pub const DEFAULT_MAX_PDF_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExchangeConfig {
    /// Currency code given to imported transactions that do not state one
    pub default_currency: String,
    /// Title printed at the top of PDF reports
    pub report_title: String,
    /// How many of the most recent transactions the PDF report lists
    pub max_report_transactions: usize,
    /// Target used for a recovered goal whose block shows no amount
    pub goal_placeholder_target: Decimal,
    /// Recovered goals get a deadline this many months out
    pub goal_deadline_months: u32,
    pub max_pdf_bytes: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            default_currency: "USD".to_string(),
            report_title: "BudgetWise".to_string(),
            max_report_transactions: 50,
            goal_placeholder_target: Decimal::from(1000),
            goal_deadline_months: 6,
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
        }
    }
}

impl ExchangeConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ExchangeError::Config(format!("{}: {}", path.display(), e)))?;

        if config.max_report_transactions == 0 {
            return Err(ExchangeError::Config(
                "maxReportTransactions must be at least 1".to_string(),
            ));
        }
        if config.goal_placeholder_target <= Decimal::ZERO {
            return Err(ExchangeError::Config(
                "goalPlaceholderTarget must be positive".to_string(),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ExchangeConfig::load(Path::new("/definitely/not/here.json")).unwrap();
        assert_eq!(config, ExchangeConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"defaultCurrency": "INR", "maxReportTransactions": 20}}"#).unwrap();

        let config = ExchangeConfig::load(file.path()).unwrap();
        assert_eq!(config.default_currency, "INR");
        assert_eq!(config.max_report_transactions, 20);
        assert_eq!(config.report_title, "BudgetWise");
        assert_eq!(config.goal_deadline_months, 6);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"maxReportTransactions": 0}}"#).unwrap();

        assert!(matches!(
            ExchangeConfig::load(file.path()),
            Err(ExchangeError::Config(_))
        ));
    }
}
