//! Report section tracking.
//!
//! A report is read top to bottom. Heading lines move the reader into the
//! transaction, budget or goal part of the document; everything before the
//! first such heading is preamble (title, summary, charts).

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Section {
    #[default]
    Preamble,
    Transactions,
    Budgets,
    Goals,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preamble => "PREAMBLE",
            Self::Transactions => "TRANSACTIONS",
            Self::Budgets => "BUDGETS",
            Self::Goals => "GOALS",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return the section a heading line opens, if it is one.
///
/// Matching is case-insensitive and keyword based, so "TRANSACTION HISTORY"
/// and "Recent transaction history" both count.
pub fn section_heading(line: &str) -> Option<Section> {
    let lower = line.to_lowercase();
    let mentions_transaction = lower.contains("transaction");

    if mentions_transaction && lower.contains("history") {
        return Some(Section::Transactions);
    }
    if mentions_transaction {
        return None;
    }
    if lower.contains("budget") && (lower.contains("overview") || lower.contains("status")) {
        return Some(Section::Budgets);
    }
    if (lower.contains("goal") || lower.contains("savings"))
        && (lower.contains("progress") || lower.contains("goals"))
    {
        return Some(Section::Goals);
    }
    None
}

/// Current position while walking the report lines.
#[derive(Debug, Default)]
pub struct SectionTracker {
    current: Section,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Section {
        self.current
    }

    /// Feed one line. Returns true when the line was a heading that moved
    /// the tracker; such lines carry no record.
    pub fn observe(&mut self, line: &str) -> bool {
        match section_heading(line) {
            Some(section) => {
                if section != self.current {
                    log::debug!("Entering {} section at {:?}", section, line);
                }
                self.current = section;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_headings() {
        assert_eq!(section_heading("Transaction History"), Some(Section::Transactions));
        assert_eq!(section_heading("RECENT TRANSACTION HISTORY"), Some(Section::Transactions));
        assert_eq!(section_heading("Budget Overview"), Some(Section::Budgets));
        assert_eq!(section_heading("budget status"), Some(Section::Budgets));
        assert_eq!(section_heading("Savings Goals"), Some(Section::Goals));
        assert_eq!(section_heading("Goal Progress"), Some(Section::Goals));
    }

    #[test]
    fn test_non_headings() {
        assert_eq!(section_heading("Savings Rate   12.5%"), None);
        assert_eq!(section_heading("Budget"), None);
        assert_eq!(section_heading("Transaction budget status"), None);
        assert_eq!(section_heading("Jan 05, 2024   Coffee   Food"), None);
    }

    #[test]
    fn test_tracker_transitions() {
        let mut tracker = SectionTracker::new();
        assert_eq!(tracker.current(), Section::Preamble);

        assert!(!tracker.observe("Financial Summary"));
        assert_eq!(tracker.current(), Section::Preamble);

        assert!(tracker.observe("Transaction History"));
        assert_eq!(tracker.current(), Section::Transactions);

        assert!(tracker.observe("Savings Goals"));
        assert_eq!(tracker.current(), Section::Goals);

        assert!(tracker.observe("Budget Overview"));
        assert_eq!(tracker.current(), Section::Budgets);
    }
}
