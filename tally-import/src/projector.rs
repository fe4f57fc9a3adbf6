//! Statement -> importable records.
//!
//! One record per statement line, regular ledger first. Nothing is merged,
//! deduplicated or categorized beyond the fixed default.

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_ingest::{CreditCardStatement, Direction, Ledger, StatementTransaction};

pub const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Debit,
    Credit,
}

impl From<Direction> for EntryKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Debit => EntryKind::Debit,
            Direction::Credit => EntryKind::Credit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportableTransaction {
    pub account_id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Signed as on the statement: negative is money out.
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub category: String,
    pub source_category: String,
}

impl ImportableTransaction {
    fn from_line(txn: &StatementTransaction, ledger: Ledger, account_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            date: txn.date,
            description: txn.description.clone(),
            amount: txn.amount,
            kind: txn.direction().into(),
            category: DEFAULT_CATEGORY.to_string(),
            source_category: source_category(ledger).to_string(),
        }
    }
}

/// Tag recording which ledger a record came from.
pub fn source_category(ledger: Ledger) -> &'static str {
    match ledger {
        Ledger::Regular => "credit-card-statement",
        Ledger::InterestFree => "credit-card-interest-free",
    }
}

pub fn project(statement: &CreditCardStatement, account_id: &str) -> Vec<ImportableTransaction> {
    let mut out = Vec::with_capacity(statement.transaction_count());
    for ledger in [Ledger::Regular, Ledger::InterestFree] {
        let lines = statement.ledger(ledger);
        debug!("projecting {} {} lines into {account_id}", lines.len(), ledger.label());
        out.extend(
            lines
                .iter()
                .map(|txn| ImportableTransaction::from_line(txn, ledger, account_id)),
        );
    }
    out
}

/// Counts reported back after an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn new(imported: usize, skipped: usize) -> Self {
        Self { imported, skipped }
    }

    pub fn merge(&mut self, other: ImportSummary) {
        self.imported += other.imported;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} transactions imported, {} lines could not be parsed",
            self.imported, self.skipped
        )
    }
}
