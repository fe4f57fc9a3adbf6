//! End-to-end statement parsing: extractor output in, statement out.

use chrono::{Months, NaiveDate};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{FormatConfigError, StatementFormatError};
use crate::format::{StatementFormat, compile, require_groups};
use crate::parsers::{MetadataParser, TransactionLineParser};
use crate::sections::SectionLocator;
use crate::text::{ExtractedDocument, despace, reconstruct};
use crate::types::{CreditCardStatement, Diagnostic, Ledger, StatementTransaction};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// A parsed statement plus everything that had to be worked around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub statement: CreditCardStatement,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    pub fn transaction_count(&self) -> usize {
        self.statement.transaction_count()
    }

    pub fn skipped_entries(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_skipped_entry()).count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_skipped_entry())
    }

    /// "X transactions parsed, Y lines could not be parsed"
    pub fn summary(&self) -> String {
        format!(
            "{} transactions parsed, {} lines could not be parsed",
            self.transaction_count(),
            self.skipped_entries()
        )
    }
}

/// A compiled statement format. Immutable, so one parser can serve any
/// number of concurrent callers.
#[derive(Debug, Clone)]
pub struct StatementParser {
    format_id: String,
    sections: SectionLocator,
    metadata: MetadataParser,
    lines: TransactionLineParser,
}

impl StatementParser {
    pub fn new(format: &StatementFormat) -> Result<Self, FormatConfigError> {
        let date = compile("patterns.entry_date", &format.patterns.entry_date)?;
        require_groups("patterns.entry_date", &date, &["day", "month"])?;
        let money = compile("patterns.money", &format.patterns.money)?;
        require_groups("patterns.money", &money, &["num"])?;

        Ok(Self {
            format_id: format.id.clone(),
            sections: SectionLocator::new(&format.anchors)?,
            metadata: MetadataParser::new(&format.labels, date.clone(), money.clone())?,
            lines: TransactionLineParser::new(
                date,
                money,
                &format.patterns.noise,
                format.card_suffix_width,
                &format.keywords,
                &format.signs,
            )?,
        })
    }

    pub fn format_id(&self) -> &str {
        &self.format_id
    }

    /// Parse one statement from the PDF bytes and the extractor's fragment
    /// tree for those bytes.
    pub fn parse(
        &self,
        pdf: &[u8],
        doc: &ExtractedDocument,
    ) -> Result<ParseOutcome, StatementFormatError> {
        let mut diagnostics = Vec::new();
        if !pdf.starts_with(PDF_MAGIC) {
            warn!("input of {} bytes has no PDF header", pdf.len());
            diagnostics.push(Diagnostic::NotPdf { len: pdf.len() });
        }
        let text = reconstruct(doc);
        self.parse_normalized(&text, diagnostics)
    }

    /// Parse statement text that was extracted some other way.
    pub fn parse_text(&self, text: &str) -> Result<ParseOutcome, StatementFormatError> {
        self.parse_normalized(&despace(text), Vec::new())
    }

    fn parse_normalized(
        &self,
        text: &str,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Result<ParseOutcome, StatementFormatError> {
        let sections = self.sections.locate(text)?;
        let metadata = self.metadata.parse(sections.metadata, &mut diagnostics)?;

        let transactions = self.lines.parse(
            sections.transactions,
            Ledger::Regular,
            metadata.statement_date,
            &mut diagnostics,
        );
        let interest_free_transactions = sections
            .interest_free
            .map(|region| {
                self.lines.parse(
                    region,
                    Ledger::InterestFree,
                    metadata.statement_date,
                    &mut diagnostics,
                )
            })
            .unwrap_or_default();

        let window_start = metadata.period_start.unwrap_or_else(|| {
            metadata
                .statement_date
                .checked_sub_months(Months::new(1))
                .unwrap_or(metadata.statement_date)
        });
        check_period(&transactions, window_start, metadata.statement_date, &mut diagnostics);

        let outcome = ParseOutcome {
            statement: CreditCardStatement {
                metadata,
                transactions,
                interest_free_transactions,
            },
            diagnostics,
        };
        info!("[{}] {}", self.format_id, outcome.summary());
        Ok(outcome)
    }
}

fn check_period(
    transactions: &[StatementTransaction],
    start: NaiveDate,
    end: NaiveDate,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for txn in transactions {
        if txn.date < start || txn.date > end {
            warn!("{} on {} is outside {start}..={end}", txn.description, txn.date);
            diagnostics.push(Diagnostic::DateOutsidePeriod {
                date: txn.date,
                description: txn.description.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> StatementParser {
        StatementParser::new(&StatementFormat::builtin()).unwrap()
    }

    const TEXT: &str = "Statement date 30 Sep 2025 Closing balance $20.00 \
        Your transactions 12 Sep Coffee 4.50 01 Jan Old thing 15.50";

    #[test]
    fn test_out_of_period_is_flagged_but_kept() {
        let outcome = parser().parse_text(TEXT).unwrap();
        assert_eq!(outcome.statement.transactions.len(), 2);
        assert_eq!(
            outcome.warnings().cloned().collect::<Vec<_>>(),
            vec![
                Diagnostic::FieldParseWarning {
                    field: "openingBalance".into(),
                    message: "label not found".into()
                },
                Diagnostic::FieldParseWarning {
                    field: "creditLimit".into(),
                    message: "label not found".into()
                },
                Diagnostic::FieldParseWarning {
                    field: "availableCredit".into(),
                    message: "label not found".into()
                },
                Diagnostic::FieldParseWarning {
                    field: "minimumPayment".into(),
                    message: "label not found".into()
                },
                Diagnostic::FieldParseWarning {
                    field: "dueDate".into(),
                    message: "label not found".into()
                },
                Diagnostic::FieldParseWarning {
                    field: "accountNumber".into(),
                    message: "label not found".into()
                },
                Diagnostic::DateOutsidePeriod {
                    date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    description: "Old thing".into(),
                },
            ]
        );
    }

    #[test]
    fn test_non_pdf_bytes_warn() {
        let doc = ExtractedDocument::from_plain_pages(vec![vec![TEXT]]);
        let outcome = parser().parse(b"not a pdf", &doc).unwrap();
        assert!(outcome.diagnostics.contains(&Diagnostic::NotPdf { len: 9 }));

        let outcome = parser().parse(b"%PDF-1.7\n...", &doc).unwrap();
        assert!(!outcome.diagnostics.iter().any(|d| matches!(d, Diagnostic::NotPdf { .. })));
    }

    #[test]
    fn test_unread_account_number_is_null() {
        let outcome = parser().parse_text(TEXT).unwrap();
        let json = serde_json::to_value(&outcome.statement).unwrap();
        assert!(json["accountNumber"].is_null());
        assert!(outcome.diagnostics.contains(&Diagnostic::FieldParseWarning {
            field: "accountNumber".into(),
            message: "label not found".into(),
        }));

        let outcome = parser()
            .parse_text(&format!("Account number 4564 XXXX XXXX 1234 {TEXT}"))
            .unwrap();
        let json = serde_json::to_value(&outcome.statement).unwrap();
        assert_eq!(json["accountNumber"], "4564 XXXX XXXX 1234");
    }

    #[test]
    fn test_summary() {
        let outcome = parser()
            .parse_text(
                "Statement date 30 Sep 2025 Closing balance $20.00 \
                 Your transactions 12 Sep Coffee 4.50 13 Sep Broken",
            )
            .unwrap();
        assert_eq!(outcome.summary(), "1 transactions parsed, 1 lines could not be parsed");
    }
}
