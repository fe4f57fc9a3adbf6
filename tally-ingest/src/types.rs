use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which transaction list on the statement an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ledger {
    Regular,
    InterestFree,
}

impl Ledger {
    pub fn label(&self) -> &'static str {
        match self {
            Ledger::Regular => "regular",
            Ledger::InterestFree => "interest-free",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Payment,
    Refund,
    Interest,
    Fee,
}

impl TransactionType {
    /// Payments and refunds reduce what is owed on the card.
    pub fn is_credit_like(&self) -> bool {
        matches!(self, TransactionType::Payment | TransactionType::Refund)
    }
}

/// Direction of money from the cardholder's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money out: purchases, fees, interest. Stored as a negative amount.
    Debit,
    /// Money in: payments, refunds. Stored as a positive amount.
    Credit,
}

impl Direction {
    pub fn apply(&self, magnitude: Decimal) -> Decimal {
        match self {
            Direction::Debit => -magnitude.abs(),
            Direction::Credit => magnitude.abs(),
        }
    }

    pub fn of(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            Direction::Debit
        } else {
            Direction::Credit
        }
    }
}

/// One itemized line on the statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementTransaction {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_date: Option<NaiveDate>,
    pub description: String,
    /// Card suffix (last digits) when the statement prints one, else empty.
    pub card: String,
    /// Negative means money out (purchase, fee, interest); positive means a credit.
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl StatementTransaction {
    pub fn direction(&self) -> Direction {
        Direction::of(self.amount)
    }
}

/// Summary block printed at the top of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementMetadata {
    pub statement_date: NaiveDate,
    /// `None` (JSON `null`) when no account number could be read; the
    /// parse still succeeds and a `FieldParseWarning` is recorded.
    pub account_number: Option<String>,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub credit_limit: Decimal,
    pub available_credit: Decimal,
    pub minimum_payment: Decimal,
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardStatement {
    #[serde(flatten)]
    pub metadata: StatementMetadata,
    pub transactions: Vec<StatementTransaction>,
    pub interest_free_transactions: Vec<StatementTransaction>,
}

impl CreditCardStatement {
    pub fn ledger(&self, ledger: Ledger) -> &[StatementTransaction] {
        match ledger {
            Ledger::Regular => &self.transactions,
            Ledger::InterestFree => &self.interest_free_transactions,
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len() + self.interest_free_transactions.len()
    }
}

/// Soft problems found while parsing. None of these stop the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A non-critical metadata field was missing or unreadable and was defaulted.
    #[serde(rename_all = "camelCase")]
    FieldParseWarning { field: String, message: String },
    /// A transaction-shaped segment could not be resolved and was left out.
    #[serde(rename_all = "camelCase")]
    EntrySkipped {
        ledger: Ledger,
        segment: String,
        reason: String,
    },
    /// A regular transaction is dated outside the statement period. It is kept.
    #[serde(rename_all = "camelCase")]
    DateOutsidePeriod {
        date: NaiveDate,
        description: String,
    },
    /// The input buffer does not start with a PDF header.
    #[serde(rename_all = "camelCase")]
    NotPdf { len: usize },
}

impl Diagnostic {
    pub fn is_skipped_entry(&self) -> bool {
        matches!(self, Diagnostic::EntrySkipped { .. })
    }
}
