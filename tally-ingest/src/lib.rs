//! tally-ingest: credit-card statement text reconstruction and parsing.
//!
//! Pipeline: extractor fragment tree -> [`text`] -> [`sections`] ->
//! [`parsers::metadata`] + [`parsers::transactions`] -> [`CreditCardStatement`].
//! Layout specifics live in [`format::StatementFormat`].

pub mod error;
pub mod format;
pub mod parsers;
pub mod sections;
pub mod statement;
pub mod text;
pub mod tokens;
pub mod types;

pub use error::{FormatConfigError, StatementFormatError};
pub use format::{BUILTIN_FORMAT_ID, FormatRegistry, StatementFormat};
pub use statement::{ParseOutcome, StatementParser};
pub use text::ExtractedDocument;
pub use types::{
    CreditCardStatement, Diagnostic, Direction, Ledger, StatementMetadata, StatementTransaction,
    TransactionType,
};
