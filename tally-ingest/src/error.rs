//! Error types for statement parsing.
//!
//! Only unrecoverable problems are errors. Anything the parser can work
//! around is reported as a [`Diagnostic`](crate::types::Diagnostic) instead.

use thiserror::Error;

/// The document is not a recognised statement layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementFormatError {
    /// A required section anchor was not found in the text
    #[error("statement format error: missing anchor {anchor:?}")]
    MissingAnchor { anchor: String },

    /// A critical metadata field was absent or unreadable
    #[error("statement format error: missing required field {field}")]
    MissingField { field: &'static str },
}

impl StatementFormatError {
    pub fn missing_anchor(phrases: &[String]) -> Self {
        StatementFormatError::MissingAnchor {
            anchor: phrases.join(" | "),
        }
    }

    pub fn missing_field(field: &'static str) -> Self {
        StatementFormatError::MissingField { field }
    }
}

/// A statement format definition could not be compiled.
#[derive(Debug, Error)]
pub enum FormatConfigError {
    #[error("invalid pattern for {name}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern for {name} must define the named group {group:?}")]
    MissingGroup { name: String, group: &'static str },

    #[error("{name} needs at least one phrase")]
    EmptyPhrases { name: String },

    #[error("unknown statement format {id:?}")]
    UnknownFormat { id: String },
}
