//! Locate the transaction sections inside normalized statement text.

use log::debug;
use regex::{Match, Regex};

use crate::error::{FormatConfigError, StatementFormatError};
use crate::format::{AnchorPhrases, compile_phrases};

/// Regex source matching `phrase` with any amount of whitespace (including
/// none) between its characters. De-spacing is not always perfect, so
/// `Closingbalance` and `C losing  balance` must both match.
pub fn label_pattern(phrase: &str) -> String {
    phrase
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
        .collect::<Vec<_>>()
        .join(r"\s*")
}

/// The three regions of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections<'a> {
    /// Metadata labels may appear anywhere, so this is the whole text.
    pub metadata: &'a str,
    pub transactions: &'a str,
    pub interest_free: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct SectionLocator {
    transaction_phrases: Vec<String>,
    transactions: Regex,
    interest_free: Option<Regex>,
    section_end: Option<Regex>,
}

impl SectionLocator {
    pub fn new(anchors: &AnchorPhrases) -> Result<Self, FormatConfigError> {
        let optional = |name: &str, list: &[String]| {
            if list.is_empty() {
                Ok(None)
            } else {
                compile_phrases(name, list).map(Some)
            }
        };

        Ok(Self {
            transaction_phrases: anchors.transactions.clone(),
            transactions: compile_phrases("anchors.transactions", &anchors.transactions)?,
            interest_free: optional("anchors.interest_free", &anchors.interest_free)?,
            section_end: optional("anchors.section_end", &anchors.section_end)?,
        })
    }

    /// Slice `text` into regions. Each region runs from the end of its anchor
    /// to the start of the next anchor after it, or to the end of the text.
    pub fn locate<'a>(&self, text: &'a str) -> Result<Sections<'a>, StatementFormatError> {
        let transactions = self
            .transactions
            .find(text)
            .ok_or_else(|| StatementFormatError::missing_anchor(&self.transaction_phrases))?;
        let interest_free = self.interest_free.as_ref().and_then(|re| re.find(text));

        let mut starts = vec![transactions.start()];
        if let Some(m) = interest_free {
            starts.push(m.start());
        }
        if let Some(re) = &self.section_end {
            starts.extend(re.find_iter(text).map(|m| m.start()));
        }

        let region = |anchor: Match<'a>| -> &'a str {
            let end = starts
                .iter()
                .copied()
                .filter(|&s| s >= anchor.end())
                .min()
                .unwrap_or(text.len());
            &text[anchor.end()..end]
        };

        let sections = Sections {
            metadata: text,
            transactions: region(transactions),
            interest_free: interest_free.map(region),
        };
        debug!(
            "located transactions ({} bytes), interest free ({} bytes)",
            sections.transactions.len(),
            sections.interest_free.map_or(0, str::len)
        );
        Ok(sections)
    }
}
