//! Statement format definitions.
//!
//! Everything that changes when an issuer redesigns its PDF lives here as
//! data: anchor phrases, field labels, token patterns, keyword lists and the
//! default sign of unsigned amounts. Formats deserialize from TOML, so a new
//! layout is a config change rather than a code change.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FormatConfigError;
use crate::sections::label_pattern;
use crate::statement::StatementParser;
use crate::types::Direction;

pub const BUILTIN_FORMAT_ID: &str = "au-card-v1";

const DATE_PATTERN: &str = concat!(
    r"(?i)(?P<day>\d{1,2})\s?",
    r"(?P<month>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|",
    r"aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)",
    r"(?:\s?(?P<year>\d{4}))?",
    r"|(?P<nday>\d{1,2})/(?P<nmonth>\d{1,2})/(?P<nyear>\d{4})"
);

const MONEY_PATTERN: &str = concat!(
    r"(?P<open>\()?(?P<sign>[-+])?\s?\$?\s?",
    r"(?P<num>\d{1,3}(?:,\d{3})+\.\d{2}|\d+\.\d{2})",
    r"(?P<close>\))?(?:\s?(?P<cr>CR|Cr|DR|Dr)\b)?"
);

/// A complete description of one issuer's statement layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementFormat {
    pub id: String,
    pub anchors: AnchorPhrases,
    pub labels: FieldLabels,
    pub patterns: TokenPatterns,
    /// Width of the digits-only card suffix printed before an amount.
    pub card_suffix_width: usize,
    pub keywords: TypeKeywords,
    pub signs: SignDefaults,
}

/// Phrases that open or close the transaction sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorPhrases {
    pub transactions: Vec<String>,
    pub interest_free: Vec<String>,
    pub section_end: Vec<String>,
}

/// Label phrases for each metadata field. Alternatives are tried together;
/// the earliest occurrence in the text wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLabels {
    pub statement_date: Vec<String>,
    pub account_number: Vec<String>,
    pub opening_balance: Vec<String>,
    pub closing_balance: Vec<String>,
    pub credit_limit: Vec<String>,
    pub available_credit: Vec<String>,
    pub minimum_payment: Vec<String>,
    pub due_date: Vec<String>,
    pub statement_period: Vec<String>,
}

/// Regex sources for the token shapes.
///
/// `entry_date` must define `day` and `month` (and may define `year`, plus
/// `nday`/`nmonth`/`nyear` for numeric dates). `money` must define `num`
/// and may define `sign`, `open`, `close` and `cr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPatterns {
    pub entry_date: String,
    pub money: String,
    /// Page furniture removed from a segment before the amount is picked.
    pub noise: Vec<String>,
}

/// Word lists used to classify a transaction from its description.
/// Checked in the order refund, fee, interest, payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeKeywords {
    pub refund: Vec<String>,
    pub fee: Vec<String>,
    pub interest: Vec<String>,
    pub payment: Vec<String>,
}

/// Direction given to unsigned, non-payment amounts in each ledger.
///
/// This issuer has printed purchases both with and without a leading minus
/// across statement versions, so the unsigned default is a setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignDefaults {
    pub regular: Direction,
    pub interest_free: Direction,
}

fn phrases(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for AnchorPhrases {
    fn default() -> Self {
        Self {
            transactions: phrases(&["Your transactions", "Transaction details"]),
            interest_free: phrases(&["Interest free transactions", "Interest free plans"]),
            section_end: phrases(&[
                "Closing balance",
                "Important information",
                "Interest rate summary",
            ]),
        }
    }
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self {
            statement_date: phrases(&["Statement date", "Statement issued"]),
            account_number: phrases(&["Account number", "Card number"]),
            opening_balance: phrases(&["Opening balance"]),
            closing_balance: phrases(&["Closing balance"]),
            credit_limit: phrases(&["Credit limit"]),
            available_credit: phrases(&["Available credit"]),
            minimum_payment: phrases(&["Minimum payment due", "Minimum payment"]),
            due_date: phrases(&["Payment due date", "Due date"]),
            statement_period: phrases(&["Statement period"]),
        }
    }
}

impl Default for TokenPatterns {
    fn default() -> Self {
        Self {
            entry_date: DATE_PATTERN.to_string(),
            money: MONEY_PATTERN.to_string(),
            noise: phrases(&[r"(?i)page\s?\d+\s?of\s?\d+", r"(?i)\(continued\)"]),
        }
    }
}

impl Default for TypeKeywords {
    fn default() -> Self {
        Self {
            refund: phrases(&["REFUND", "REVERSAL"]),
            fee: phrases(&["FEE"]),
            interest: phrases(&[
                "INTEREST CHARGED",
                "PURCHASE INTEREST",
                "CASH ADVANCE INTEREST",
                "INTEREST CHARGE",
            ]),
            payment: phrases(&["PAYMENT", "THANK YOU"]),
        }
    }
}

impl Default for SignDefaults {
    fn default() -> Self {
        Self {
            regular: Direction::Debit,
            interest_free: Direction::Debit,
        }
    }
}

impl Default for StatementFormat {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StatementFormat {
    /// The layout this crate ships with.
    pub fn builtin() -> Self {
        Self {
            id: BUILTIN_FORMAT_ID.to_string(),
            anchors: AnchorPhrases::default(),
            labels: FieldLabels::default(),
            patterns: TokenPatterns::default(),
            card_suffix_width: 4,
            keywords: TypeKeywords::default(),
            signs: SignDefaults::default(),
        }
    }
}

pub(crate) fn compile(name: &str, pattern: &str) -> Result<Regex, FormatConfigError> {
    Regex::new(pattern).map_err(|source| FormatConfigError::InvalidPattern {
        name: name.to_string(),
        source,
    })
}

/// One regex matching any of the phrases, tolerant of case and spacing.
pub(crate) fn compile_phrases(name: &str, list: &[String]) -> Result<Regex, FormatConfigError> {
    let alternatives: Vec<String> = list
        .iter()
        .map(|p| label_pattern(p))
        .filter(|p| !p.is_empty())
        .collect();
    if alternatives.is_empty() {
        return Err(FormatConfigError::EmptyPhrases {
            name: name.to_string(),
        });
    }
    compile(name, &format!("(?i)(?:{})", alternatives.join("|")))
}

pub(crate) fn require_groups(
    name: &str,
    re: &Regex,
    groups: &[&'static str],
) -> Result<(), FormatConfigError> {
    for &group in groups {
        if !re.capture_names().flatten().any(|n| n == group) {
            return Err(FormatConfigError::MissingGroup {
                name: name.to_string(),
                group,
            });
        }
    }
    Ok(())
}

/// Strategy table of known formats, keyed by format id.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, StatementFormat>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.insert(StatementFormat::builtin());
        registry
    }

    /// Add or replace a format. Returns the previous definition for that id.
    pub fn insert(&mut self, format: StatementFormat) -> Option<StatementFormat> {
        self.formats.insert(format.id.clone(), format)
    }

    pub fn get(&self, id: &str) -> Option<&StatementFormat> {
        self.formats.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    pub fn parser(&self, id: &str) -> Result<StatementParser, FormatConfigError> {
        let format = self
            .get(id)
            .ok_or_else(|| FormatConfigError::UnknownFormat { id: id.to_string() })?;
        StatementParser::new(format)
    }
}
