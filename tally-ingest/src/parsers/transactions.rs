//! Itemized transaction lines.
//!
//! After de-spacing, a transaction region is a run of entries with nothing
//! but whitespace between them, sometimes with none at all:
//!
//!   12Sep2025DirectDebitNissanFinancial-508.0213Sep2025Coles 1234 45.10
//!
//! Each entry is: date, optional posting date, description, optional card
//! suffix, amount. Dates mark where entries begin; the last amount in an
//! entry is its value. Anything that cannot be resolved is reported and
//! skipped, never fatal.

use chrono::NaiveDate;
use log::{debug, info};
use regex::Regex;

use crate::error::FormatConfigError;
use crate::format::{SignDefaults, TypeKeywords, compile};
use crate::tokens::{DateToken, MoneyToken, date_captures};
use crate::types::{Diagnostic, Direction, Ledger, StatementTransaction, TransactionType};

#[derive(Debug, Clone)]
pub struct TransactionLineParser {
    date: Regex,
    money: Regex,
    noise: Vec<Regex>,
    card: Option<Regex>,
    glued_card: Option<Regex>,
    fused_amount: Regex,
    keywords: Vec<(TransactionType, Vec<String>)>,
    signs: SignDefaults,
}

impl TransactionLineParser {
    pub fn new(
        date: Regex,
        money: Regex,
        noise: &[String],
        card_suffix_width: usize,
        keywords: &TypeKeywords,
        signs: &SignDefaults,
    ) -> Result<Self, FormatConfigError> {
        let noise = noise
            .iter()
            .enumerate()
            .map(|(i, p)| compile(&format!("patterns.noise[{i}]"), p))
            .collect::<Result<Vec<_>, _>>()?;

        let (card, glued_card) = match card_suffix_width {
            0 => (None, None),
            width => (
                Some(compile(
                    "card suffix",
                    &format!(r"(?:^|[^0-9])(?P<card>[0-9]{{{width}}})\s*$"),
                )?),
                Some(compile(
                    "glued card suffix",
                    &format!(r"(\p{{L}})([0-9]{{{width}}})((?:\d{{1,3}}(?:,\d{{3}})+|\d+)\.\d{{2}})"),
                )?),
            ),
        };

        let words = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|k| normalize_words(k))
                .filter(|k| !k.is_empty())
                .collect()
        };

        Ok(Self {
            date,
            money,
            noise,
            card,
            glued_card,
            fused_amount: compile("fused amount", r"(\.\d{2})(\d)")?,
            keywords: vec![
                (TransactionType::Refund, words(&keywords.refund)),
                (TransactionType::Fee, words(&keywords.fee)),
                (TransactionType::Interest, words(&keywords.interest)),
                (TransactionType::Payment, words(&keywords.payment)),
            ],
            signs: signs.clone(),
        })
    }

    /// Parse every entry in `region`. `statement_date` supplies the year for
    /// dates printed without one.
    pub fn parse(
        &self,
        region: &str,
        ledger: Ledger,
        statement_date: NaiveDate,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<StatementTransaction> {
        let text = self.fused_amount.replace_all(region, "$1 $2");
        let starts = self.entry_starts(&text);

        let preamble = &text[..starts.first().copied().unwrap_or(text.len())];
        if !preamble.trim().is_empty() {
            debug!("{}: ignoring text before first entry: {:?}", ledger.label(), preamble.trim());
        }

        let mut out = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            let segment = &text[start..end];
            match self.parse_entry(segment, ledger, statement_date) {
                Ok(txn) => out.push(txn),
                Err(reason) => {
                    debug!("{}: skipped {:?}: {reason}", ledger.label(), segment.trim());
                    diagnostics.push(Diagnostic::EntrySkipped {
                        ledger,
                        segment: segment.trim().to_string(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        info!("{}: parsed {} of {} entries", ledger.label(), out.len(), starts.len());
        out
    }

    /// Byte offsets where entries begin.
    ///
    /// The first date opens an entry. After that a date opens the next entry
    /// only once the current one has an amount, or when it begins a line, so
    /// a date printed inside a description stays part of it. A date directly
    /// after another date is a posting date, and a date glued to a preceding
    /// digit belongs to some reference number; neither opens an entry.
    fn entry_starts(&self, text: &str) -> Vec<usize> {
        let mut starts: Vec<usize> = Vec::new();
        let mut previous_end: Option<usize> = None;

        for m in date_captures(&self.date, text).filter_map(|caps| caps.get(0)) {
            let before = &text[..m.start()];
            if before.chars().next_back().is_some_and(|c| c.is_ascii_digit()) {
                continue;
            }
            let posting = previous_end.is_some_and(|end| text[end..m.start()].trim().is_empty());
            previous_end = Some(m.end());
            if posting {
                continue;
            }
            let opens = match starts.last() {
                None => true,
                Some(&open) => self.money.is_match(&text[open..m.start()]) || begins_line(before),
            };
            if opens {
                starts.push(m.start());
            }
        }
        starts
    }

    fn parse_entry(
        &self,
        segment: &str,
        ledger: Ledger,
        statement_date: NaiveDate,
    ) -> Result<StatementTransaction, &'static str> {
        let resolve = |caps: &regex::Captures<'_>| {
            DateToken::from_captures(caps).and_then(|t| t.resolve(Some(statement_date)))
        };

        let caps = date_captures(&self.date, segment).next().ok_or("no date")?;
        let date = resolve(&caps).ok_or("unresolvable date")?;
        let mut rest = &segment[caps.get(0).map_or(0, |m| m.end())..];

        let mut posting_date = None;
        if let Some(next) = date_captures(&self.date, rest).next() {
            if let Some(m) = next.get(0) {
                if rest[..m.start()].trim().is_empty() {
                    posting_date = resolve(&next);
                    rest = &rest[m.end()..];
                }
            }
        }

        let mut body = rest.to_string();
        for noise in &self.noise {
            body = noise.replace_all(&body, " ").into_owned();
        }
        // `ThankYou1234200.00`: card digits run straight into the amount
        if let Some(glued) = &self.glued_card {
            body = glued.replace_all(&body, "$1$2 $3").into_owned();
        }

        let amount = self
            .money
            .captures_iter(&body)
            .filter_map(|caps| MoneyToken::from_captures(&caps))
            .last()
            .ok_or("no amount")?;

        let mut before = &body[..amount.start];
        let mut card = String::new();
        if let Some(card_re) = &self.card {
            if let Some(m) = card_re.captures(before).and_then(|c| c.name("card")) {
                card = m.as_str().to_string();
                before = &before[..m.start()];
            }
        }

        let description = clean_description(before);
        if description.is_empty() {
            return Err("empty description");
        }

        let kind = self.classify(&description);
        let direction = amount.marker.unwrap_or_else(|| {
            if kind.is_credit_like() {
                Direction::Credit
            } else {
                match ledger {
                    Ledger::Regular => self.signs.regular,
                    Ledger::InterestFree => self.signs.interest_free,
                }
            }
        });

        Ok(StatementTransaction {
            date,
            posting_date,
            description,
            card,
            amount: direction.apply(amount.magnitude),
            kind,
        })
    }

    fn classify(&self, description: &str) -> TransactionType {
        let haystack = format!(" {} ", normalize_words(description));
        self.keywords
            .iter()
            .find(|(_, words)| words.iter().any(|w| haystack.contains(&format!(" {w} "))))
            .map_or(TransactionType::Purchase, |(kind, _)| *kind)
    }
}

fn begins_line(before: &str) -> bool {
    before.trim_end_matches([' ', '\t']).ends_with('\n')
}

/// Uppercase words separated by single spaces, punctuation dropped.
fn normalize_words(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_uppercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tidy a raw description: trim separators, split fully de-spaced camel
/// case back into words, and drop immediately repeated words.
pub fn clean_description(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '|' | ',' | ':'));

    let spaced = if trimmed.contains(char::is_whitespace) {
        trimmed.to_string()
    } else {
        split_camel_case(trimmed)
    };

    let mut words: Vec<&str> = Vec::new();
    for word in spaced.split_whitespace() {
        if words.last().is_some_and(|prev| prev.eq_ignore_ascii_case(word)) {
            continue;
        }
        words.push(word);
    }
    words.join(" ")
}

fn split_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if let Some(p) = prev {
            if p.is_lowercase() && c.is_uppercase() {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out
}
