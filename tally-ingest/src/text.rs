//! Text reconstruction from the PDF extractor's page/fragment tree.
//!
//! The extractor hands back every text run percent-encoded. Some statement
//! layout engines also place each glyph in its own run, so the joined text
//! reads `C l o s i n g b a l a n c e`. [`despace`] undoes that.

use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Materialized output of the external PDF text extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    #[serde(default, alias = "Pages")]
    pub pages: Vec<ExtractedPage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    #[serde(default, rename = "textRuns", alias = "Texts")]
    pub text_runs: Vec<TextFragment>,
}

/// One positioned text object on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    #[serde(default, alias = "R")]
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Percent-encoded payload
    #[serde(alias = "T")]
    pub text: String,
}

impl ExtractedDocument {
    /// Build a document from plain strings, one inner vec per page and one
    /// string per fragment. Payloads are percent-encoded the way the
    /// extractor would deliver them.
    pub fn from_plain_pages<P, S>(pages: P) -> Self
    where
        P: IntoIterator,
        P::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pages = pages
            .into_iter()
            .map(|fragments| ExtractedPage {
                text_runs: fragments
                    .into_iter()
                    .map(|s| TextFragment {
                        runs: vec![TextRun {
                            text: urlencoding::encode(s.as_ref()).into_owned(),
                        }],
                    })
                    .collect(),
            })
            .collect();
        ExtractedDocument { pages }
    }
}

/// Percent-decode one run. Malformed payloads come back unchanged.
pub fn decode_run(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!("keeping undecodable run {raw:?}: {err}");
            Cow::Borrowed(raw)
        }
    }
}

/// Raw (not yet de-spaced) text of one page.
pub fn page_text(page: &ExtractedPage) -> String {
    let mut out = String::new();
    for fragment in &page.text_runs {
        for run in &fragment.runs {
            out.push_str(&decode_run(&run.text));
        }
        out.push(' ');
    }
    out
}

/// One normalized string per page.
pub fn reconstruct_pages(doc: &ExtractedDocument) -> Vec<String> {
    doc.pages.iter().map(|p| despace(&page_text(p))).collect()
}

/// Whole document as one normalized string, each page terminated by `\n`.
pub fn reconstruct(doc: &ExtractedDocument) -> String {
    let mut out = String::new();
    for page in reconstruct_pages(doc) {
        out.push_str(&page);
        out.push('\n');
    }
    out
}

/// Collapse per-glyph spacing, line by line.
///
/// A run of two or more single-character tokens separated by exactly one
/// whitespace character is joined into one token. Wider gaps, isolated
/// single characters and multi-character words are left alone, so
/// `despace(despace(s)) == despace(s)`.
pub fn despace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        despace_line(line, &mut out);
    }
    out
}

fn despace_line(line: &str, out: &mut String) {
    // (whitespace before, token)
    let mut tokens: Vec<(&str, &str)> = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find(|c: char| !c.is_whitespace()) {
        let (gap, tail) = rest.split_at(start);
        let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        let (word, after) = tail.split_at(end);
        tokens.push((gap, word));
        rest = after;
    }

    let is_glyph = |s: &str| s.chars().count() == 1;

    let mut i = 0;
    while i < tokens.len() {
        let (gap, word) = tokens[i];
        out.push_str(gap);
        out.push_str(word);
        i += 1;
        if is_glyph(word) {
            while i < tokens.len() && is_glyph(tokens[i].1) && is_glyph(tokens[i].0) {
                out.push_str(tokens[i].1);
                i += 1;
            }
        }
    }
    out.push_str(rest);
}
