//! Date and money token decoding shared by the metadata and line parsers.

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::Direction;

/// Parse a money literal as a fixed-point decimal, ignoring `$`, thousands
/// separators and whitespace. `"$1,234.56"` -> `1234.56`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    Decimal::from_str(&cleaned).ok()
}

/// A money token matched by the format's money pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyToken {
    pub magnitude: Decimal,
    /// Direction printed on the token itself, if any
    pub marker: Option<Direction>,
    pub start: usize,
    pub end: usize,
}

impl MoneyToken {
    pub fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let whole = caps.get(0)?;
        let magnitude = parse_decimal(caps.name("num")?.as_str())?;

        let parenthesized = caps.name("open").is_some() && caps.name("close").is_some();
        let marker = if parenthesized {
            Some(Direction::Debit)
        } else if let Some(sign) = caps.name("sign") {
            Some(if sign.as_str() == "-" {
                Direction::Debit
            } else {
                Direction::Credit
            })
        } else {
            caps.name("cr").map(|cr| {
                if cr.as_str().eq_ignore_ascii_case("cr") {
                    Direction::Credit
                } else {
                    Direction::Debit
                }
            })
        };

        Some(Self {
            magnitude: magnitude.abs(),
            marker,
            start: whole.start(),
            end: whole.end(),
        })
    }
}

pub fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Date matches in `text`, minus month abbreviations that are really the
/// start of a longer word (`2 Market`, `4 Decathlon`, `7 Mayfield`).
///
/// A month followed by an uppercase letter or a digit still counts, so
/// de-spaced `12SepDirectDebit` and `12Sep2025` read as dates.
pub fn date_captures<'t>(re: &'t Regex, text: &'t str) -> impl Iterator<Item = Captures<'t>> {
    re.captures_iter(text).filter(move |caps| month_is_bounded(caps, text))
}

fn month_is_bounded(caps: &Captures<'_>, text: &str) -> bool {
    caps.name("month")
        .is_none_or(|m| !text[m.end()..].starts_with(|c: char| c.is_lowercase()))
}

/// A date token before year inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateToken {
    pub day: u32,
    pub month: u32,
    pub year: Option<i32>,
}

impl DateToken {
    /// Read either the textual (`day`/`month`/`year`) or the numeric
    /// (`nday`/`nmonth`/`nyear`) groups of the date pattern.
    pub fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let year = |name: &str| caps.name(name).and_then(|m| m.as_str().parse().ok());

        if let (Some(day), Some(month)) = (caps.name("day"), caps.name("month")) {
            return Some(Self {
                day: day.as_str().parse().ok()?,
                month: month_number(month.as_str())?,
                year: year("year"),
            });
        }
        if let (Some(day), Some(month)) = (caps.name("nday"), caps.name("nmonth")) {
            return Some(Self {
                day: day.as_str().parse().ok()?,
                month: month.as_str().parse().ok()?,
                year: year("nyear"),
            });
        }
        None
    }

    /// Calendar date, or `None` for impossible dates like 31 Feb.
    ///
    /// A token without a year takes the reference date's year, or the year
    /// before when that would put it after the reference date (a December
    /// purchase on a January statement).
    pub fn resolve(&self, reference: Option<NaiveDate>) -> Option<NaiveDate> {
        if let Some(year) = self.year {
            return NaiveDate::from_ymd_opt(year, self.month, self.day);
        }
        let reference = reference?;
        let same_year = NaiveDate::from_ymd_opt(reference.year(), self.month, self.day);
        match same_year {
            Some(date) if date <= reference => Some(date),
            _ => NaiveDate::from_ymd_opt(reference.year() - 1, self.month, self.day),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TokenPatterns;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case("508.02", "508.02")]
    #[case("$1,234.56", "1234.56")]
    #[case(" $ 12,000.00 ", "12000.00")]
    fn test_parse_decimal(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(parse_decimal(raw), Some(Decimal::from_str(expected).unwrap()));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(parse_decimal("abc"), None);
    }

    #[rstest]
    #[case("-508.02", "508.02", Some(Direction::Debit))]
    #[case("(45.10)", "45.10", Some(Direction::Debit))]
    #[case("+20.00", "20.00", Some(Direction::Credit))]
    #[case("$1,500.00 CR", "1500.00", Some(Direction::Credit))]
    #[case("$75.00DR", "75.00", Some(Direction::Debit))]
    #[case("$12.00", "12.00", None)]
    fn test_money_token(
        #[case] text: &str,
        #[case] magnitude: &str,
        #[case] marker: Option<Direction>,
    ) {
        let re = Regex::new(&TokenPatterns::default().money).unwrap();
        let caps = re.captures(text).unwrap();
        let token = MoneyToken::from_captures(&caps).unwrap();
        assert_eq!(token.magnitude, Decimal::from_str(magnitude).unwrap());
        assert_eq!(token.marker, marker);
    }

    #[test]
    fn test_cr_inside_word_is_not_a_marker() {
        let re = Regex::new(&TokenPatterns::default().money).unwrap();
        let caps = re.captures("12.50 Credit card").unwrap();
        assert_eq!(MoneyToken::from_captures(&caps).unwrap().marker, None);
    }

    #[rstest]
    #[case("12Sep2025", Some(d(2025, 9, 12)))]
    #[case("12 September 2025", Some(d(2025, 9, 12)))]
    #[case("03/10/2025", Some(d(2025, 10, 3)))]
    #[case("28 Aug", Some(d(2025, 8, 28)))]
    #[case("30 Dec", Some(d(2024, 12, 30)))]
    #[case("31Feb2025", None)]
    fn test_date_token(#[case] text: &str, #[case] expected: Option<NaiveDate>) {
        let re = Regex::new(&TokenPatterns::default().entry_date).unwrap();
        let caps = re.captures(text).unwrap();
        let token = DateToken::from_captures(&caps).unwrap();
        assert_eq!(token.resolve(Some(d(2025, 9, 12))), expected);
    }

    #[rstest]
    #[case("2 Market St", None)]
    #[case("4 Decathlon", None)]
    #[case("7 Mayfield Bakery", None)]
    #[case("12SepDirectDebit", Some("12Sep"))]
    #[case("1 June 2025", Some("1 June 2025"))]
    #[case("03/10/2025", Some("03/10/2025"))]
    #[case("Cafe 2 Market St 14 Mar 2025", Some("14 Mar 2025"))]
    fn test_month_must_end_its_word(#[case] text: &str, #[case] expected: Option<&str>) {
        let re = Regex::new(&TokenPatterns::default().entry_date).unwrap();
        let found = date_captures(&re, text)
            .next()
            .and_then(|caps| caps.get(0))
            .map(|m| m.as_str());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_yearless_date_needs_reference() {
        let token = DateToken {
            day: 1,
            month: 9,
            year: None,
        };
        assert_eq!(token.resolve(None), None);
    }
}
