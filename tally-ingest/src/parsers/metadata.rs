//! Statement summary fields: dates, balances, limits.
//!
//! Expected text after normalization (spacing varies):
//!   Statement date 12 Sep 2025   Account number 4564 XXXX XXXX 1234
//!   Opening balance $1,000.00    Closing balance $1,508.02
//!   Credit limit $6,000.00       Available credit $4,491.98
//!   Minimum payment due $30.00   Payment due date 07 Oct 2025

use chrono::NaiveDate;
use log::warn;
use regex::{Captures, Regex};
use rust_decimal::Decimal;

use crate::error::{FormatConfigError, StatementFormatError};
use crate::format::{FieldLabels, compile, compile_phrases};
use crate::tokens::{DateToken, MoneyToken, date_captures};
use crate::types::{Diagnostic, StatementMetadata};

/// How far past the end of a label its value may start, in bytes.
const VALUE_WINDOW: usize = 48;

const ACCOUNT_PATTERN: &str = r"[0-9Xx*][0-9Xx* \-]{2,}[0-9Xx*]";

const NO_LABEL: &str = "label not found";
const NO_VALUE: &str = "no readable value after label";

#[derive(Debug, Clone)]
pub struct MetadataParser {
    statement_date: Regex,
    account_number: Regex,
    opening_balance: Regex,
    closing_balance: Regex,
    credit_limit: Regex,
    available_credit: Regex,
    minimum_payment: Regex,
    due_date: Regex,
    statement_period: Option<Regex>,
    /// Every label above; a value never extends past the next one.
    all_labels: Vec<Regex>,
    account_value: Regex,
    date: Regex,
    money: Regex,
}

impl MetadataParser {
    pub fn new(labels: &FieldLabels, date: Regex, money: Regex) -> Result<Self, FormatConfigError> {
        let statement_period = if labels.statement_period.is_empty() {
            None
        } else {
            Some(compile_phrases("labels.statement_period", &labels.statement_period)?)
        };

        let statement_date = compile_phrases("labels.statement_date", &labels.statement_date)?;
        let account_number = compile_phrases("labels.account_number", &labels.account_number)?;
        let opening_balance = compile_phrases("labels.opening_balance", &labels.opening_balance)?;
        let closing_balance = compile_phrases("labels.closing_balance", &labels.closing_balance)?;
        let credit_limit = compile_phrases("labels.credit_limit", &labels.credit_limit)?;
        let available_credit =
            compile_phrases("labels.available_credit", &labels.available_credit)?;
        let minimum_payment = compile_phrases("labels.minimum_payment", &labels.minimum_payment)?;
        let due_date = compile_phrases("labels.due_date", &labels.due_date)?;

        let mut all_labels = vec![
            statement_date.clone(),
            account_number.clone(),
            opening_balance.clone(),
            closing_balance.clone(),
            credit_limit.clone(),
            available_credit.clone(),
            minimum_payment.clone(),
            due_date.clone(),
        ];
        all_labels.extend(statement_period.clone());

        Ok(Self {
            statement_date,
            account_number,
            opening_balance,
            closing_balance,
            credit_limit,
            available_credit,
            minimum_payment,
            due_date,
            statement_period,
            all_labels,
            account_value: compile("account number value", ACCOUNT_PATTERN)?,
            date,
            money,
        })
    }

    /// Parse the summary fields. Statement date and closing balance are
    /// required; everything else is defaulted with a warning.
    pub fn parse(
        &self,
        text: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<StatementMetadata, StatementFormatError> {
        let statement_date = self
            .lookup(text, &self.statement_date, |rest| self.full_date(rest))
            .map_err(|_| StatementFormatError::missing_field("statementDate"))?;
        let closing_balance = self
            .lookup(text, &self.closing_balance, |rest| self.amount(rest))
            .map_err(|_| StatementFormatError::missing_field("closingBalance"))?;

        let mut money = |field: &str, label: &Regex| {
            self.lookup(text, label, |rest| self.amount(rest))
                .unwrap_or_else(|reason| {
                    soft_miss(diagnostics, field, reason);
                    Decimal::ZERO
                })
        };
        let opening_balance = money("openingBalance", &self.opening_balance);
        let credit_limit = money("creditLimit", &self.credit_limit);
        let available_credit = money("availableCredit", &self.available_credit);
        let minimum_payment = money("minimumPayment", &self.minimum_payment);

        let due_date = self
            .lookup(text, &self.due_date, |rest| self.full_date(rest))
            .map_err(|reason| soft_miss(diagnostics, "dueDate", reason))
            .ok();
        let account_number = self
            .lookup(text, &self.account_number, |rest| self.account(rest))
            .map_err(|reason| soft_miss(diagnostics, "accountNumber", reason))
            .ok();
        let period_start = self
            .statement_period
            .as_ref()
            .and_then(|label| self.lookup(text, label, |rest| self.full_date(rest)).ok());

        Ok(StatementMetadata {
            statement_date,
            account_number,
            opening_balance,
            closing_balance,
            credit_limit,
            available_credit,
            minimum_payment,
            due_date,
            period_start,
        })
    }

    fn lookup<T>(
        &self,
        text: &str,
        label: &Regex,
        value: impl Fn(&str) -> Option<T>,
    ) -> Result<T, &'static str> {
        let found = label.find(text).ok_or(NO_LABEL)?;
        let after = &text[found.end()..];
        let end = self
            .all_labels
            .iter()
            .filter_map(|other| other.find(after))
            .map(|m| m.start())
            .min()
            .unwrap_or(after.len());
        let rest = after[..end].trim_start_matches(|c: char| c == ':' || c.is_whitespace());
        value(rest).ok_or(NO_VALUE)
    }

    fn full_date(&self, rest: &str) -> Option<NaiveDate> {
        let caps = date_captures(&self.date, rest).next().filter(near_start)?;
        DateToken::from_captures(&caps)?.resolve(None)
    }

    fn amount(&self, rest: &str) -> Option<Decimal> {
        let caps = self.money.captures(rest).filter(near_start)?;
        Some(MoneyToken::from_captures(&caps)?.magnitude)
    }

    fn account(&self, rest: &str) -> Option<String> {
        let found = self.account_value.find(rest).filter(|m| m.start() == 0)?;
        let digits = found.as_str().chars().filter(char::is_ascii_digit).count();
        if digits < 4 {
            return None;
        }
        Some(found.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

fn near_start(caps: &Captures<'_>) -> bool {
    caps.get(0).is_some_and(|m| m.start() <= VALUE_WINDOW)
}

fn soft_miss(diagnostics: &mut Vec<Diagnostic>, field: &str, reason: &str) {
    warn!("statement field {field}: {reason}, using default");
    diagnostics.push(Diagnostic::FieldParseWarning {
        field: field.to_string(),
        message: reason.to_string(),
    });
}
