//! Journal directive types

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Balance, Commodity, SpanInfo};

/// Spanned directive with position info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpannedDirective {
    pub data: Directive,
    pub span: SpanInfo,
    /// Source file path (None for in-memory content)
    pub source: Option<String>,
}

/// Everything a journal line can start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    Transaction(Transaction),
    Price(Price),
    IgnoreSymbol(IgnoreSymbol),
    DefaultCommodity(DefaultCommodity),
}

/// A movement of commodities in a single account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// Account path, top of the hierarchy first
    pub account: Vec<String>,
    /// `None` while the amount is elided and still has to be inferred
    pub amounts: Option<Balance>,
}

impl Posting {
    /// Posting with explicit amounts
    pub fn new<S: Into<String>>(account: impl IntoIterator<Item = S>, amounts: Balance) -> Self {
        Self {
            account: account.into_iter().map(Into::into).collect(),
            amounts: Some(amounts),
        }
    }

    /// Posting with a single explicit amount
    pub fn single<S: Into<String>>(
        account: impl IntoIterator<Item = S>,
        amount: Decimal,
        commodity: Commodity,
    ) -> Self {
        let mut amounts = Balance::new();
        amounts.insert(commodity, amount);
        Self::new(account, amounts)
    }

    /// Posting whose amount is left out
    pub fn elided<S: Into<String>>(account: impl IntoIterator<Item = S>) -> Self {
        Self {
            account: account.into_iter().map(Into::into).collect(),
            amounts: None,
        }
    }

    /// Full account name as written in the journal
    pub fn account_name(&self) -> String {
        self.account.join(":")
    }

    pub fn is_elided(&self) -> bool {
        self.amounts.is_none()
    }

    /// Posting formatted the way it would appear in a journal file
    pub fn as_journal_format(&self) -> String {
        let amount_str = self
            .amounts
            .as_ref()
            .map(|amounts| {
                amounts
                    .iter()
                    .map(|(c, a)| c.format_amount(*a))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        format!("\t{:<25}\t{:>20}", self.account_name(), amount_str)
    }
}

/// Transaction directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub postings: Vec<Posting>,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            date,
            description: description.into(),
            postings: Vec::new(),
        }
    }

    pub fn add_posting(&mut self, posting: Posting) {
        self.postings.push(posting);
    }

    /// Builder-style variant of [`Transaction::add_posting`]
    pub fn with_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }

    /// Date of the transaction in journal format
    pub fn date_str(&self) -> String {
        self.date.format("%Y/%m/%d").to_string()
    }

    /// The transaction header in journal format
    pub fn header(&self) -> String {
        format!("{} {}", self.date_str(), self.description)
    }

    pub fn as_journal_format(&self) -> String {
        std::iter::once(self.header())
            .chain(self.postings.iter().map(Posting::as_journal_format))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Historical conversion rate, stored but never applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub timestamp: NaiveDateTime,
    pub source: Commodity,
    pub dest: Commodity,
    pub rate: Decimal,
}

/// Symbol to be ignored in price definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoreSymbol {
    pub symbol: String,
}

/// Commodity to use by default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultCommodity {
    pub commodity: Commodity,
}
