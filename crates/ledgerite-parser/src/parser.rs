//! Ledger journal parser implementation

use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

use crate::directives::{
    DefaultCommodity, Directive, IgnoreSymbol, Posting, Price, SpannedDirective, Transaction,
};
use crate::error::ParseError;
use crate::lexer::parse_amount;
use crate::source::{self, SourceLine, MEMORY_SOURCE};
use crate::types::{Balance, Commodity, SpanInfo};

const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Simple line-based parser for ledger journals
pub struct SimpleJournalParser;

impl SimpleJournalParser {
    /// Parse journal content; includes resolve against the working directory
    pub fn parse(content: &str) -> Result<Vec<SpannedDirective>, ParseError> {
        DirectiveReader::new(source::content_lines(content, ".")).collect()
    }

    /// Parse already-split lines, without include handling
    pub fn parse_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<SpannedDirective>, ParseError> {
        let lines = lines.into_iter().enumerate().map(|(i, text)| {
            Ok(SourceLine {
                source: MEMORY_SOURCE.to_string(),
                number: i + 1,
                text: text.to_string(),
            })
        });
        DirectiveReader::new(source::remove_empty_lines(source::strip_comments(lines))).collect()
    }

    /// Parse a journal file, splicing in included files
    pub fn parse_file(path: &Path) -> Result<Vec<SpannedDirective>, ParseError> {
        Self::read_file(path)?.collect()
    }

    /// Lazily read the directives of a journal file
    pub fn read_file(
        path: &Path,
    ) -> Result<DirectiveReader<impl Iterator<Item = Result<SourceLine, ParseError>>>, ParseError> {
        Ok(DirectiveReader::new(source::journal_lines(path.to_path_buf())?))
    }
}

struct OpenTransaction {
    transaction: Transaction,
    source: String,
    start: usize,
    end: usize,
}

impl OpenTransaction {
    fn into_spanned(self) -> SpannedDirective {
        spanned(Directive::Transaction(self.transaction), &self.source, self.start, self.end)
    }
}

fn spanned(data: Directive, source: &str, start: usize, end: usize) -> SpannedDirective {
    SpannedDirective {
        data,
        span: SpanInfo { start, end },
        source: (source != MEMORY_SOURCE).then(|| source.to_string()),
    }
}

/// Line-starting records
enum RecordStart {
    Transaction(Transaction),
    Directive(Directive),
}

/// Builds directives out of filtered journal lines.
///
/// Postings accumulate onto the open transaction, which is only emitted
/// once the next record starts or the input ends.
pub struct DirectiveReader<I> {
    lines: I,
    open: Option<OpenTransaction>,
    queued: Option<SpannedDirective>,
    done: bool,
}

impl<I> DirectiveReader<I>
where
    I: Iterator<Item = Result<SourceLine, ParseError>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            open: None,
            queued: None,
            done: false,
        }
    }

    fn fail(&mut self, error: ParseError) -> Option<Result<SpannedDirective, ParseError>> {
        self.done = true;
        self.open = None;
        Some(Err(error))
    }
}

impl<I> Iterator for DirectiveReader<I>
where
    I: Iterator<Item = Result<SourceLine, ParseError>>,
{
    type Item = Result<SpannedDirective, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(queued) = self.queued.take() {
            return Some(Ok(queued));
        }
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                None => {
                    self.done = true;
                    return self.open.take().map(|open| Ok(open.into_spanned()));
                }
                Some(Err(e)) => return self.fail(e),
                Some(Ok(line)) => line,
            };

            let Some(first) = line.text.chars().next() else {
                continue;
            };

            if first.is_whitespace() {
                let Some(open) = self.open.as_mut() else {
                    return self.fail(ParseError::UnexpectedPosting.at(line.location()));
                };
                match read_posting_line(&line.text) {
                    Ok(posting) => {
                        open.transaction.add_posting(posting);
                        open.end = line.number;
                    }
                    Err(e) => return self.fail(e.at(line.location())),
                }
                continue;
            }

            let start = match read_record_start(&line.text, first) {
                Ok(start) => start,
                Err(e) => return self.fail(e.at(line.location())),
            };

            let previous = match start {
                RecordStart::Transaction(transaction) => {
                    let opened = OpenTransaction {
                        transaction,
                        source: line.source,
                        start: line.number,
                        end: line.number,
                    };
                    match self.open.replace(opened) {
                        Some(previous) => previous,
                        None => continue,
                    }
                }
                RecordStart::Directive(directive) => {
                    let directive = spanned(directive, &line.source, line.number, line.number);
                    match self.open.take() {
                        Some(previous) => {
                            self.queued = Some(directive);
                            previous
                        }
                        None => return Some(Ok(directive)),
                    }
                }
            };
            return Some(Ok(previous.into_spanned()));
        }
    }
}

fn read_record_start(line: &str, first: char) -> Result<RecordStart, ParseError> {
    match first {
        c if c.is_ascii_digit() => read_transaction_line(line).map(RecordStart::Transaction),
        'P' => read_price_line(line).map(|p| RecordStart::Directive(Directive::Price(p))),
        'N' => read_ignore_symbol_line(line).map(|s| RecordStart::Directive(Directive::IgnoreSymbol(s))),
        'D' => read_default_commodity_line(line)
            .map(|d| RecordStart::Directive(Directive::DefaultCommodity(d))),
        directive => Err(ParseError::UnrecognizedDirective { directive }),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| ParseError::InvalidDate {
            value: value.to_string(),
        })
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ParseError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| ParseError::InvalidDate {
            value: value.to_string(),
        })
}

/// `2013/2/20 Purchased reddit gold for the year`
pub fn read_transaction_line(line: &str) -> Result<Transaction, ParseError> {
    let line = line.trim();
    let (date, description) = line
        .split_once(char::is_whitespace)
        .map(|(date, rest)| (date, rest.trim_start()))
        .unwrap_or((line, ""));
    Ok(Transaction::new(parse_date(date)?, description))
}

/// Split a trimmed posting line into account and amount.
///
/// The account ends at the first tab or at the first pair of consecutive
/// whitespace characters, so single spaces may appear in account names.
fn split_posting(line: &str) -> (&str, Option<&str>) {
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let double_space = c.is_whitespace() && chars.peek().map_or(false, |&(_, n)| n.is_whitespace());
        if c == '\t' || double_space {
            let amount = line[i..].trim();
            return (line[..i].trim(), (!amount.is_empty()).then_some(amount));
        }
    }
    (line, None)
}

/// `\tAsset:Bitcoin Wallet\t\t-10 BTC`
pub fn read_posting_line(line: &str) -> Result<Posting, ParseError> {
    let (account, amount) = split_posting(line.trim());
    let account = account.split(':').map(|s| s.trim().to_string()).collect::<Vec<_>>();

    let amounts = match parse_amount(amount)? {
        (Some(amount), commodity) => {
            let mut amounts = Balance::new();
            amounts.insert(commodity.unwrap_or_default(), amount);
            Some(amounts)
        }
        (None, _) => None,
    };

    Ok(Posting { account, amounts })
}

/// `P 2012/11/25 05:04:00 AU $1751.90`
pub fn read_price_line(line: &str) -> Result<Price, ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return Err(ParseError::IncompleteDirective { directive: "price" });
    }

    let timestamp = parse_timestamp(&format!("{} {}", parts[1], parts[2]))?;
    let (rate, dest) = parse_amount(Some(&parts[4..].join(" ")))?;

    Ok(Price {
        timestamp,
        source: Commodity::suffix(parts[3]),
        dest: dest.unwrap_or_default(),
        rate: rate.unwrap_or_default(),
    })
}

/// `N $`
pub fn read_ignore_symbol_line(line: &str) -> Result<IgnoreSymbol, ParseError> {
    line.split_whitespace()
        .nth(1)
        .map(|symbol| IgnoreSymbol {
            symbol: symbol.to_string(),
        })
        .ok_or(ParseError::IncompleteDirective {
            directive: "ignore symbol",
        })
}

/// `D $1,000.00`
pub fn read_default_commodity_line(line: &str) -> Result<DefaultCommodity, ParseError> {
    let rest = line.get(1..).unwrap_or_default().trim();
    if rest.is_empty() {
        return Err(ParseError::IncompleteDirective {
            directive: "default commodity",
        });
    }
    match parse_amount(Some(rest))? {
        (_, Some(commodity)) => Ok(DefaultCommodity { commodity }),
        (_, None) => Err(ParseError::IncompleteDirective {
            directive: "default commodity",
        }),
    }
}

// ==================== Tests ====================
