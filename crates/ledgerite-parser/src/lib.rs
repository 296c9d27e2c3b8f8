//! Ledger journal parser implementation
//!
//! A lightweight, line-oriented parser for plain-text double-entry journals.

use std::path::Path;
use std::sync::Arc;

pub mod error;
pub mod types;
pub mod directives;
pub mod lexer;
pub mod source;
pub mod parser;

pub use error::{Location, ParseError};
pub use lexer::parse_amount;
pub use parser::{DirectiveReader, SimpleJournalParser};

// Re-export commonly used types
pub use types::{add_amount, merge_balance, AmountOverflow, Balance, Commodity, SpanInfo, DEFAULT_PRECISION};
pub use directives::{
    DefaultCommodity, Directive, IgnoreSymbol, Posting, Price, SpannedDirective, Transaction,
};

// ==================== Parser Trait ====================

/// Parser reference type
pub type ParserRef = Arc<dyn JournalParser>;

/// Trait for journal parsers
pub trait JournalParser: Send + Sync {
    /// Parse journal content and return directives
    fn parse(&self, content: &str) -> Result<Vec<SpannedDirective>, ParseError>;

    /// Parse from a file path (handles includes)
    fn parse_file(&self, path: &Path) -> Result<Vec<SpannedDirective>, ParseError>;
}

/// Default parser implementation
#[derive(Debug, Default)]
pub struct DefaultJournalParser;

impl JournalParser for DefaultJournalParser {
    fn parse(&self, content: &str) -> Result<Vec<SpannedDirective>, ParseError> {
        SimpleJournalParser::parse(content)
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<SpannedDirective>, ParseError> {
        let directives = SimpleJournalParser::parse_file(path)?;
        log::debug!("Parsed {} directives from {}", directives.len(), path.display());
        Ok(directives)
    }
}
