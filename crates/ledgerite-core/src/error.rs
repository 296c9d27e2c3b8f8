//! Error types for ledgerite-core
//!
//! Every failure of the core is a [`CoreError`]. Each variant maps to an
//! [`ErrorCode`] and a severity, and can be expanded into [`ErrorDetails`]
//! with hints on how to fix the journal or the command line.

use ledgerite_config::ConfigError;
use ledgerite_parser::ParseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::balance::BalanceError;
use crate::expression::ExpressionError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotLoaded,
    NoJournalFiles,
    ParseError,
    BalanceError,
    ExpressionError,
    ConfigError,
    InvalidSortTerm,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::NotLoaded => write!(f, "NOT_LOADED"),
            ErrorCode::NoJournalFiles => write!(f, "NO_JOURNAL_FILES"),
            ErrorCode::ParseError => write!(f, "PARSE_ERROR"),
            ErrorCode::BalanceError => write!(f, "BALANCE_ERROR"),
            ErrorCode::ExpressionError => write!(f, "EXPRESSION_ERROR"),
            ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
            ErrorCode::InvalidSortTerm => write!(f, "INVALID_SORT_TERM"),
        }
    }
}

/// Detailed error information for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Journal file the error was found in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
            file: None,
            line: None,
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, file: String, line: usize) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        if let (Some(ref file), Some(line)) = (&self.file, self.line) {
            write!(f, "\nLocation: {}:{}", file, line)?;
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for ledgerite-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Ledger not loaded")]
    NotLoaded,

    #[error("No journal files given")]
    NoJournalFiles,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown sort term: {term}")]
    InvalidSortTerm { term: String },
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::NotLoaded => ErrorCode::NotLoaded,
            CoreError::NoJournalFiles => ErrorCode::NoJournalFiles,
            CoreError::Parse(_) => ErrorCode::ParseError,
            CoreError::Balance(_) => ErrorCode::BalanceError,
            CoreError::Expression(_) => ErrorCode::ExpressionError,
            CoreError::Config(_) => ErrorCode::ConfigError,
            CoreError::InvalidSortTerm { .. } => ErrorCode::InvalidSortTerm,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::NotLoaded => ErrorSeverity::Warning,
            CoreError::NoJournalFiles => ErrorSeverity::Error,
            CoreError::Parse(_) => ErrorSeverity::Error,
            CoreError::Balance(_) => ErrorSeverity::Error,
            CoreError::Expression(_) => ErrorSeverity::Error,
            CoreError::Config(_) => ErrorSeverity::Critical,
            CoreError::InvalidSortTerm { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::NotLoaded => {
                details = details.with_suggestion("Load the journal before asking for reports.");
            }
            CoreError::NoJournalFiles => {
                details = details
                    .with_suggestion("Pass a journal with -f FILE.")
                    .with_suggestion("Or list it under journal.files in the config file.");
            }
            CoreError::Parse(error) => {
                details = details.with_detail(serde_json::json!({ "parse_message": error.kind().to_string() }));
                if let Some(location) = error.location() {
                    details = details.with_location(location.source.clone(), location.line);
                }
                details = details.with_suggestion("Check the syntax of the journal line.");
            }
            CoreError::Balance(BalanceError::AmbiguousElision { header, .. }) => {
                details = details.with_suggestion(format!(
                    "Give every posting but one of '{}' an explicit amount.",
                    header
                ));
            }
            CoreError::Balance(BalanceError::Overflow(overflow)) => {
                details = details.with_suggestion(format!(
                    "Amounts of '{}' exceed the exact decimal range; split them across accounts or commodities.",
                    overflow.commodity.symbol()
                ));
            }
            CoreError::Expression(error) => {
                details = details.with_detail(serde_json::json!({ "expression_message": error.to_string() }));
                details = details.with_suggestion(
                    "Filters combine account patterns with and, or, not, payee and parentheses.",
                );
            }
            CoreError::Config(error) => {
                for suggestion in error.to_details().suggestions {
                    details = details.with_suggestion(suggestion);
                }
            }
            CoreError::InvalidSortTerm { .. } => {
                details = details.with_suggestion("Supported sort terms are d and date, prefixed by - to reverse.");
            }
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            data: serde_json::json!({}),
        }
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        log::error!(
            target: "ledgerite::error",
            "ERROR [{}] {} - Operation: {} - Context: {}",
            error.code(),
            error.to_details(),
            context.operation,
            context.data
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "ledgerite::error",
            "WARNING: {} - Operation: {} - Context: {}",
            message,
            context.operation,
            context.data
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerite_parser::Location;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::NotLoaded.to_string(), "NOT_LOADED");
        assert_eq!(ErrorCode::ParseError.to_string(), "PARSE_ERROR");
        assert_eq!(ErrorCode::InvalidSortTerm.to_string(), "INVALID_SORT_TERM");
    }

    #[test]
    fn test_error_severity_display() {
        assert_eq!(ErrorSeverity::Warning.to_string(), "warning");
        assert_eq!(ErrorSeverity::Critical.to_string(), "critical");
    }

    #[test]
    fn test_conversions() {
        let error: CoreError = ExpressionError::UnbalancedParens {
            expression: "(x".to_string(),
        }
        .into();
        assert_eq!(error.code(), ErrorCode::ExpressionError);
        assert_eq!(error.severity(), ErrorSeverity::Error);

        let error: CoreError = ConfigError::InvalidYaml.into();
        assert_eq!(error.code(), ErrorCode::ConfigError);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_parse_error_details_carry_location() {
        let parse = ParseError::UnexpectedPosting.at(Location {
            source: "books.ledger".to_string(),
            line: 7,
        });
        let details = CoreError::from(parse).to_details();

        assert_eq!(details.code, ErrorCode::ParseError);
        assert_eq!(details.file.as_deref(), Some("books.ledger"));
        assert_eq!(details.line, Some(7));
        assert!(details.details.is_some());
        assert!(details.to_string().contains("Location: books.ledger:7"));
    }

    #[test]
    fn test_balance_error_details() {
        let error = CoreError::from(BalanceError::AmbiguousElision {
            header: "2013/02/20 Rent".to_string(),
            count: 2,
        });
        let details = error.to_details();
        assert!(details.suggestions[0].contains("2013/02/20 Rent"));
    }

    #[test]
    fn test_overflow_error_details() {
        let overflow = ledgerite_parser::AmountOverflow {
            commodity: ledgerite_parser::Commodity::suffix(" BTC"),
            total: rust_decimal::Decimal::MAX,
            amount: rust_decimal::Decimal::ONE,
        };
        let error = CoreError::from(BalanceError::from(overflow));
        assert_eq!(error.code(), ErrorCode::BalanceError);
        assert!(error.to_string().contains("'BTC'"));
        assert!(error.to_details().suggestions[0].contains("'BTC'"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("balance").with_data("filter", serde_json::json!("Expense"));
        assert_eq!(context.operation, "balance");
        assert_eq!(context.data["filter"], "Expense");
    }
}
