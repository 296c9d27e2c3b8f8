//! `print` report

use ledgerite_parser::Transaction;

/// Transactions in journal format, separated by blank lines
pub fn render(transactions: &[&Transaction]) -> String {
    transactions
        .iter()
        .map(|t| t.as_journal_format())
        .collect::<Vec<_>>()
        .join("\n\n")
}
