//! Report structures produced by the ledger

use ledgerite_parser::{Balance, Transaction};

use crate::aggregate::AccountAggregate;

/// One account row of the balance report
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReportEntry {
    /// Depth below the root, starting at 1
    pub depth: usize,
    /// Account name, possibly several compressed segments
    pub name: String,
    pub aggregates: Balance,
}

/// Balance report: account rollups in tree order plus the grand total
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BalanceReport {
    pub entries: Vec<BalanceReportEntry>,
    pub total: Balance,
}

impl From<&AccountAggregate> for BalanceReport {
    fn from(aggregate: &AccountAggregate) -> Self {
        let mut rows = aggregate.iter_aggregates();
        let total = rows.next().map(|root| root.aggregates.clone()).unwrap_or_default();
        let entries = rows
            .map(|row| BalanceReportEntry {
                depth: row.depth,
                name: row.name,
                aggregates: row.aggregates.clone(),
            })
            .collect();
        Self { entries, total }
    }
}

/// A selected posting with the running total after it
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterPosting {
    pub account: String,
    pub change: Balance,
    /// Running total over every selected posting so far, zero entries dropped
    pub total: Balance,
}

/// Register lines of one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterEntry {
    /// The balance-completed transaction
    pub transaction: Transaction,
    pub postings: Vec<RegisterPosting>,
}
