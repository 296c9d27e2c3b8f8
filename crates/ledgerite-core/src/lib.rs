//! Core ledger processing: balancing, querying and aggregation

pub mod error;
pub mod balance;
pub mod query;
pub mod expression;
pub mod aggregate;
pub mod journal;
pub mod reports;
pub mod sorter;

use ledgerite_config::Config;
use ledgerite_parser::{ParserRef, Transaction};

pub use aggregate::{AccountAggregate, AggregateRow};
pub use balance::{balance_completed, verify_balanced, BalanceError};
pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger, ErrorSeverity};
pub use expression::{build_expr_from_postfix, build_expression, build_postfix_expression, tokenize_expression, ExpressionError};
pub use journal::Journal;
pub use query::Query;
pub use reports::{BalanceReport, BalanceReportEntry, RegisterEntry, RegisterPosting};
pub use sorter::JournalSorter;

/// Main ledger structure
pub struct Ledger {
    config: Config,
    parser: ParserRef,
    sorter: JournalSorter,
    journal: Option<Journal>,
}

impl Ledger {
    /// Create a new ledger with config and parser
    pub fn new(config: Config, parser: ParserRef) -> CoreResult<Self> {
        let sorter = JournalSorter::from_term_list(config.report.sort_terms())?;
        Ok(Self {
            config,
            parser,
            sorter,
            journal: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the price database and every configured journal file into a
    /// fresh journal, replacing whatever was loaded before
    pub fn load(&mut self) -> CoreResult<()> {
        if !self.config.has_journal() {
            return Err(CoreError::NoJournalFiles);
        }

        let mut journal = Journal::new();
        if let Some(price_db) = &self.config.journal.price_db {
            journal.add_from_file(self.parser.as_ref(), price_db)?;
        }
        for file in &self.config.journal.files {
            journal.add_from_file(self.parser.as_ref(), file)?;
        }
        self.sorter.sort_journal(&mut journal);

        log::info!(
            "Journal loaded: {} transactions, {} accounts, {} prices",
            journal.transactions.len(),
            journal.accounts.len(),
            journal.prices.len()
        );
        self.journal = Some(journal);
        Ok(())
    }

    /// Reload the ledger
    pub fn reload(&mut self) -> CoreResult<()> {
        if self.journal.is_none() {
            return Err(CoreError::NotLoaded);
        }
        self.load()
    }

    pub fn journal(&self) -> CoreResult<&Journal> {
        self.journal.as_ref().ok_or(CoreError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.journal.is_some()
    }

    /// Transactions whose postings do not sum to zero
    pub fn unbalanced_transactions(&self) -> CoreResult<Vec<&Transaction>> {
        Ok(self.journal()?.verify_transaction_balances())
    }

    /// Account rollups of the postings selected by `query`
    pub fn balance_report(&self, query: &Query) -> CoreResult<BalanceReport> {
        let mut aggregate = AccountAggregate::new();
        aggregate.add_from_journal(self.journal()?, Some(query))?;
        Ok(BalanceReport::from(&aggregate))
    }

    /// Selected postings with running totals
    pub fn register_report(&self, query: &Query) -> CoreResult<Vec<RegisterEntry>> {
        Ok(self.journal()?.generate_running_total_report(query)?)
    }

    /// Transactions with at least one selected posting
    pub fn print_report(&self, query: &Query) -> CoreResult<Vec<&Transaction>> {
        Ok(self.journal()?.transactions_matching(query))
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerite_parser::{Commodity, DefaultJournalParser};
    use rust_decimal_macros::dec;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
    }

    fn ledger(files: &[&str], configure: impl FnOnce(&mut Config)) -> Ledger {
        let mut config = Config::default();
        config.journal.files = files.iter().map(|f| fixture(f)).collect();
        configure(&mut config);
        let mut ledger = Ledger::new(config, Arc::new(DefaultJournalParser)).unwrap();
        ledger.load().unwrap();
        ledger
    }

    fn names(report: &BalanceReport) -> Vec<(usize, &str)> {
        report.entries.iter().map(|e| (e.depth, e.name.as_str())).collect()
    }

    #[test]
    fn test_not_loaded() {
        let ledger = Ledger::new(Config::default(), Arc::new(DefaultJournalParser)).unwrap();
        assert!(!ledger.is_loaded());
        assert!(matches!(ledger.journal(), Err(CoreError::NotLoaded)));
        assert!(matches!(ledger.balance_report(&Query::MatchAll), Err(CoreError::NotLoaded)));
    }

    #[test]
    fn test_load_without_files() {
        let mut ledger = Ledger::new(Config::default(), Arc::new(DefaultJournalParser)).unwrap();
        assert!(matches!(ledger.load(), Err(CoreError::NoJournalFiles)));
    }

    #[test]
    fn test_invalid_sort_term_in_config() {
        let mut config = Config::default();
        config.report.sort = Some("amount".to_string());
        let result = Ledger::new(config, Arc::new(DefaultJournalParser));
        assert!(matches!(result, Err(CoreError::InvalidSortTerm { .. })));
    }

    #[test]
    fn test_balance_report_tree() {
        let ledger = ledger(&["books.ledger"], |_| {});
        let report = ledger.balance_report(&Query::MatchAll).unwrap();

        assert_eq!(
            names(&report),
            vec![
                (1, "Asset"),
                (2, "Bitcoin:Wallet"),
                (2, "Cash"),
                (1, "Bank"),
                (2, "Banorte"),
                (2, "Paypal"),
                (1, "Expense"),
                (2, "Coffee"),
                (2, "Favor"),
                (2, "Web Services:Reddit"),
                (1, "Income:Salary"),
                (1, "Payable:Joe:Favor"),
            ]
        );
        assert!(report.total.values().all(|amount| amount.is_zero()));

        let bank = &report.entries[3];
        assert_eq!(bank.aggregates.get(&Commodity::suffix(" USD")), Some(&dec!(30)));
    }

    #[test]
    fn test_balance_report_with_filter() {
        let ledger = ledger(&["books.ledger"], |_| {});
        let report = ledger.balance_report(&build_expression("Expense").unwrap()).unwrap();

        assert_eq!(report.total.get(&Commodity::suffix(" BTC")), Some(&dec!(10)));
        assert_eq!(report.total.get(&Commodity::prefix("$")), Some(&dec!(13.50)));
        assert_eq!(report.total.get(&Commodity::suffix(" USD")), None);
    }

    #[test]
    fn test_loading_twice_doubles_totals() {
        let ledger = ledger(&["books.ledger", "books.ledger"], |_| {});
        let report = ledger.balance_report(&Query::regex("Bank").unwrap()).unwrap();
        assert_eq!(report.total.get(&Commodity::suffix(" USD")), Some(&dec!(60)));
    }

    #[test]
    fn test_reload_starts_from_scratch() {
        let mut ledger = ledger(&["books.ledger"], |_| {});
        ledger.reload().unwrap();
        assert_eq!(ledger.journal().unwrap().transactions.len(), 4);
    }

    #[test]
    fn test_price_db_is_read_first() {
        let ledger = ledger(&["books.ledger"], |c| c.journal.price_db = Some(fixture("prices.db")));
        let prices = &ledger.journal().unwrap().prices;
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].rate, dec!(20.00));
    }

    #[test]
    fn test_print_report_is_sorted() {
        let ledger = ledger(&["books.ledger"], |c| c.report.sort = Some("d".to_string()));
        let printed: Vec<_> = ledger
            .print_report(&Query::MatchAll)
            .unwrap()
            .into_iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(
            printed,
            vec![
                "Paycheck",
                "Coffee with Joe",
                "Purchased reddit gold for the year",
                "I owe Joe for a favor"
            ]
        );
    }

    #[test]
    fn test_register_report() {
        let ledger = ledger(&["books.ledger"], |_| {});
        let register = ledger.register_report(&build_expression("payee Joe").unwrap()).unwrap();
        assert_eq!(register.len(), 2);
        assert_eq!(register[0].transaction.description, "I owe Joe for a favor");
        assert_eq!(register[0].postings.len(), 2);
        assert!(register[0].postings[1].total.is_empty());
    }

    #[test]
    fn test_unbalanced_transactions() {
        let broken = ledger(&["unbalanced.ledger"], |_| {});
        let unbalanced = broken.unbalanced_transactions().unwrap();
        assert_eq!(unbalanced.len(), 1);
        assert_eq!(unbalanced[0].header(), "2013/03/01 Groceries");

        let clean = ledger(&["books.ledger"], |_| {});
        assert!(clean.unbalanced_transactions().unwrap().is_empty());
    }
}
