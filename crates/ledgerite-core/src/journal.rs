//! In-memory journal built from parsed directives

use std::collections::BTreeSet;
use std::path::Path;

use ledgerite_parser::{
    merge_balance, Balance, Commodity, Directive, JournalParser, ParseError, Price, SpannedDirective,
    Transaction,
};

use crate::balance::{balance_completed, verify_balanced, BalanceError};
use crate::query::Query;
use crate::reports::{RegisterEntry, RegisterPosting};

/// Everything read from one or more journal files
#[derive(Debug, Clone, Default)]
pub struct Journal {
    pub transactions: Vec<Transaction>,
    /// Every account path that appears in a posting
    pub accounts: BTreeSet<Vec<String>>,
    /// Every commodity that appears in an explicit amount
    pub commodities: BTreeSet<Commodity>,
    pub prices: Vec<Price>,
    pub default_commodity: Option<Commodity>,
    pub ignored_symbols: Vec<String>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add and index a transaction
    pub fn add_transaction(&mut self, transaction: Transaction) {
        for posting in &transaction.postings {
            self.accounts.insert(posting.account.clone());
            if let Some(amounts) = &posting.amounts {
                self.commodities.extend(amounts.keys().cloned());
            }
        }
        self.transactions.push(transaction);
    }

    pub fn add_directive(&mut self, directive: Directive) {
        match directive {
            Directive::Transaction(transaction) => self.add_transaction(transaction),
            Directive::Price(price) => self.prices.push(price),
            Directive::IgnoreSymbol(ignore) => self.ignored_symbols.push(ignore.symbol),
            Directive::DefaultCommodity(default) => self.default_commodity = Some(default.commodity),
        }
    }

    pub fn add_directives(&mut self, directives: impl IntoIterator<Item = SpannedDirective>) {
        for directive in directives {
            self.add_directive(directive.data);
        }
    }

    /// Load every directive of a journal file, returning how many were read
    pub fn add_from_file(&mut self, parser: &dyn JournalParser, path: &Path) -> Result<usize, ParseError> {
        let directives = parser.parse_file(path)?;
        let count = directives.len();
        self.add_directives(directives);
        log::info!("Loaded {} directives from {}", count, path.display());
        Ok(count)
    }

    /// Transactions with at least one posting selected by `query`
    pub fn transactions_matching(&self, query: &Query) -> Vec<&Transaction> {
        self.transactions.iter().filter(|t| query.matches(t)).collect()
    }

    /// Transactions whose postings do not balance
    pub fn verify_transaction_balances(&self) -> Vec<&Transaction> {
        let unbalanced: Vec<&Transaction> = self.transactions.iter().filter(|t| !verify_balanced(t)).collect();
        for transaction in &unbalanced {
            log::warn!("Transaction unbalanced: {}", transaction.header());
        }
        unbalanced
    }

    /// Register report: the selected postings of each matching transaction
    /// together with a running total across the whole journal.
    pub fn generate_running_total_report(&self, query: &Query) -> Result<Vec<RegisterEntry>, BalanceError> {
        let mut totals = Balance::new();
        let mut entries = Vec::new();

        for transaction in &self.transactions {
            let selected = query.execute(transaction);
            if selected.is_empty() {
                continue;
            }

            let completed = balance_completed(transaction)?;
            let mut postings = Vec::with_capacity(selected.len());
            for index in selected {
                let posting = &completed.postings[index];
                let change = posting.amounts.clone().unwrap_or_default();
                merge_balance(&mut totals, &change)?;
                postings.push(RegisterPosting {
                    account: posting.account_name(),
                    change,
                    total: totals
                        .iter()
                        .filter(|(_, amount)| !amount.is_zero())
                        .map(|(c, a)| (c.clone(), *a))
                        .collect(),
                });
            }

            entries.push(RegisterEntry {
                transaction: completed,
                postings,
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerite_parser::{DefaultJournalParser, SimpleJournalParser};
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
    }

    fn journal(content: &str) -> Journal {
        let mut journal = Journal::new();
        journal.add_directives(SimpleJournalParser::parse(content).unwrap());
        journal
    }

    const COFFEE: &str = "\
2013/01/01 Coffee
    Expense:Coffee  $3
    Asset:Cash
2013/01/02 Lunch
    Expense:Food  $10
    Asset:Cash  $-10
";

    #[test]
    fn test_directives_are_indexed() {
        let mut journal = Journal::new();
        journal.add_from_file(&DefaultJournalParser, &fixture("books.ledger")).unwrap();

        assert_eq!(journal.transactions.len(), 4);
        assert_eq!(journal.prices.len(), 1);
        assert_eq!(journal.ignored_symbols, vec!["$".to_string()]);
        assert_eq!(journal.default_commodity, Some(Commodity::prefix("$")));
        assert!(journal.accounts.contains(&vec!["Bank".to_string(), "Paypal".to_string()]));
        assert!(journal.commodities.contains(&Commodity::suffix(" BTC")));
    }

    #[test]
    fn test_elided_accounts_are_indexed() {
        let journal = journal(COFFEE);
        assert!(journal.accounts.contains(&vec!["Asset".to_string(), "Cash".to_string()]));
        assert_eq!(journal.commodities.len(), 1);
    }

    #[test]
    fn test_transactions_matching() {
        let journal = journal(COFFEE);
        let query = Query::regex("Food").unwrap();
        let matching: Vec<_> = journal
            .transactions_matching(&query)
            .into_iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(matching, vec!["Lunch"]);
    }

    #[test]
    fn test_verify_transaction_balances() {
        let journal = journal(
            "2013/01/01 Fine\n    A  $1\n    B  $-1\n2013/01/02 Broken\n    A  $1\n    B  $-2\n",
        );
        let unbalanced = journal.verify_transaction_balances();
        assert_eq!(unbalanced.len(), 1);
        assert_eq!(unbalanced[0].header(), "2013/01/02 Broken");
    }

    #[test]
    fn test_running_total_report() {
        let usd = Commodity::prefix("$");
        let journal = journal(COFFEE);
        let report = journal.generate_running_total_report(&Query::regex("Expense").unwrap()).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].postings.len(), 1);
        assert_eq!(report[0].postings[0].account, "Expense:Coffee");
        assert_eq!(report[0].postings[0].total.get(&usd), Some(&dec!(3)));
        assert_eq!(report[1].postings[0].total.get(&usd), Some(&dec!(13)));
    }

    #[test]
    fn test_running_total_drops_zero_entries() {
        let journal = journal(COFFEE);
        let report = journal.generate_running_total_report(&Query::MatchAll).unwrap();

        // the elided posting is filled in
        let cash = &report[0].postings[1];
        assert_eq!(cash.change.get(&Commodity::prefix("$")), Some(&dec!(-3)));
        assert!(cash.total.is_empty());
        assert!(report[1].postings[1].total.is_empty());
    }

    #[test]
    fn test_running_total_overflow() {
        let journal = journal(
            "2013/01/01 One\n    A  79228162514264337593543950335 USD\n    B\n\
             2013/01/02 Two\n    A  1 USD\n    B\n",
        );
        assert!(matches!(
            journal.generate_running_total_report(&Query::regex("A").unwrap()),
            Err(BalanceError::Overflow(_))
        ));
        assert!(journal.generate_running_total_report(&Query::MatchAll).is_ok());
    }

    #[test]
    fn test_running_total_report_rejects_ambiguous_elision() {
        let journal = journal("2013/01/01 Bad\n    A\n    B\n");
        assert!(matches!(
            journal.generate_running_total_report(&Query::MatchAll),
            Err(BalanceError::AmbiguousElision { .. })
        ));
    }
}
