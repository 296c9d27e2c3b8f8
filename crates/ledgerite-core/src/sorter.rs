//! Transaction ordering from user supplied sort terms

use std::cmp::Ordering;

use ledgerite_parser::Transaction;

use crate::error::CoreError;
use crate::journal::Journal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortTerm {
    pub key: SortKey,
    pub descending: bool,
}

impl std::str::FromStr for SortTerm {
    type Err = CoreError;

    /// `d`, `date`, optionally prefixed with `-` for descending order
    fn from_str(term: &str) -> Result<Self, Self::Err> {
        let term = term.trim();
        let (descending, name) = match term.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, term),
        };
        let key = match name {
            "d" | "date" => SortKey::Date,
            _ => {
                return Err(CoreError::InvalidSortTerm {
                    term: term.to_string(),
                })
            }
        };
        Ok(Self { key, descending })
    }
}

impl SortTerm {
    fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let ordering = match self.key {
            SortKey::Date => a.date.cmp(&b.date),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Sorts transactions by a list of terms, earlier terms first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalSorter {
    pub terms: Vec<SortTerm>,
}

impl JournalSorter {
    pub fn from_term_list<S: AsRef<str>>(terms: impl IntoIterator<Item = S>) -> Result<Self, CoreError> {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().parse())
            .collect::<Result<Vec<SortTerm>, _>>()?;
        Ok(Self { terms })
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Stable sort; transactions with equal keys keep their journal order
    pub fn sort_transactions(&self, transactions: &mut [Transaction]) {
        transactions.sort_by(|a, b| {
            self.terms
                .iter()
                .map(|term| term.compare(a, b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    pub fn sort_journal(&self, journal: &mut Journal) {
        self.sort_transactions(&mut journal.transactions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(day: u32, description: &str) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(2013, 2, day).unwrap(), description)
    }

    fn descriptions(transactions: &[Transaction]) -> Vec<&str> {
        transactions.iter().map(|t| t.description.as_str()).collect()
    }

    #[test]
    fn test_parse_terms() {
        let sorter = JournalSorter::from_term_list(["d", "-date"]).unwrap();
        assert_eq!(
            sorter.terms,
            vec![
                SortTerm { key: SortKey::Date, descending: false },
                SortTerm { key: SortKey::Date, descending: true },
            ]
        );
    }

    #[test]
    fn test_unknown_term() {
        let err = JournalSorter::from_term_list(["payee"]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSortTerm { ref term } if term == "payee"));
    }

    #[test]
    fn test_sort_by_date() {
        let mut transactions = vec![txn(21, "c"), txn(18, "a"), txn(20, "b")];
        JournalSorter::from_term_list(["d"]).unwrap().sort_transactions(&mut transactions);
        assert_eq!(descriptions(&transactions), vec!["a", "b", "c"]);

        JournalSorter::from_term_list(["-d"]).unwrap().sort_transactions(&mut transactions);
        assert_eq!(descriptions(&transactions), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut transactions = vec![txn(20, "second"), txn(18, "first"), txn(20, "third")];
        JournalSorter::from_term_list(["date"]).unwrap().sort_transactions(&mut transactions);
        assert_eq!(descriptions(&transactions), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_sorter_keeps_order() {
        let mut journal = Journal::new();
        journal.add_transaction(txn(21, "late"));
        journal.add_transaction(txn(1, "early"));
        let sorter = JournalSorter::default();
        assert!(sorter.is_empty());
        sorter.sort_journal(&mut journal);
        assert_eq!(descriptions(&journal.transactions), vec!["late", "early"]);
    }
}
