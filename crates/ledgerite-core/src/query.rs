//! Posting selection queries
//!
//! A query evaluates to the set of posting indices it selects inside a
//! transaction rather than a yes/no answer, so reports can pick the
//! individual postings that matched.

use std::collections::BTreeSet;
use std::fmt;

use ledgerite_parser::{Posting, Transaction};
use regex::Regex;

use crate::expression::ExpressionError;

#[derive(Debug, Clone, Default)]
pub enum Query {
    /// Postings whose full account name contains a match
    RegexMatch(Regex),
    And(Vec<Query>),
    Or(Vec<Query>),
    Not(Box<Query>),
    /// All postings if the description matches, none otherwise
    PayeeMatch(Regex),
    #[default]
    MatchAll,
}

impl Query {
    /// Account pattern query
    pub fn regex(pattern: &str) -> Result<Self, ExpressionError> {
        compile(pattern).map(Query::RegexMatch)
    }

    /// Description pattern query
    pub fn payee(pattern: &str) -> Result<Self, ExpressionError> {
        compile(pattern).map(Query::PayeeMatch)
    }

    /// Indices of the postings of `transaction` selected by this query
    pub fn execute(&self, transaction: &Transaction) -> BTreeSet<usize> {
        let all = || (0..transaction.postings.len()).collect::<BTreeSet<_>>();

        match self {
            Query::RegexMatch(regex) => transaction
                .postings
                .iter()
                .enumerate()
                .filter(|(_, p)| regex.is_match(&p.account_name()))
                .map(|(i, _)| i)
                .collect(),
            Query::And(children) => children.iter().fold(all(), |acc, child| {
                acc.intersection(&child.execute(transaction)).copied().collect()
            }),
            Query::Or(children) => children
                .iter()
                .flat_map(|child| child.execute(transaction))
                .collect(),
            Query::Not(child) => {
                let excluded = child.execute(transaction);
                all().difference(&excluded).copied().collect()
            }
            Query::PayeeMatch(regex) => {
                if regex.is_match(&transaction.description) {
                    all()
                } else {
                    BTreeSet::new()
                }
            }
            Query::MatchAll => all(),
        }
    }

    /// Whether at least one posting of `transaction` is selected
    pub fn matches(&self, transaction: &Transaction) -> bool {
        !self.execute(transaction).is_empty()
    }

    /// The selected postings, in journal order
    pub fn postings_matching<'a>(
        &self,
        transaction: &'a Transaction,
    ) -> impl Iterator<Item = &'a Posting> + 'a {
        let selected = self.execute(transaction);
        transaction
            .postings
            .iter()
            .enumerate()
            .filter(move |(i, _)| selected.contains(i))
            .map(|(_, p)| p)
    }
}

fn compile(pattern: &str) -> Result<Regex, ExpressionError> {
    Regex::new(pattern).map_err(|e| ExpressionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Query::RegexMatch(a), Query::RegexMatch(b)) => a.as_str() == b.as_str(),
            (Query::PayeeMatch(a), Query::PayeeMatch(b)) => a.as_str() == b.as_str(),
            (Query::And(a), Query::And(b)) => a == b,
            (Query::Or(a), Query::Or(b)) => a == b,
            (Query::Not(a), Query::Not(b)) => a == b,
            (Query::MatchAll, Query::MatchAll) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, children: &[Query], op: &str| {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, ")")
        };

        match self {
            Query::RegexMatch(regex) => write!(f, "{}", regex.as_str()),
            Query::And(children) => join(f, children, "and"),
            Query::Or(children) => join(f, children, "or"),
            Query::Not(child) => write!(f, "not {}", child),
            Query::PayeeMatch(regex) => write!(f, "payee {}", regex.as_str()),
            Query::MatchAll => write!(f, "*"),
        }
    }
}
