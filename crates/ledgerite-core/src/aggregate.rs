//! Account aggregation tree
//!
//! Every posting amount is added to its account node and to each ancestor
//! on the way down, so any node's aggregate is available without a second
//! pass. Nodes live in an arena and refer to their children by index.

use std::collections::BTreeMap;

use ledgerite_parser::{add_amount, Balance, Commodity, Transaction};
use rust_decimal::Decimal;

use crate::balance::{balance_completed, BalanceError};
use crate::journal::Journal;
use crate::query::Query;

const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct AggregateNode {
    subaccounts: BTreeMap<String, usize>,
    /// Amounts posted to this account directly
    own_balances: Balance,
    /// Own balances plus those of every descendant
    aggregates: Balance,
}

/// One row of the balance report
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow<'a> {
    pub depth: usize,
    /// Account segment, or several joined by `:` when single-child
    /// accounts were folded into one row. Empty for the root.
    pub name: String,
    pub aggregates: &'a Balance,
}

#[derive(Debug, Clone)]
pub struct AccountAggregate {
    nodes: Vec<AggregateNode>,
}

impl Default for AccountAggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountAggregate {
    pub fn new() -> Self {
        Self {
            nodes: vec![AggregateNode::default()],
        }
    }

    /// Add `amount` of `commodity` to `account` and all of its ancestors.
    ///
    /// After an overflow the tree is only partly updated and should be
    /// discarded.
    pub fn add_commodity<S: AsRef<str>>(
        &mut self,
        account: &[S],
        amount: Decimal,
        commodity: &Commodity,
    ) -> Result<(), BalanceError> {
        let mut current = ROOT;
        add_amount(&mut self.nodes[ROOT].aggregates, commodity, amount)?;
        for segment in account {
            current = self.child(current, segment.as_ref());
            add_amount(&mut self.nodes[current].aggregates, commodity, amount)?;
        }
        add_amount(&mut self.nodes[current].own_balances, commodity, amount)?;
        Ok(())
    }

    fn child(&mut self, parent: usize, name: &str) -> usize {
        if let Some(&index) = self.nodes[parent].subaccounts.get(name) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(AggregateNode::default());
        self.nodes[parent].subaccounts.insert(name.to_string(), index);
        index
    }

    /// Fold the postings of `transaction` selected by `query` into the tree.
    ///
    /// The transaction is balance-completed first so an elided posting
    /// contributes its inferred amounts.
    pub fn add_transaction(&mut self, transaction: &Transaction, query: Option<&Query>) -> Result<(), BalanceError> {
        let completed = balance_completed(transaction)?;
        let match_all = Query::MatchAll;
        let query = query.unwrap_or(&match_all);

        for posting in query.postings_matching(&completed) {
            let Some(amounts) = posting.amounts.as_ref() else {
                continue;
            };
            for (commodity, amount) in amounts {
                self.add_commodity(&posting.account, *amount, commodity)?;
            }
        }
        Ok(())
    }

    pub fn add_from_journal(&mut self, journal: &Journal, query: Option<&Query>) -> Result<(), BalanceError> {
        for transaction in &journal.transactions {
            self.add_transaction(transaction, query)?;
        }
        Ok(())
    }

    /// Grand total over every account
    pub fn aggregates(&self) -> &Balance {
        &self.nodes[ROOT].aggregates
    }

    /// Rollup of the account at `path`, if anything was posted under it
    pub fn aggregates_of<S: AsRef<str>>(&self, path: &[S]) -> Option<&Balance> {
        self.find(path).map(|i| &self.nodes[i].aggregates)
    }

    /// Amounts posted directly to the account at `path`
    pub fn own_balances_of<S: AsRef<str>>(&self, path: &[S]) -> Option<&Balance> {
        self.find(path).map(|i| &self.nodes[i].own_balances)
    }

    fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<usize> {
        path.iter().try_fold(ROOT, |current, segment| {
            self.nodes[current].subaccounts.get(segment.as_ref()).copied()
        })
    }

    /// Preorder walk over the tree, root first.
    ///
    /// Accounts with exactly one subaccount are merged with it into a single
    /// row; the root is always reported on its own as the grand total.
    pub fn iter_aggregates(&self) -> AggregateIter<'_> {
        AggregateIter {
            tree: self,
            stack: vec![(ROOT, 0, String::new())],
        }
    }
}

/// Iterator returned by [`AccountAggregate::iter_aggregates`]
pub struct AggregateIter<'a> {
    tree: &'a AccountAggregate,
    stack: Vec<(usize, usize, String)>,
}

impl<'a> Iterator for AggregateIter<'a> {
    type Item = AggregateRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (mut index, depth, mut name) = self.stack.pop()?;
        let tree: &'a AccountAggregate = self.tree;
        let nodes = &tree.nodes;

        if depth > 0 {
            while let Some((child_name, child)) = only_child(&nodes[index]) {
                name.push(':');
                name.push_str(child_name);
                index = child;
            }
        }

        let node = &nodes[index];
        for (child_name, &child) in node.subaccounts.iter().rev() {
            self.stack.push((child, depth + 1, child_name.clone()));
        }

        Some(AggregateRow {
            depth,
            name,
            aggregates: &node.aggregates,
        })
    }
}

fn only_child(node: &AggregateNode) -> Option<(&str, usize)> {
    if node.subaccounts.len() != 1 {
        return None;
    }
    node.subaccounts.iter().next().map(|(name, &index)| (name.as_str(), index))
}
