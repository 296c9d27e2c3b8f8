//! Double-entry balance inference and verification

use ledgerite_parser::{merge_balance, AmountOverflow, Balance, Transaction};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BalanceError {
    #[error("Transaction '{header}' has {count} postings without an amount, at most one is allowed")]
    AmbiguousElision { header: String, count: usize },

    #[error(transparent)]
    Overflow(#[from] AmountOverflow),
}

/// Per-commodity sum over every posting that carries amounts
pub fn transaction_totals(transaction: &Transaction) -> Result<Balance, BalanceError> {
    let mut totals = Balance::new();
    for amounts in transaction.postings.iter().filter_map(|p| p.amounts.as_ref()) {
        merge_balance(&mut totals, amounts)?;
    }
    Ok(totals)
}

/// Return a copy of `transaction` with its elided posting filled in.
///
/// The elided posting receives the negation of every commodity total of the
/// other postings. Totals that already cancel out are kept as explicit zero
/// entries. A transaction with no elided posting is returned unchanged.
pub fn balance_completed(transaction: &Transaction) -> Result<Transaction, BalanceError> {
    let elided: Vec<usize> = transaction
        .postings
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_elided())
        .map(|(i, _)| i)
        .collect();

    let mut completed = transaction.clone();
    match elided.as_slice() {
        [] => {}
        [index] => {
            let remainder = transaction_totals(transaction)?
                .into_iter()
                .map(|(commodity, amount)| (commodity, -amount))
                .collect();
            completed.postings[*index].amounts = Some(remainder);
        }
        _ => {
            return Err(BalanceError::AmbiguousElision {
                header: transaction.header(),
                count: elided.len(),
            })
        }
    }
    Ok(completed)
}

/// Check that the postings of a transaction sum to zero.
///
/// A transaction with an elided posting balances by construction. A
/// transaction touching exactly two commodities is taken as an implicit
/// exchange between them and also accepted. Totals too large to be summed
/// exactly count as unbalanced.
pub fn verify_balanced(transaction: &Transaction) -> bool {
    if transaction.postings.iter().any(|p| p.is_elided()) {
        return true;
    }

    let Ok(totals) = transaction_totals(transaction) else {
        return false;
    };
    if totals.len() == 2 {
        return true;
    }
    totals.values().all(|amount| amount.is_zero())
}
