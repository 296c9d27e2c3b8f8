//! Common types for the journal parser

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Decimal places used by [`Commodity::format_amount`]
pub const DEFAULT_PRECISION: u32 = 2;

/// Span information for error reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanInfo {
    /// 1-based line number of the first line of the record
    pub start: usize,
    /// 1-based line number of the last line of the record
    pub end: usize,
}

/// A unit of exchange: a currency, a stock, a crypto coin...
///
/// The name is kept verbatim, so a suffix commodity parsed from `10 BTC`
/// is named `" BTC"` and is distinct from a prefix `BTC`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Commodity {
    pub name: String,
    pub is_prefix: bool,
}

impl Commodity {
    pub fn new(name: impl Into<String>, is_prefix: bool) -> Self {
        Self {
            name: name.into(),
            is_prefix,
        }
    }

    /// Shorthand for a commodity written before the number (`$10`)
    pub fn prefix(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// Shorthand for a commodity written after the number (`10 BTC`)
    pub fn suffix(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// The commodity symbol without surrounding whitespace
    pub fn symbol(&self) -> &str {
        self.name.trim()
    }

    /// Format an amount with this commodity using two decimal places
    pub fn format_amount(&self, amount: Decimal) -> String {
        self.format_amount_with_precision(amount, DEFAULT_PRECISION)
    }

    /// Format an amount with this commodity using `precision` decimal places
    pub fn format_amount_with_precision(&self, amount: Decimal, precision: u32) -> String {
        let rounded = amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
        let number = format!("{:.*}", precision as usize, rounded);
        if self.is_prefix {
            format!("{}{}", self.name, number)
        } else {
            format!("{}{}", number, self.name)
        }
    }
}

/// Exact per-commodity amounts
pub type Balance = BTreeMap<Commodity, Decimal>;

/// A sum that no longer fits an exact decimal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Amount overflow adding {amount} to {total} of commodity '{}'", commodity.symbol())]
pub struct AmountOverflow {
    pub commodity: Commodity,
    pub total: Decimal,
    pub amount: Decimal,
}

/// Add `amount` of `commodity` into `target`
pub fn add_amount(target: &mut Balance, commodity: &Commodity, amount: Decimal) -> Result<(), AmountOverflow> {
    let total = target.entry(commodity.clone()).or_default();
    match total.checked_add(amount) {
        Some(sum) => {
            *total = sum;
            Ok(())
        }
        None => Err(AmountOverflow {
            commodity: commodity.clone(),
            total: *total,
            amount,
        }),
    }
}

/// Add every entry of `other` into `target`
pub fn merge_balance(target: &mut Balance, other: &Balance) -> Result<(), AmountOverflow> {
    for (commodity, amount) in other {
        add_amount(target, commodity, *amount)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbol_is_trimmed() {
        let btc = Commodity::suffix(" BTC");
        assert_eq!(btc.symbol(), "BTC");
        assert_ne!(btc, Commodity::suffix("BTC"));
        assert_ne!(Commodity::prefix("$"), Commodity::suffix("$"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Commodity::prefix("$").format_amount(dec!(-10)), "$-10.00");
        assert_eq!(Commodity::suffix(" BTC").format_amount(dec!(1.5)), "1.50 BTC");
        assert_eq!(Commodity::default().format_amount(dec!(3.333)), "3.33");
        assert_eq!(
            Commodity::suffix(" AU").format_amount_with_precision(dec!(2.5), 0),
            "3 AU"
        );
    }

    #[test]
    fn test_merge_balance() {
        let usd = Commodity::prefix("$");
        let mut total = Balance::new();
        total.insert(usd.clone(), dec!(5));

        let mut other = Balance::new();
        other.insert(usd.clone(), dec!(-2.5));
        other.insert(Commodity::suffix(" BTC"), dec!(1));

        merge_balance(&mut total, &other).unwrap();
        assert_eq!(total[&usd], dec!(2.5));
        assert_eq!(total.len(), 2);
    }

    #[test]
    fn test_add_amount_overflow() {
        let usd = Commodity::suffix(" USD");
        let mut total = Balance::new();
        add_amount(&mut total, &usd, Decimal::MAX).unwrap();

        let err = add_amount(&mut total, &usd, dec!(1)).unwrap_err();
        assert_eq!(err.total, Decimal::MAX);
        assert_eq!(err.amount, dec!(1));
        // the failed addition leaves the total alone
        assert_eq!(total[&usd], Decimal::MAX);

        add_amount(&mut total, &usd, dec!(-1)).unwrap();
        assert_eq!(total[&usd], Decimal::MAX - dec!(1));
    }
}
