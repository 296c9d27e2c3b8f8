//! Amount and commodity extraction
//!
//! Turns fragments such as `-$1,000.50`, `-10 BTC` or `42` into an exact
//! decimal and an optional commodity.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ParseError;
use crate::types::Commodity;

/// `[-][prefix][-]number[suffix]`
static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<sign>-)?(?P<prefix>[^\d.,-]*)(?P<inner_sign>-)?(?P<number>[\d.,]+)(?P<suffix>[^\d.,]*)$")
        .expect("amount pattern is valid")
});

/// Parse an amount fragment.
///
/// `None` stands for an elided amount and yields `(None, None)`. A bare
/// number yields no commodity.
pub fn parse_amount(fragment: Option<&str>) -> Result<(Option<Decimal>, Option<Commodity>), ParseError> {
    let Some(fragment) = fragment else {
        return Ok((None, None));
    };
    let fragment = fragment.trim();

    let malformed = |reason: &'static str| ParseError::MalformedAmount {
        fragment: fragment.to_string(),
        reason,
    };

    let caps = AMOUNT_PATTERN
        .captures(fragment)
        .ok_or_else(|| malformed("expected [-][symbol]number[symbol]"))?;

    let outer_sign = caps.name("sign").is_some();
    let inner_sign = caps.name("inner_sign").is_some();
    if outer_sign && inner_sign {
        return Err(malformed("more than one sign"));
    }

    let prefix = caps.name("prefix").map(|m| m.as_str()).unwrap_or_default();
    let suffix = caps.name("suffix").map(|m| m.as_str()).unwrap_or_default();
    if !prefix.is_empty() && !suffix.is_empty() {
        return Err(malformed("both a prefix and a suffix commodity"));
    }

    let number = caps["number"].replace(',', "");
    if number.matches('.').count() > 1 || !number.bytes().any(|b| b.is_ascii_digit()) {
        return Err(malformed("invalid number"));
    }
    let mut amount = Decimal::from_str_exact(&number)
        .or_else(|_| Decimal::from_str_exact(significant_digits(&number)))
        .map_err(|_| malformed("number cannot be represented exactly"))?;
    if outer_sign || inner_sign {
        amount = -amount;
    }

    let commodity = if !prefix.is_empty() {
        Some(Commodity::prefix(prefix))
    } else if !suffix.is_empty() {
        Some(Commodity::suffix(suffix))
    } else {
        None
    };

    Ok((Some(amount), commodity))
}

/// Drop trailing fractional zeros, which carry no value
fn significant_digits(number: &str) -> &str {
    if !number.contains('.') {
        return number;
    }
    match number.trim_end_matches('0').trim_end_matches('.') {
        "" => "0",
        digits => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_prefix_commodity() {
        let (amount, commodity) = parse_amount(Some("-$10")).unwrap();
        assert_eq!(amount, Some(dec!(-10)));
        assert_eq!(commodity, Some(Commodity::prefix("$")));
    }

    #[test]
    fn test_suffix_commodity_keeps_spacing() {
        let (amount, commodity) = parse_amount(Some("-10 BTC")).unwrap();
        assert_eq!(amount, Some(dec!(-10)));
        assert_eq!(commodity, Some(Commodity::suffix(" BTC")));
    }

    #[test]
    fn test_bare_number() {
        let (amount, commodity) = parse_amount(Some("-10")).unwrap();
        assert_eq!(amount, Some(dec!(-10)));
        assert_eq!(commodity, None);
    }

    #[test]
    fn test_elided() {
        assert_eq!(parse_amount(None).unwrap(), (None, None));
    }

    #[test]
    fn test_thousands_separators() {
        let (amount, commodity) = parse_amount(Some("$1,000.00")).unwrap();
        assert_eq!(amount, Some(dec!(1000)));
        assert_eq!(commodity, Some(Commodity::prefix("$")));
    }

    #[test]
    fn test_exact_decimal() {
        let (amount, _) = parse_amount(Some("0.1")).unwrap();
        let sum = amount.unwrap() + amount.unwrap() + amount.unwrap();
        assert_eq!(sum, dec!(0.3));
    }

    #[test]
    fn test_prefix_and_suffix_rejected() {
        let err = parse_amount(Some("$10 USD")).unwrap_err();
        assert!(matches!(err, ParseError::MalformedAmount { .. }));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_amount(Some("BTC")).is_err());
        assert!(parse_amount(Some("1.2.3")).is_err());
        assert!(parse_amount(Some("--5")).is_err());
        assert!(parse_amount(Some("")).is_err());
    }

    #[test]
    fn test_limits_of_exact_amounts() {
        let (amount, _) = parse_amount(Some("79,228,162,514,264,337,593,543,950,335 USD")).unwrap();
        assert_eq!(amount, Some(Decimal::MAX));
        let (amount, _) = parse_amount(Some("0.0000000000000000000000000001")).unwrap();
        assert_eq!(amount, Some(Decimal::new(1, 28)));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = parse_amount(Some("79228162514264337593543950336 USD")).unwrap_err();
        assert!(matches!(err, ParseError::MalformedAmount { .. }));
    }

    #[test]
    fn test_precision_loss_rejected() {
        let err = parse_amount(Some("0.000000000000000000000000000001")).unwrap_err();
        assert!(matches!(err, ParseError::MalformedAmount { .. }));
        assert!(parse_amount(Some("$1.23456789012345678901234567891")).is_err());
    }

    #[test]
    fn test_trailing_zeros_beyond_precision() {
        let (amount, _) = parse_amount(Some("1.500000000000000000000000000000")).unwrap();
        assert_eq!(amount, Some(dec!(1.5)));
    }

    #[test]
    fn test_format_round_trip() {
        for fragment in ["-$1,234.5", "10 BTC", "-0.25 AU", "$7", "12.75"] {
            let (amount, commodity) = parse_amount(Some(fragment)).unwrap();
            let amount = amount.unwrap();
            let commodity = commodity.unwrap_or_default();

            let formatted = commodity.format_amount(amount);
            let (reparsed, recommodity) = parse_amount(Some(&formatted)).unwrap();
            assert_eq!(reparsed, Some(amount), "round trip of {}", fragment);
            assert_eq!(recommodity.unwrap_or_default(), commodity);
        }
    }
}
