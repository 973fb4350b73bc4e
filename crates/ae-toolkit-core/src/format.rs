use rust_decimal::Decimal;

use crate::types::{Money, Percent, CURRENCY};

/// Render an amount as a comma-grouped whole number ("1,500,000").
/// Rounds half to even.
pub fn format_amount(amount: Money) -> String {
    let mut rounded = amount.round_dp(0);
    rounded.rescale(0);
    let digits = rounded.abs().to_string();
    let grouped = group_thousands(&digits);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Render an amount with the currency suffix ("1,500,000 SAR").
pub fn format_currency(amount: Money) -> String {
    format!("{} {}", format_amount(amount), CURRENCY)
}

/// Render a whole-number percentage with one decimal ("3.0%").
pub fn format_percentage(value: Percent) -> String {
    let mut rounded = value.round_dp(1);
    rounded.rescale(1);
    format!("{rounded}%")
}

/// Two-decimal rendering used for ratios ("2.50").
pub fn format_ratio(value: Decimal) -> String {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_grouping() {
        assert_eq!(format_amount(dec!(0)), "0");
        assert_eq!(format_amount(dec!(999)), "999");
        assert_eq!(format_amount(dec!(1000)), "1,000");
        assert_eq!(format_amount(dec!(1500000)), "1,500,000");
        assert_eq!(format_amount(dec!(-27000)), "-27,000");
    }

    #[test]
    fn test_amount_rounds_half_even() {
        assert_eq!(format_amount(dec!(35833.33)), "35,833");
        assert_eq!(format_amount(dec!(2.5)), "2");
        assert_eq!(format_amount(dec!(3.5)), "4");
    }

    #[test]
    fn test_currency_suffix() {
        assert_eq!(format_currency(dec!(606375)), "606,375 SAR");
    }

    #[test]
    fn test_percentage_one_decimal() {
        assert_eq!(format_percentage(dec!(3)), "3.0%");
        assert_eq!(format_percentage(dec!(1.55)), "1.6%");
        assert_eq!(format_percentage(dec!(2.25)), "2.2%");
    }

    #[test]
    fn test_ratio_two_decimals() {
        assert_eq!(format_ratio(dec!(2.5)), "2.50");
        assert_eq!(format_ratio(dec!(1.3333)), "1.33");
    }
}
