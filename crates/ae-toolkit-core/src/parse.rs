//! Free-form numeric input cleaning.
//!
//! Every amount a user types goes through [`clean_number`]: thousands
//! separators, `%` signs and surrounding whitespace are dropped, and anything
//! that still does not parse becomes zero. Percentages entered as whole
//! numbers ("5") become fractions (0.05); values already below one are
//! taken to be fractions and left alone.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::{Percent, Rate};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Parse free-form text into a Decimal. Empty, missing or non-numeric input
/// yields zero.
pub fn clean_number(text: Option<&str>, is_percentage: bool) -> Decimal {
    let Some(raw) = text else {
        return Decimal::ZERO;
    };
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && *c != '%')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    let value = Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .unwrap_or(Decimal::ZERO);
    if is_percentage {
        normalize_percent(value)
    } else {
        value
    }
}

/// Like [`clean_number`], but blank input is `None` so callers can tell a
/// missing field from an explicit zero.
pub fn clean_optional(text: Option<&str>, is_percentage: bool) -> Option<Decimal> {
    match text {
        Some(t) if !t.trim().is_empty() => Some(clean_number(Some(t), is_percentage)),
        _ => None,
    }
}

/// Parse a whole count, truncating any fractional part toward zero.
pub fn clean_integer(text: Option<&str>) -> i64 {
    use rust_decimal::prelude::ToPrimitive;
    clean_number(text, false).trunc().to_i64().unwrap_or(0)
}

/// Interpret a percentage figure: whole numbers are divided by 100, values
/// already under one are kept as fractions.
pub fn normalize_percent(value: Decimal) -> Rate {
    if value.abs() >= Decimal::ONE {
        value / HUNDRED
    } else {
        value
    }
}

/// Convert a whole percentage (2.5) to a fraction (0.025) unconditionally.
pub fn percent_to_rate(pct: Percent) -> Rate {
    pct / HUNDRED
}
