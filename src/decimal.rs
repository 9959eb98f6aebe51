//! Decimal parsing and display helpers.
//!
//! Amounts are kept at their exact parsed scale so that undo can restore
//! totals bit-for-bit; quantization to 2 decimal places happens only when
//! rendering for display.

use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a token as an exact decimal.
///
/// Surrounding whitespace is ignored. Returns [`LedgerError::InvalidNumber`]
/// carrying the offending token on failure.
pub fn parse_decimal(token: &str) -> Result<Decimal> {
    Decimal::from_str(token.trim()).map_err(|_| LedgerError::InvalidNumber {
        token: token.trim().to_string(),
    })
}

/// Renders a value rounded to 2 decimal places for display.
///
/// Always shows exactly two fractional digits, e.g. `50` becomes `50.00`.
pub fn format_money(value: &Decimal) -> String {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}
