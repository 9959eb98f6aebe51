//! The ratio table: who is responsible for what share of each expense.
//!
//! Loaded once per invocation from a tab-separated file and immutable
//! afterwards. The table defines the canonical key space: any user token
//! appearing anywhere else (contributor specs, transfer parties) must
//! resolve to an entry here.

use crate::decimal::parse_decimal;
use crate::error::{LedgerError, Result};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Read;

/// Normalizes a user token to its canonical form.
///
/// User identifiers are case-insensitive and stored uppercase.
pub fn normalize_user(token: &str) -> String {
    token.trim().to_uppercase()
}

/// Per-user split ratios, validated to sum to exactly 1.
#[derive(Debug, Clone)]
pub struct RatioTable {
    ratios: BTreeMap<String, Decimal>,
}

impl RatioTable {
    /// Loads a ratio table from `USER<TAB>ratio` rows.
    ///
    /// Each row must have exactly two fields and the ratio must parse as an
    /// exact decimal. After all rows are read the ratios must sum to exactly
    /// 1, with no tolerance. Duplicate rows for the same user overwrite the
    /// earlier entry (last write wins) while every row still counts toward
    /// the sum check.
    pub fn load_tsv<R: Read>(reader: R) -> Result<RatioTable> {
        let mut tsv = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut ratios = BTreeMap::new();
        let mut sum = Decimal::ZERO;

        for record in tsv.records() {
            let record = record?;
            let user = normalize_user(record.get(0).unwrap_or_default());

            if record.len() != 2 {
                return Err(LedgerError::MalformedRatioRow { user });
            }

            let ratio = parse_decimal(record.get(1).unwrap_or_default())?;
            ratios.insert(user, ratio);
            sum += ratio;
        }

        if sum != Decimal::ONE {
            return Err(LedgerError::RatioSumMismatch { sum });
        }

        Ok(RatioTable { ratios })
    }

    /// Returns the ratio for a canonical user token, if known.
    pub fn ratio(&self, user: &str) -> Option<Decimal> {
        self.ratios.get(user).copied()
    }

    /// Returns `true` if the user is part of the table.
    pub fn contains(&self, user: &str) -> bool {
        self.ratios.contains_key(user)
    }

    /// Iterates users and ratios in lexicographic user order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.ratios.iter()
    }

    /// Iterates canonical user tokens in lexicographic order.
    pub fn users(&self) -> impl Iterator<Item = &String> {
        self.ratios.keys()
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    /// Returns `true` if the table has no users.
    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn load(data: &str) -> Result<RatioTable> {
        RatioTable::load_tsv(data.as_bytes())
    }

    #[test]
    fn test_load_valid_table() {
        let table = load("a\t0.5\nb\t0.3\nc\t0.2\n").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.ratio("A"), Some(Decimal::from_str("0.5").unwrap()));
        assert_eq!(table.ratio("C"), Some(Decimal::from_str("0.2").unwrap()));
    }

    #[test]
    fn test_user_tokens_are_uppercased() {
        let table = load("alice\t0.6\nBob\t0.4\n").unwrap();
        assert!(table.contains("ALICE"));
        assert!(table.contains("BOB"));
        assert!(!table.contains("alice"));
        assert_eq!(normalize_user("  bob "), "BOB");
    }

    #[test]
    fn test_row_without_ratio_is_rejected() {
        let err = load("a\t0.5\nb\n").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRatioRow { user } if user == "B"));
    }

    #[test]
    fn test_row_with_extra_field_is_rejected() {
        let err = load("a\t0.5\textra\nb\t0.5\n").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedRatioRow { .. }));
    }

    #[test]
    fn test_unparsable_ratio_is_rejected() {
        let err = load("a\thalf\n").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidNumber { token } if token == "half"));
    }

    #[test]
    fn test_sum_must_be_exactly_one() {
        let err = load("a\t0.5\nb\t0.49999\n").unwrap_err();
        match err {
            LedgerError::RatioSumMismatch { sum } => {
                assert_eq!(sum, Decimal::from_str("0.99999").unwrap());
            }
            other => panic!("expected RatioSumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_sum_above_one_is_rejected() {
        assert!(matches!(
            load("a\t0.6\nb\t0.6\n"),
            Err(LedgerError::RatioSumMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_user_last_write_wins() {
        // both rows count toward the sum; the map keeps the later ratio
        let table = load("a\t0.5\na\t0.3\nb\t0.2\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.ratio("A"), Some(Decimal::from_str("0.3").unwrap()));
    }

    #[test]
    fn test_iteration_order_is_lexicographic() {
        let table = load("z\t0.2\na\t0.5\nm\t0.3\n").unwrap();
        let users: Vec<&String> = table.users().collect();
        assert_eq!(users, ["A", "M", "Z"]);
    }
}
