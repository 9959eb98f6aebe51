//! # Split Ledger
//!
//! Tracks shared expenses among a fixed set of participants, each with a
//! predetermined cost-sharing ratio, and computes a minimal set of pairwise
//! transfers that settles all outstanding balances.
//!
//! ## Design Principles
//!
//! - **Exact arithmetic**: amounts are `rust_decimal` values kept at their
//!   parsed scale, so undo restores totals bit-for-bit
//! - **No hidden state**: the [`Ledger`] aggregate is threaded explicitly
//!   through processing and settlement
//! - **Append-only history**: the store holds two running totals plus an
//!   ordered expense log behind [`store::HistoryLog`]
//! - **Deterministic output**: map ordering and lexicographic tie-breaks
//!   make every table and settlement plan reproducible
//!
//! ## Example
//!
//! ```
//! use split_ledger::{Ledger, RatioTable};
//! use split_ledger::expense::{Contribution, ExpenseInput};
//! use rust_decimal::Decimal;
//!
//! let ratios = RatioTable::load_tsv("a\t0.5\nb\t0.5\n".as_bytes()).unwrap();
//! let mut ledger = Ledger::seeded(ratios);
//! let input = ExpenseInput::Split {
//!     contributions: vec![Contribution { user: "A".into(), amount: None }],
//! };
//! ledger.apply("2024-01-01", "rent", Decimal::from(80), &input).unwrap();
//! assert_eq!(ledger.total_debt()["B"], Decimal::from(-40));
//! ```

pub mod app;
pub mod cli;
pub mod decimal;
pub mod error;
pub mod expense;
pub mod ledger;
pub mod ratio;
pub mod report;
pub mod settlement;
pub mod store;

pub use error::{LedgerError, Result};
pub use expense::Expense;
pub use ledger::Ledger;
pub use ratio::RatioTable;
pub use settlement::{settle, Transfer};
pub use store::{HistoryLog, SqliteStore, Store};
