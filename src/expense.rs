//! Expense records and the inputs they are built from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-user signed amounts, ordered by canonical user token.
///
/// Used both for a single expense's breakdown and for the two running
/// totals. The ordering makes iteration and serialization deterministic.
pub type Balances = BTreeMap<String, Decimal>;

/// Per-expense creditor → (debtor → amount) allocation.
pub type DebtMap = BTreeMap<String, Balances>;

/// One persisted expense.
///
/// `breakdown` holds what each user actually paid or received for this line
/// item; it sums to `amount` for ratio splits and to zero for direct
/// transfers. `debt` records which creditor is owed how much by which debtor
/// for this expense only. For direct transfers the stored `amount` is reset
/// to zero and the movement lives entirely in `breakdown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub date: String,
    pub narration: String,
    pub amount: Decimal,
    pub breakdown: Balances,
    pub debt: DebtMap,
}

/// A single contributor spec from the command line.
///
/// `amount` is `None` when the spec was a bare user token; that form is only
/// valid for a single contributor, who then carries the full expense amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub user: String,
    pub amount: Option<Decimal>,
}

/// How a new expense distributes money, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpenseInput {
    /// Money moved directly between two users, no ratios involved.
    Transfer { payer: String, payee: String },

    /// A shared cost fronted by one or more contributors and split by ratio.
    Split { contributions: Vec<Contribution> },
}
