//! Balance accounting: turning one expense into breakdown and debt deltas.
//!
//! The [`Ledger`] aggregate owns the ratio table and both running totals and
//! is threaded explicitly through processing; there is no shared mutable
//! state. Applying an expense mutates the totals and returns the record to
//! persist; [`Ledger::undo`] is the exact algebraic inverse.

use crate::error::{LedgerError, Result};
use crate::expense::{Balances, Contribution, DebtMap, Expense, ExpenseInput};
use crate::ratio::RatioTable;
use log::warn;
use rust_decimal::Decimal;

/// Ratio table plus both running totals.
///
/// `total_breakdown` is the per-user sum of all historical breakdown deltas.
/// `total_debt` is the per-user net position: positive means the group owes
/// the user, negative means the user owes the group. The sum of `total_debt`
/// over all users is exactly zero after every apply and undo.
#[derive(Debug, Clone)]
pub struct Ledger {
    ratios: RatioTable,
    total_breakdown: Balances,
    total_debt: Balances,
}

impl Ledger {
    /// Builds a ledger from previously persisted totals.
    pub fn new(ratios: RatioTable, total_breakdown: Balances, total_debt: Balances) -> Self {
        Ledger {
            ratios,
            total_breakdown,
            total_debt,
        }
    }

    /// Builds a ledger with zero totals for every known user.
    pub fn seeded(ratios: RatioTable) -> Self {
        let zeros: Balances = ratios
            .users()
            .map(|u| (u.clone(), Decimal::ZERO))
            .collect();
        Ledger {
            ratios,
            total_breakdown: zeros.clone(),
            total_debt: zeros,
        }
    }

    /// Running per-user contribution totals.
    pub fn total_breakdown(&self) -> &Balances {
        &self.total_breakdown
    }

    /// Running per-user net positions.
    pub fn total_debt(&self) -> &Balances {
        &self.total_debt
    }

    /// The ratio table this ledger validates against.
    pub fn ratios(&self) -> &RatioTable {
        &self.ratios
    }

    /// Applies one new expense, updating both totals, and returns the record
    /// to append to history.
    ///
    /// All validation happens before any mutation: on error the totals are
    /// untouched.
    pub fn apply(
        &mut self,
        date: &str,
        narration: &str,
        amount: Decimal,
        input: &ExpenseInput,
    ) -> Result<Expense> {
        match input {
            ExpenseInput::Transfer { payer, payee } => {
                self.apply_transfer(date, narration, amount, payer, payee)
            }
            ExpenseInput::Split { contributions } => {
                self.apply_split(date, narration, amount, contributions)
            }
        }
    }

    /// Direct transfer between two users: the payer hands the payee money,
    /// no ratios involved.
    ///
    /// The debt map records the payee as sole creditor owed by the payer,
    /// duplicating the breakdown information, and the stored record amount is
    /// reset to zero; the movement lives entirely in the breakdown.
    fn apply_transfer(
        &mut self,
        date: &str,
        narration: &str,
        amount: Decimal,
        payer: &str,
        payee: &str,
    ) -> Result<Expense> {
        for user in [payer, payee] {
            if !self.ratios.contains(user) {
                return Err(LedgerError::UnknownUser {
                    user: user.to_string(),
                });
            }
        }

        let mut breakdown = Balances::new();
        breakdown.insert(payer.to_string(), -amount);
        breakdown.insert(payee.to_string(), amount);

        let mut debt = DebtMap::new();
        let mut owed = Balances::new();
        owed.insert(payer.to_string(), amount);
        debt.insert(payee.to_string(), owed);

        for (user, delta) in &breakdown {
            *self.total_breakdown.entry(user.clone()).or_default() += *delta;
            *self.total_debt.entry(user.clone()).or_default() += *delta;
        }

        Ok(Expense {
            date: date.to_string(),
            narration: narration.to_string(),
            amount: Decimal::ZERO,
            breakdown,
            debt,
        })
    }

    /// Ratio-based split: contributors front the cost, everyone owes their
    /// fair share.
    ///
    /// Each overpayer's surplus is distributed across all shortfall users
    /// proportionally to their shortfall weight. The final shortfall user
    /// receives the remainder rather than a computed share, so the shares
    /// always sum to the surplus exactly and undo stays bit-exact even when
    /// the proportional division does not terminate.
    fn apply_split(
        &mut self,
        date: &str,
        narration: &str,
        amount: Decimal,
        contributions: &[Contribution],
    ) -> Result<Expense> {
        let implicit_full = contributions.len() == 1 && contributions[0].amount.is_none();

        let mut breakdown = Balances::new();
        let mut contributed_sum = Decimal::ZERO;

        for contribution in contributions {
            if !self.ratios.contains(&contribution.user) {
                return Err(LedgerError::UnknownUser {
                    user: contribution.user.clone(),
                });
            }

            let value = match contribution.amount {
                Some(v) => v,
                None if implicit_full => amount,
                None => {
                    return Err(LedgerError::MalformedCommand {
                        message: format!(
                            "{}: amount required when listing multiple contributors",
                            contribution.user
                        ),
                    })
                }
            };

            *breakdown.entry(contribution.user.clone()).or_default() += value;
            contributed_sum += value;
        }

        if contributed_sum != amount {
            return Err(LedgerError::AmountMismatch {
                declared: amount,
                contributed: contributed_sum,
            });
        }

        // Fair share per known user, then shortfall weights rx normalized by
        // the expense amount. A zero amount yields no weights.
        let mut rx = Balances::new();
        let mut weight_sum = Decimal::ZERO;
        for (user, ratio) in self.ratios.iter() {
            let fair = amount * ratio;
            let contributed = breakdown.get(user).copied().unwrap_or_default();
            if contributed < fair {
                if let Some(weight) = (fair - contributed).checked_div(amount) {
                    weight_sum += weight;
                    rx.insert(user.clone(), weight);
                }
            }
        }

        let mut debt = DebtMap::new();
        for (user, contributed) in &breakdown {
            let ratio = self.ratios.ratio(user).unwrap_or_default();
            let surplus = *contributed - amount * ratio;
            if surplus <= Decimal::ZERO {
                continue;
            }
            if weight_sum.is_zero() {
                // No shortfall to absorb the surplus. Keeping the totals
                // untouched is the documented choice for this degenerate
                // input; the record still carries the breakdown.
                warn!("{user}: surplus {surplus} has no shortfall users, skipping debt allocation");
                continue;
            }

            let mut owed = Balances::new();
            let mut allocated = Decimal::ZERO;
            let last = rx.keys().next_back().cloned();
            for (shortfall_user, weight) in &rx {
                let share = if Some(shortfall_user) == last.as_ref() {
                    surplus - allocated
                } else {
                    surplus * *weight / weight_sum
                };
                allocated += share;
                owed.insert(shortfall_user.clone(), share);
                *self.total_debt.entry(shortfall_user.clone()).or_default() -= share;
            }
            debt.insert(user.clone(), owed);
            *self.total_debt.entry(user.clone()).or_default() += surplus;
        }

        for (user, delta) in &breakdown {
            *self.total_breakdown.entry(user.clone()).or_default() += *delta;
        }

        Ok(Expense {
            date: date.to_string(),
            narration: narration.to_string(),
            amount,
            breakdown,
            debt,
        })
    }

    /// Reverses the effect of the given expense on both totals.
    ///
    /// Subtracts the record's breakdown from the contribution totals; for
    /// each creditor entry, returns every debtor's amount and removes the
    /// creditors' sums. Applying an expense and then undoing it restores the
    /// totals to their prior exact values.
    pub fn undo(&mut self, expense: &Expense) {
        for (user, delta) in &expense.breakdown {
            *self.total_breakdown.entry(user.clone()).or_default() -= *delta;
        }

        for (creditor, owed) in &expense.debt {
            let mut returned = Decimal::ZERO;
            for (debtor, value) in owed {
                *self.total_debt.entry(debtor.clone()).or_default() += *value;
                returned += *value;
            }
            *self.total_debt.entry(creditor.clone()).or_default() -= returned;
        }
    }
}
