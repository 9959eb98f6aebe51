//! Greedy cash-flow minimization over the net balance vector.
//!
//! The engine is read-only: it works on a copy of the balances and never
//! touches the ledger or the store. For a balanced input of `k` distinct
//! nonzero users it emits at most `k - 1` transfers.

use crate::expense::Balances;
use rust_decimal::Decimal;

/// One pairwise transfer of the settlement plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub debtor: String,
    pub amount: Decimal,
    pub creditor: String,
}

/// Computes a minimal list of transfers that zeroes all balances.
///
/// Repeatedly pairs the user with the most negative balance against the user
/// with the most positive one, settling whichever side runs out first. Ties
/// on the extreme balances are broken by lexicographic user token, so the
/// plan is reproducible. When only one debtor or one creditor remains, that
/// lone user is paired against every remaining opposite-sign user directly.
///
/// The returned transfers are in settlement order; display sorting is the
/// caller's concern.
pub fn settle(balances: &Balances) -> Vec<Transfer> {
    let mut working: Balances = balances
        .iter()
        .filter(|(_, v)| !v.is_zero())
        .map(|(k, v)| (k.clone(), *v))
        .collect();

    let mut transfers = Vec::new();

    loop {
        let n_debtors = working.values().filter(|v| **v < Decimal::ZERO).count();
        let n_creditors = working.values().filter(|v| **v > Decimal::ZERO).count();

        if n_debtors == 0 || n_creditors == 0 {
            // balanced input exhausts both sides together; an unbalanced
            // vector cannot be settled further
            break;
        }

        let (min_user, min_balance) = extreme(&working, |a, b| a < b);
        let (max_user, max_balance) = extreme(&working, |a, b| a > b);

        if n_debtors == 1 || n_creditors == 1 {
            if n_debtors == 1 {
                for (user, value) in &working {
                    if *value > Decimal::ZERO {
                        transfers.push(Transfer {
                            debtor: min_user.clone(),
                            amount: *value,
                            creditor: user.clone(),
                        });
                    }
                }
            } else {
                for (user, value) in &working {
                    if *value < Decimal::ZERO {
                        transfers.push(Transfer {
                            debtor: user.clone(),
                            amount: -*value,
                            creditor: max_user.clone(),
                        });
                    }
                }
            }
            break;
        }

        let owed = -min_balance;
        if owed > max_balance {
            transfers.push(Transfer {
                debtor: min_user.clone(),
                amount: max_balance,
                creditor: max_user.clone(),
            });
            if let Some(balance) = working.get_mut(&min_user) {
                *balance += max_balance;
            }
            working.remove(&max_user);
        } else if owed == max_balance {
            transfers.push(Transfer {
                debtor: min_user.clone(),
                amount: max_balance,
                creditor: max_user.clone(),
            });
            working.remove(&min_user);
            working.remove(&max_user);
        } else {
            transfers.push(Transfer {
                debtor: min_user.clone(),
                amount: owed,
                creditor: max_user.clone(),
            });
            if let Some(balance) = working.get_mut(&max_user) {
                *balance += min_balance;
            }
            working.remove(&min_user);
        }
    }

    transfers
}

/// Finds the user whose balance wins under `better`, keeping the
/// lexicographically first user on ties. The map is non-empty.
fn extreme(working: &Balances, better: impl Fn(Decimal, Decimal) -> bool) -> (String, Decimal) {
    let mut best: Option<(&String, Decimal)> = None;
    for (user, value) in working {
        match best {
            Some((_, current)) if !better(*value, current) => {}
            _ => best = Some((user, *value)),
        }
    }
    let (user, value) = best.expect("extreme() requires a non-empty balance map");
    (user.clone(), value)
}
