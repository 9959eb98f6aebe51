//! Text rendering: aligned balance tables, settlement plans, JSON export.
//!
//! All monetary values are displayed rounded to 2 decimal places; the exact
//! values only live in the store.

use crate::decimal::format_money;
use crate::error::Result;
use crate::expense::{Balances, Expense};
use crate::settlement::Transfer;
use std::io::Write;

/// Writes a two-column `USER amount` table, one row per user, aligned on the
/// widest user token and sorted by user.
pub fn write_balances<W: Write>(mut writer: W, balances: &Balances) -> Result<()> {
    let width = balances.keys().map(|u| u.len()).max().unwrap_or(0);
    for (user, value) in balances {
        writeln!(writer, "{user:<width$} {}", format_money(value))?;
    }
    Ok(())
}

/// Writes the settlement plan as `DEBTOR amount CREDITOR` rows.
///
/// Rows are sorted lexicographically by their rendered text, matching the
/// display order of the balance tables.
pub fn write_transfers<W: Write>(mut writer: W, transfers: &[Transfer]) -> Result<()> {
    let debtor_width = transfers.iter().map(|t| t.debtor.len()).max().unwrap_or(0);
    let amount_width = transfers
        .iter()
        .map(|t| format_money(&t.amount).len())
        .max()
        .unwrap_or(0);

    let mut rows: Vec<String> = transfers
        .iter()
        .map(|t| {
            format!(
                "{:<debtor_width$} {:<amount_width$} {}",
                t.debtor,
                format_money(&t.amount),
                t.creditor
            )
        })
        .collect();
    rows.sort();

    for row in rows {
        writeln!(writer, "{row}")?;
    }
    Ok(())
}

/// One-line summary of an expense, used by the `last` and `undo` commands.
///
/// Example: `2024-01-01 GROCERIES 100 A:100`.
pub fn expense_summary(expense: &Expense) -> String {
    let pairs: Vec<String> = expense
        .breakdown
        .iter()
        .map(|(user, value)| format!("{user}:{value}"))
        .collect();
    format!(
        "{} {} {} {}",
        expense.date.to_uppercase(),
        expense.narration.to_uppercase(),
        expense.amount,
        pairs.join(" ")
    )
}

/// Dumps the full history as a JSON array, optionally indented.
pub fn write_export<W: Write>(mut writer: W, expenses: &[Expense], pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, expenses)?;
    } else {
        serde_json::to_writer(&mut writer, expenses)?;
    }
    writeln!(writer)?;
    Ok(())
}
