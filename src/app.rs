//! Command execution: wires the ledger, the history log, and the reports.
//!
//! Each invocation runs exactly one command against one store. Commands
//! either fully succeed (totals and history updated together) or fail before
//! any write happens.

use crate::cli::{Command, USAGE};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::ratio::RatioTable;
use crate::report;
use crate::settlement;
use crate::store::{HistoryLog, Store};
use log::debug;
use std::io::Write;

/// Executes one parsed command, writing any output to `writer`.
pub fn run<S: Store, W: Write>(
    command: Command,
    ratios: RatioTable,
    log: &mut HistoryLog<S>,
    mut writer: W,
) -> Result<()> {
    log.ensure_seeded(&ratios)?;

    match command {
        Command::Help => {
            writeln!(writer, "{USAGE}")?;
        }

        Command::Read => {
            let (total_breakdown, _) = log.load_totals()?;
            report::write_balances(writer, &total_breakdown)?;
        }

        Command::Settle => {
            let (_, total_debt) = log.load_totals()?;
            report::write_balances(&mut writer, &total_debt)?;
            let transfers = settlement::settle(&total_debt);
            if !transfers.is_empty() {
                writeln!(writer)?;
                report::write_transfers(writer, &transfers)?;
            }
        }

        Command::Export { pretty } => {
            let expenses = log.entries()?;
            report::write_export(writer, &expenses, pretty)?;
        }

        Command::Last => {
            if let Some(expense) = log.last_entry()? {
                writeln!(writer, "{}", report::expense_summary(&expense))?;
            }
        }

        Command::Undo => {
            // silent no-op on an empty history
            if let Some(expense) = log.last_entry()? {
                let (total_breakdown, total_debt) = log.load_totals()?;
                let mut ledger = Ledger::new(ratios, total_breakdown, total_debt);
                ledger.undo(&expense);
                log.remove_last(ledger.total_breakdown(), ledger.total_debt())?;
                writeln!(writer, "{}", report::expense_summary(&expense))?;
            }
        }

        Command::Add {
            date,
            narration,
            amount,
            input,
        } => {
            let (total_breakdown, total_debt) = log.load_totals()?;
            let mut ledger = Ledger::new(ratios, total_breakdown, total_debt);
            let expense = ledger.apply(&date, &narration, amount, &input)?;
            log.append(&expense, ledger.total_breakdown(), ledger.total_debt())?;
            debug!("recorded {narration} on {date}");
        }
    }

    Ok(())
}
