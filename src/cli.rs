//! Command-line parsing.
//!
//! The surface is deliberately small: a handful of single-token commands
//! plus the default expense form. Parsing never touches the store; every
//! validation failure here aborts before any state exists to mutate.

use crate::decimal::parse_decimal;
use crate::error::{LedgerError, Result};
use crate::expense::{Contribution, ExpenseInput};
use crate::ratio::normalize_user;
use rust_decimal::Decimal;

/// Usage text printed by `help` and on malformed commands.
pub const USAGE: &str = "usage: split-ledger <date> <narration> <amount> <user>[:<amount>]...
       split-ledger <date> intra <amount> <payer> <payee>
       split-ledger read | settle | export | export-pretty | last | undo";

/// Narration keyword that switches the default form to a direct transfer.
pub const TRANSFER_KEYWORD: &str = "intra";

/// A fully parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    /// Print per-user contribution totals.
    Read,
    /// Print net balances and the transfer plan.
    Settle,
    /// Dump the full history as JSON.
    Export { pretty: bool },
    /// Show the most recent expense without mutating.
    Last,
    /// Reverse the most recent expense.
    Undo,
    /// Record a new expense.
    Add {
        date: String,
        narration: String,
        amount: Decimal,
        input: ExpenseInput,
    },
}

/// Parses raw arguments (without the program name) into a [`Command`].
pub fn parse(args: &[String]) -> Result<Command> {
    if args.is_empty() {
        return Ok(Command::Help);
    }

    if args.len() == 1 {
        let token = args[0].to_lowercase();
        return match token.as_str() {
            "-h" | "--help" => Ok(Command::Help),
            "read" => Ok(Command::Read),
            "settle" => Ok(Command::Settle),
            "export" => Ok(Command::Export { pretty: false }),
            "export-pretty" => Ok(Command::Export { pretty: true }),
            "last" => Ok(Command::Last),
            "undo" => Ok(Command::Undo),
            _ => Err(LedgerError::MalformedCommand {
                message: format!("{token}: invalid command"),
            }),
        };
    }

    if args.len() < 4 {
        return Err(LedgerError::MalformedCommand {
            message: USAGE.to_string(),
        });
    }

    let date = args[0].clone();
    let narration = args[1].clone();
    let amount = parse_decimal(&args[2])?;

    let input = if narration.to_lowercase() == TRANSFER_KEYWORD {
        if args.len() != 5 {
            return Err(LedgerError::MalformedCommand {
                message: format!("{TRANSFER_KEYWORD} takes exactly two users: <payer> <payee>"),
            });
        }
        ExpenseInput::Transfer {
            payer: normalize_user(&args[3]),
            payee: normalize_user(&args[4]),
        }
    } else {
        let mut contributions = Vec::new();
        for spec in &args[3..] {
            contributions.push(parse_contribution(spec)?);
        }
        ExpenseInput::Split { contributions }
    };

    Ok(Command::Add {
        date,
        narration,
        amount,
        input,
    })
}

/// Parses one `USER` or `USER:amount` contributor spec.
fn parse_contribution(spec: &str) -> Result<Contribution> {
    let mut parts = spec.splitn(2, ':');
    let user = normalize_user(parts.next().unwrap_or_default());
    let amount = match parts.next() {
        Some(raw) if raw.contains(':') => {
            return Err(LedgerError::MalformedCommand {
                message: format!("{spec}: expected <user>[:<amount>]"),
            })
        }
        Some(raw) => Some(parse_decimal(raw)?),
        None => None,
    };
    Ok(Contribution { user, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn parse_tokens(tokens: &[&str]) -> Result<Command> {
        let args: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        parse(&args)
    }

    #[test]
    fn test_no_args_means_help() {
        assert_eq!(parse_tokens(&[]).unwrap(), Command::Help);
        assert_eq!(parse_tokens(&["--help"]).unwrap(), Command::Help);
        assert_eq!(parse_tokens(&["-h"]).unwrap(), Command::Help);
    }

    #[test]
    fn test_single_token_commands() {
        assert_eq!(parse_tokens(&["read"]).unwrap(), Command::Read);
        assert_eq!(parse_tokens(&["SETTLE"]).unwrap(), Command::Settle);
        assert_eq!(
            parse_tokens(&["export"]).unwrap(),
            Command::Export { pretty: false }
        );
        assert_eq!(
            parse_tokens(&["export-pretty"]).unwrap(),
            Command::Export { pretty: true }
        );
        assert_eq!(parse_tokens(&["last"]).unwrap(), Command::Last);
        assert_eq!(parse_tokens(&["undo"]).unwrap(), Command::Undo);
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(matches!(
            parse_tokens(&["frobnicate"]),
            Err(LedgerError::MalformedCommand { .. })
        ));
    }

    #[test]
    fn test_too_few_expense_args_is_rejected() {
        assert!(parse_tokens(&["2024-01-01", "rent"]).is_err());
        assert!(parse_tokens(&["2024-01-01", "rent", "100"]).is_err());
    }

    #[test]
    fn test_default_form_with_bare_contributor() {
        let command = parse_tokens(&["2024-01-01", "rent", "100", "alice"]).unwrap();
        match command {
            Command::Add {
                date,
                narration,
                amount,
                input: ExpenseInput::Split { contributions },
            } => {
                assert_eq!(date, "2024-01-01");
                assert_eq!(narration, "rent");
                assert_eq!(amount, Decimal::from(100));
                assert_eq!(
                    contributions,
                    vec![Contribution {
                        user: "ALICE".to_string(),
                        amount: None,
                    }]
                );
            }
            other => panic!("expected Add, got {other:?}"),
        }
    }

    #[test]
    fn test_default_form_with_explicit_amounts() {
        let command =
            parse_tokens(&["2024-01-01", "rent", "100", "a:60", "b:40"]).unwrap();
        match command {
            Command::Add {
                input: ExpenseInput::Split { contributions },
                ..
            } => {
                assert_eq!(contributions.len(), 2);
                assert_eq!(contributions[0].user, "A");
                assert_eq!(
                    contributions[0].amount,
                    Some(Decimal::from_str("60").unwrap())
                );
                assert_eq!(contributions[1].user, "B");
            }
            other => panic!("expected Add/Split, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_amount_token() {
        assert!(matches!(
            parse_tokens(&["2024-01-01", "rent", "lots", "a"]),
            Err(LedgerError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_tokens(&["2024-01-01", "rent", "100", "a:much"]),
            Err(LedgerError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_spec_with_two_colons_is_rejected() {
        assert!(matches!(
            parse_tokens(&["2024-01-01", "rent", "100", "a:1:2"]),
            Err(LedgerError::MalformedCommand { .. })
        ));
    }

    #[test]
    fn test_intra_form_parses_payer_then_payee() {
        let command = parse_tokens(&["2024-02-01", "intra", "40", "x", "y"]).unwrap();
        match command {
            Command::Add {
                narration,
                amount,
                input: ExpenseInput::Transfer { payer, payee },
                ..
            } => {
                assert_eq!(narration, "intra");
                assert_eq!(amount, Decimal::from(40));
                assert_eq!(payer, "X");
                assert_eq!(payee, "Y");
            }
            other => panic!("expected Add/Transfer, got {other:?}"),
        }
    }

    #[test]
    fn test_intra_keyword_is_case_insensitive() {
        let command = parse_tokens(&["2024-02-01", "INTRA", "40", "x", "y"]).unwrap();
        assert!(matches!(
            command,
            Command::Add {
                input: ExpenseInput::Transfer { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_intra_with_wrong_arity_is_rejected() {
        assert!(parse_tokens(&["2024-02-01", "intra", "40", "x"]).is_err());
        assert!(parse_tokens(&["2024-02-01", "intra", "40", "x", "y", "z"]).is_err());
    }
}
