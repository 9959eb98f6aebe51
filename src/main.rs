//! Split Ledger CLI
//!
//! Records shared expenses against a fixed ratio table and prints running
//! totals and minimal settlement plans.
//!
//! # Usage
//!
//! ```bash
//! split-ledger 2024-01-01 groceries 100 alice
//! split-ledger settle
//! ```
//!
//! # Environment Variables
//!
//! - `SPLIT_LEDGER_RATIOS`: path to the `USER<TAB>ratio` file (default `ratios.tsv`)
//! - `SPLIT_LEDGER_DB`: path to the ledger database (default `ledger.db`)
//! - `RUST_LOG`: set to `debug` or `warn` to control logging verbosity

use split_ledger::store::{HistoryLog, SqliteStore};
use split_ledger::{app, cli, RatioTable, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = cli::parse(&args)?;

    let ratio_path =
        env::var("SPLIT_LEDGER_RATIOS").unwrap_or_else(|_| "ratios.tsv".to_string());
    let db_path = env::var("SPLIT_LEDGER_DB").unwrap_or_else(|_| "ledger.db".to_string());

    let ratio_file = File::open(&ratio_path)?;
    let ratios = RatioTable::load_tsv(BufReader::new(ratio_file))?;

    let mut log = HistoryLog::new(SqliteStore::open(&db_path)?);

    let stdout = io::stdout();
    let handle = stdout.lock();
    app::run(command, ratios, &mut log, handle)
}
