// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # algotx
//!
//! Entry point for the `algotx` binary. Parses CLI arguments, initializes
//! logging and dispatches to the command handlers. Every command runs
//! offline against local files.
//!
//! Command groups:
//!
//! - `address` : derive, validate and compute application addresses
//! - `txn`     : build a payment, decode, print the ID, sign
//! - `msig`    : multisig account address
//! - `lsig`    : program escrow address
//! - `abi`     : method selectors and JSON descriptions
//! - `version` : print build version information

mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;

use cli::{AlgotxCli, Commands};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = AlgotxCli::parse();

    let default_filter = if cli.verbose {
        "algotx=debug,algotx_protocol=debug"
    } else {
        logging::DEFAULT_FILTER
    };
    logging::init_logging(default_filter, LogFormat::from_str_lossy(&cli.log_format));

    let output = match cli.command {
        Commands::Address(cmd) => commands::address(cmd)?,
        Commands::Txn(cmd) => commands::txn(cmd)?,
        Commands::Msig(cmd) => commands::msig(cmd)?,
        Commands::Lsig(cmd) => commands::lsig(cmd)?,
        Commands::Abi(cmd) => commands::abi(cmd)?,
        Commands::Version => version_text(),
    };

    println!("{}", output);
    Ok(())
}

fn version_text() -> String {
    format!(
        "algotx   {}\nmultisig v{}",
        env!("CARGO_PKG_VERSION"),
        algotx_protocol::config::MULTISIG_VERSION
    )
}
