//! # CLI Interface
//!
//! Defines the command-line argument structure for `algotx` using `clap`
//! derive. Five command groups: `address`, `txn`, `msig`, `lsig` and
//! `abi`. Everything runs offline; nothing here talks to a node.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Offline Algorand transaction tool.
///
/// Builds, inspects and signs transactions, derives multisig and program
/// addresses, and computes ABI method selectors.
#[derive(Parser, Debug)]
#[command(
    name = "algotx",
    about = "Offline Algorand transaction tool",
    version,
    propagate_version = true
)]
pub struct AlgotxCli {
    /// Log output format: `pretty` or `json`. Logs go to stderr.
    #[arg(long, global = true, env = "ALGOTX_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Raise the default log level to debug. `RUST_LOG` still wins.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Address encoding and validation.
    #[command(subcommand)]
    Address(AddressCommand),
    /// Build, decode, identify and sign transactions.
    #[command(subcommand)]
    Txn(TxnCommand),
    /// Multisig account helpers.
    #[command(subcommand)]
    Msig(MsigCommand),
    /// Logic signature helpers.
    #[command(subcommand)]
    Lsig(LsigCommand),
    /// ABI method helpers.
    #[command(subcommand)]
    Abi(AbiCommand),
    /// Print version information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum AddressCommand {
    /// Print the address of a hex-encoded 32-byte public key.
    FromKey { public_key: String },
    /// Check an address string, including its checksum.
    Validate { address: String },
    /// Print the escrow address of an application.
    App { app_id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum TxnCommand {
    /// Build an unsigned payment and write it as msgpack.
    Pay(PayArgs),
    /// Print a msgpack transaction file as JSON.
    Decode {
        file: PathBuf,
        /// The file holds a signed envelope rather than a bare transaction.
        #[arg(long)]
        signed: bool,
    },
    /// Print the transaction ID of an unsigned transaction file.
    Id { file: PathBuf },
    /// Sign an unsigned transaction file.
    Sign(SignArgs),
}

/// Arguments for `txn pay`.
#[derive(Args, Debug)]
pub struct PayArgs {
    /// JSON file with suggested params (`fee`, `minFee`, `firstValid`, ...).
    #[arg(long)]
    pub params: PathBuf,

    /// Sender address.
    #[arg(long)]
    pub from: String,

    /// Receiver address.
    #[arg(long)]
    pub to: String,

    /// Amount in microunits.
    #[arg(long)]
    pub amount: u64,

    /// Close the sender's remaining balance to this address.
    #[arg(long)]
    pub close_to: Option<String>,

    /// UTF-8 note to attach.
    #[arg(long)]
    pub note: Option<String>,

    /// Where to write the unsigned transaction.
    #[arg(long)]
    pub out: PathBuf,
}

/// Arguments for `txn sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Unsigned transaction file.
    pub file: PathBuf,

    /// Where to write the signed envelope.
    #[arg(long)]
    pub out: PathBuf,

    /// Hex-encoded 32-byte seed or 64-byte secret key.
    ///
    /// Prefer the environment variable over the flag so the key stays out of
    /// shell history.
    #[arg(long, env = "ALGOTX_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,
}

#[derive(Subcommand, Debug)]
pub enum MsigCommand {
    /// Print the address of a multisig account.
    #[command(disable_version_flag = true)]
    Address {
        /// Multisig format version.
        #[arg(long, default_value_t = 1)]
        version: u8,
        #[arg(long)]
        threshold: u8,
        /// Member addresses, in order.
        #[arg(required = true)]
        addrs: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LsigCommand {
    /// Print the escrow address of a compiled program file.
    Address { program: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum AbiCommand {
    /// Print the hex selector of a method signature.
    Selector { signature: String },
    /// Print the JSON description of a method signature.
    Method { signature: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        AlgotxCli::command().debug_assert();
    }

    #[test]
    fn parses_nested_commands() {
        let cli = AlgotxCli::try_parse_from([
            "algotx", "msig", "address", "--threshold", "2", "A", "B",
        ])
        .unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Msig(MsigCommand::Address {
                version,
                threshold,
                addrs,
            }) => {
                assert_eq!(version, 1);
                assert_eq!(threshold, 2);
                assert_eq!(addrs, vec!["A", "B"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
