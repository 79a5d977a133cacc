//! # CLI Interface
//!
//! Defines the command-line argument structure for `notary-node` using
//! `clap` derive. Supports four subcommands: `run`, `keygen`, `sign`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use notary_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT, DEFAULT_VALIDATION_WINDOW};

/// Star notary node.
///
/// Serves a single tamper-evident ledger over HTTP. Wallets prove they own
/// an address by signing a short challenge before their records are
/// accepted.
#[derive(Parser, Debug)]
#[command(
    name = "notary-node",
    about = "Star notary ledger node",
    version,
    propagate_version = true
)]
pub struct NotaryNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the notary node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Generate a fresh wallet keypair and print it.
    Keygen,
    /// Sign an ownership challenge with a wallet secret key.
    Sign(SignArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory for the sled block store.
    ///
    /// When omitted the ledger lives in memory only and is lost on exit.
    #[arg(long, short = 'd', env = "NOTARY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Port for the REST API.
    #[arg(long, env = "NOTARY_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "NOTARY_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Seconds a signed ownership challenge stays acceptable.
    #[arg(long, env = "NOTARY_VALIDATION_WINDOW", default_value_t = DEFAULT_VALIDATION_WINDOW.as_secs())]
    pub validation_window: u64,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "NOTARY_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `sign` subcommand.
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Hex-encoded Ed25519 secret key.
    ///
    /// **Never pass this flag on a shared machine**; prefer the env var.
    #[arg(long, env = "NOTARY_SECRET_KEY")]
    pub secret_key: String,

    /// The challenge message returned by `/requestValidation`.
    #[arg(long)]
    pub message: String,
}
