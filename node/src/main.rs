// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Star Notary Node
//!
//! Entry point for the `notary-node` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the ledger, and serves the HTTP
//! API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     - start the node
//! - `keygen`  - generate a wallet keypair
//! - `sign`    - sign an ownership challenge
//! - `version` - print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use notary_protocol::crypto::keys::NotaryKeypair;
use notary_protocol::crypto::signatures::sign_challenge;
use notary_protocol::{ChainConfig, Ledger, LedgerDb};

use cli::{Commands, NotaryNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = NotaryNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen => {
            generate_keypair();
            Ok(())
        }
        Commands::Sign(args) => sign_message(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: ledger, API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        logging::DEFAULT_DIRECTIVES,
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        validation_window = args.validation_window,
        "starting notary-node"
    );

    let config =
        ChainConfig::default().with_validation_window(Duration::from_secs(args.validation_window));

    // --- Ledger ---
    let ledger = match &args.data_dir {
        Some(data_dir) => {
            let db_path = data_dir.join("db");
            std::fs::create_dir_all(&db_path).with_context(|| {
                format!("failed to create database directory: {}", db_path.display())
            })?;
            let db = LedgerDb::open(&db_path)
                .with_context(|| format!("failed to open database at {}", db_path.display()))?;
            tracing::info!(path = %db_path.display(), "database opened");
            Ledger::open(config, db).context("failed to restore ledger from database")?
        }
        None => {
            tracing::warn!("no --data-dir given, ledger is in memory only");
            Ledger::new(config)
        }
    };

    // --- Metrics ---
    let node_metrics =
        Arc::new(NodeMetrics::new().context("failed to create prometheus registry")?);
    node_metrics.chain_height.set(ledger.height());
    node_metrics
        .integrity_findings
        .set(ledger.validate_chain().len() as i64);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            notary_protocol::config::PROTOCOL_VERSION,
        ),
        ledger,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("notary-node stopped");
    Ok(())
}

/// Prints a fresh wallet keypair. The address is the hex public key.
fn generate_keypair() {
    let keypair = NotaryKeypair::generate();
    println!("secret_key: {}", keypair.secret_key_hex());
    println!("address:    {}", keypair.address());
}

/// Signs `args.message` and prints the hex signature.
fn sign_message(args: cli::SignArgs) -> Result<()> {
    let keypair =
        NotaryKeypair::from_hex(args.secret_key.trim()).context("invalid secret key")?;
    println!("{}", sign_challenge(&keypair, &args.message));
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("notary-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", notary_protocol::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler can't be
/// installed, that branch never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
