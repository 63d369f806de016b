// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Campus Ledger Node
//!
//! Entry point for the `campus-node` binary. Parses CLI arguments, loads
//! configuration, restores (or creates) the ledger from its snapshot store
//! and serves the HTTP/WS API plus the Prometheus endpoint.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the node
//! - `init`    — create a data directory with a default `config.toml`
//! - `version` — print build version information

mod api;
mod cli;
mod config;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{broadcast, RwLock};

use campus_contracts::Campus;
use campus_protocol::config::{EVENT_CHANNEL_CAPACITY, PROTOCOL_VERSION};
use campus_protocol::metadata::DirectoryResolver;
use campus_protocol::storage::LedgerStore;

use cli::{CampusNodeCli, Commands};
use config::{NodeConfig, CONFIG_FILE_NAME};
use logging::LogFormat;
use metrics::LedgerMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CampusNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: restores the ledger, then serves the API and metrics
/// endpoints until a shutdown signal arrives.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    let config = NodeConfig::load(&args).context("failed to load configuration")?;
    logging::init_logging(&config.log_level, config.log_format);

    tracing::info!(
        rpc_port = config.rpc_port,
        metrics_port = config.metrics_port,
        data_dir = %config.data_dir.display(),
        "starting campus-node"
    );

    // --- Snapshot store ---
    let db_path = config.db_path();
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let store = LedgerStore::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "database opened");

    let campus = restore_or_create(&store, &config)?;

    // --- Metrics ---
    let ledger_metrics = Arc::new(LedgerMetrics::new());
    ledger_metrics.observe(&campus.stats());

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Metadata ---
    let metadata_dir = config.metadata_path();
    tracing::info!(path = %metadata_dir.display(), "resolving receipt metadata from directory");

    // --- Application state ---
    let app_state = api::AppState {
        version: format!("{} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION),
        campus: Arc::new(RwLock::new(campus)),
        store,
        event_tx,
        metrics: Arc::clone(&ledger_metrics),
        resolver: Arc::new(DirectoryResolver::new(metadata_dir)),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", config.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&ledger_metrics));
    let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
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

    tracing::info!("campus-node stopped");
    Ok(())
}

/// Loads the persisted ledger, or creates and persists a fresh one from
/// the configured administrator and treasury.
fn restore_or_create(store: &LedgerStore, config: &NodeConfig) -> Result<Campus> {
    if let Some(campus) = store
        .load::<Campus>()
        .context("failed to load ledger snapshot")?
    {
        let written_by = store.snapshot_version()?.unwrap_or_else(|| "unknown".into());
        if written_by != PROTOCOL_VERSION {
            tracing::warn!(
                snapshot = %written_by,
                running = PROTOCOL_VERSION,
                "snapshot was written by a different protocol version"
            );
        }
        if !config.admin.is_empty() && config.admin != campus.admin().as_str() {
            tracing::warn!(
                configured = %config.admin,
                persisted = %campus.admin(),
                "ignoring configured admin; the snapshot's administrator is authoritative"
            );
        }
        tracing::info!(
            admin = %campus.admin(),
            digest = %campus.state_digest().unwrap_or_default(),
            "ledger restored from snapshot"
        );
        return Ok(campus);
    }

    let admin = config.admin_address()?;
    let treasury = config.treasury_address()?;
    let campus = Campus::new(admin, treasury).context("failed to create ledger")?;
    store
        .save(&campus)
        .context("failed to write genesis snapshot")?;
    tracing::info!(admin = %campus.admin(), "fresh ledger created");
    Ok(campus)
}

/// Creates the data directory and writes a `config.toml` for it.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), "initializing node");

    let config = NodeConfig {
        admin: args.admin.clone(),
        treasury: args.treasury.clone(),
        data_dir: data_dir.clone(),
        ..NodeConfig::default()
    };
    config.admin_address()?;
    config.treasury_address()?;

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let config_path = data_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            config_path.display()
        );
    }
    std::fs::write(&config_path, config.to_toml_string()?)
        .with_context(|| format!("failed to write config to {}", config_path.display()))?;
    std::fs::create_dir_all(config.metadata_path())?;

    tracing::info!(path = %config_path.display(), "configuration written");

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Config         : {}", config_path.display());
    println!("  Administrator  : {}", config.admin);
    println!("  Treasury       : {}", config.treasury);

    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("campus-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
