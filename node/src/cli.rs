//! # CLI Interface
//!
//! Defines the command-line argument structure for `campus-node` using
//! `clap` derive. Supports three subcommands: `run`, `init` and `version`.
//!
//! Every `run` flag is optional so that values from the config file can
//! fill the gaps; see [`crate::config::NodeConfig::apply_overrides`].

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Campus ledger node.
///
/// Hosts the identity, fee, enrollment and reward ledgers behind a
/// JSON-RPC, REST and WebSocket API, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "campus-node",
    about = "Campus credential and reward ledger node",
    version,
    propagate_version = true
)]
pub struct CampusNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the campus node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Create the data directory and write a default `config.toml`.
    Init(InitArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Path to the node configuration file (TOML).
    ///
    /// When omitted, the node looks for `config.toml` in the data directory.
    #[arg(long, short = 'c', env = "CAMPUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the ledger snapshot database.
    #[arg(long, short = 'd', env = "CAMPUS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Administrator address. Only used when no snapshot exists yet.
    #[arg(long, env = "CAMPUS_ADMIN")]
    pub admin: Option<String>,

    /// Treasury address that receives fee payments. Only used when no
    /// snapshot exists yet.
    #[arg(long, env = "CAMPUS_TREASURY")]
    pub treasury: Option<String>,

    /// Port for the JSON-RPC, REST and WebSocket API.
    #[arg(long, env = "CAMPUS_RPC_PORT")]
    pub rpc_port: Option<u16>,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CAMPUS_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "CAMPUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "CAMPUS_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Directory of exported metadata documents used by the amenity check.
    #[arg(long, env = "CAMPUS_METADATA_DIR")]
    pub metadata_dir: Option<PathBuf>,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "CAMPUS_DATA_DIR", default_value = "./campus-data")]
    pub data_dir: PathBuf,

    /// Administrator address written into the generated config.
    #[arg(long, env = "CAMPUS_ADMIN")]
    pub admin: String,

    /// Treasury address written into the generated config.
    #[arg(long, env = "CAMPUS_TREASURY")]
    pub treasury: String,

    /// Overwrite an existing `config.toml`.
    #[arg(long)]
    pub force: bool,
}
