//! # Structured Logging
//!
//! Sets up the `tracing` subscriber for the node. Ledger mutations are
//! audited by `campus-contracts` with structured fields (`op`, `kind`,
//! ids, addresses); in JSON mode those fields are flattened onto each line
//! so a log shipper can index rejections by error kind directly.
//!
//! Output goes to stderr; stdout is reserved for `init` and `version`.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor `log_level` is set: the three
/// campus crates at info, HTTP request spans at info.
pub const DEFAULT_FILTER: &str =
    "campus_node=info,campus_contracts=info,campus_protocol=info,tower_http=info";

/// Log output format, as written in `config.toml` (`"pretty"` / `"json"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines for a terminal.
    #[default]
    Pretty,
    /// One JSON object per event with fields at the top level.
    Json,
}

impl LogFormat {
    /// Parses a `--log-format` flag value. Anything other than "json" is pretty.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Installs the global subscriber. Call once, before the ledger is opened;
/// a second call panics.
///
/// `RUST_LOG` wins over `filter`.
pub fn init_logging(filter: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(false)
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }

    tracing::debug!(?format, filter, "logging initialized");
}
