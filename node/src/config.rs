//! # Node Configuration
//!
//! TOML-backed settings for `campus-node run`. Every field has a serde
//! default, so an empty file is valid; CLI flags and `CAMPUS_*` variables
//! are layered on top with [`NodeConfig::apply_overrides`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use campus_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};
use campus_protocol::types::Address;

use crate::cli::RunArgs;
use crate::logging::{LogFormat, DEFAULT_FILTER};

/// File name looked up in the data directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("{0} address must be set and non-null")]
    MissingAddress(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Administrator address for a fresh ledger.
    #[serde(default)]
    pub admin: String,

    /// Treasury address for a fresh ledger.
    #[serde(default)]
    pub treasury: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Exported metadata documents for the amenity check. Defaults to
    /// `<data_dir>/metadata` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_dir: Option<PathBuf>,
}

// -- Serde default helpers ---------------------------------------------------

fn default_data_dir() -> PathBuf {
    PathBuf::from("./campus-data")
}

fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_metrics_port() -> u16 {
    DEFAULT_METRICS_PORT
}

fn default_log_level() -> String {
    DEFAULT_FILTER.to_string()
}

// -- Impl --------------------------------------------------------------------

impl NodeConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads the file named by `--config`, else `<data_dir>/config.toml` if
    /// it exists, else defaults; then applies the CLI overrides.
    pub fn load(args: &RunArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_toml_file(path)?,
            None => {
                let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
                let candidate = data_dir.join(CONFIG_FILE_NAME);
                if candidate.exists() {
                    Self::from_toml_file(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(args);
        Ok(config)
    }

    /// Flags that were given win over file values.
    pub fn apply_overrides(&mut self, args: &RunArgs) {
        if let Some(v) = &args.admin {
            self.admin = v.clone();
        }
        if let Some(v) = &args.treasury {
            self.treasury = v.clone();
        }
        if let Some(v) = &args.data_dir {
            self.data_dir = v.clone();
        }
        if let Some(v) = args.rpc_port {
            self.rpc_port = v;
        }
        if let Some(v) = args.metrics_port {
            self.metrics_port = v;
        }
        if let Some(v) = &args.log_level {
            self.log_level = v.clone();
        }
        if let Some(v) = &args.log_format {
            self.log_format = LogFormat::from_str_lossy(v);
        }
        if let Some(v) = &args.metadata_dir {
            self.metadata_dir = Some(v.clone());
        }
    }

    pub fn admin_address(&self) -> Result<Address, ConfigError> {
        non_null(&self.admin, "admin")
    }

    pub fn treasury_address(&self) -> Result<Address, ConfigError> {
        non_null(&self.treasury, "treasury")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("db")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.metadata_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("metadata"))
    }
}

fn non_null(raw: &str, what: &'static str) -> Result<Address, ConfigError> {
    let address = Address::new(raw.trim());
    if address.is_null() {
        return Err(ConfigError::MissingAddress(what));
    }
    Ok(address)
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            admin: String::new(),
            treasury: String::new(),
            data_dir: default_data_dir(),
            rpc_port: default_rpc_port(),
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metadata_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig {
            admin: "0xadmin".into(),
            treasury: "0xtreasury".into(),
            ..NodeConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, DEFAULT_RPC_PORT);
        assert_eq!(config.metrics_port, DEFAULT_METRICS_PORT);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.admin.is_empty());
    }

    #[test]
    fn cli_flags_override_file_values() {
        let mut config = NodeConfig::from_toml_str(
            r#"
            admin = "0xfile"
            rpc_port = 7000
        "#,
        )
        .unwrap();
        let args = RunArgs {
            admin: Some("0xflag".into()),
            log_format: Some("json".into()),
            ..RunArgs::default()
        };
        config.apply_overrides(&args);
        assert_eq!(config.admin, "0xflag");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.rpc_port, 7000);
    }

    #[test]
    fn null_admin_is_rejected() {
        let config = NodeConfig {
            admin: "0x0000000000000000000000000000000000000000".into(),
            ..NodeConfig::default()
        };
        assert!(matches!(
            config.admin_address(),
            Err(ConfigError::MissingAddress("admin"))
        ));
        assert!(matches!(
            NodeConfig::default().treasury_address(),
            Err(ConfigError::MissingAddress("treasury"))
        ));
    }

    #[test]
    fn config_file_in_data_dir_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "rpc_port = 9100\n").unwrap();
        let args = RunArgs {
            data_dir: Some(dir.path().to_path_buf()),
            ..RunArgs::default()
        };
        let config = NodeConfig::load(&args).unwrap();
        assert_eq!(config.rpc_port, 9100);
        assert_eq!(config.data_dir, dir.path());
    }

    #[test]
    fn missing_explicit_file_is_read_error() {
        let args = RunArgs {
            config: Some(PathBuf::from("/nonexistent/campus.toml")),
            ..RunArgs::default()
        };
        assert!(matches!(
            NodeConfig::load(&args),
            Err(ConfigError::Read { .. })
        ));
    }
}
