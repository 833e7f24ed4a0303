//! CLI configuration
//!
//! Sources, lowest precedence first: built-in defaults, the config file
//! (`--config-file`, or `worklock.toml` under the config root), then
//! `WORKLOCK__*` environment variables. Command-line flags are applied on
//! top by the commands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::options::{NodeOptions, ProviderOptions};

pub const CONFIG_FILENAME: &str = "worklock.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorklockConfig {
    /// Network domain name
    pub network: String,

    /// JSON-RPC endpoint of the provider node
    pub provider_uri: Option<String>,

    /// Contract registry JSON file
    pub registry_filepath: Option<PathBuf>,

    /// The chain uses proof-of-authority consensus
    pub poa: bool,

    pub node: NodeConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub controller_port: u16,
    pub discovery_port: u16,
    pub db_filepath: Option<PathBuf>,
    pub federated_only: bool,
    pub teacher_uri: Option<String>,
    /// Minimum stake a teacher must hold, in NU
    pub min_stake: u64,
    pub light: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            controller_port: 8151,
            discovery_port: 9151,
            db_filepath: None,
            federated_only: false,
            teacher_uri: None,
            min_stake: 0,
            light: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl WorklockConfig {
    /// Merge defaults, the config file and the environment
    pub fn load(config_file: Option<&Path>, config_root: Option<&Path>) -> Result<Self, CliError> {
        let mut builder = config::Config::builder();

        match config_file {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(root) = config_root.map(Path::to_path_buf).or_else(default_config_root) {
                    builder = builder.add_source(
                        config::File::from(root.join(CONFIG_FILENAME)).required(false),
                    );
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("WORKLOCK")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: WorklockConfig = builder.build()?.try_deserialize()?;
        if loaded.network.is_empty() {
            loaded.network = default_network();
        }
        Ok(loaded)
    }

    /// Apply provider flags; set flags win over configured values
    pub fn apply_provider(&mut self, options: &ProviderOptions) {
        if let Some(uri) = &options.provider_uri {
            self.provider_uri = Some(uri.clone());
        }
        if let Some(network) = &options.network {
            self.network = network.clone();
        }
        if let Some(path) = &options.registry_filepath {
            self.registry_filepath = Some(path.clone());
        }
        self.poa |= options.poa;
        self.node.light |= options.light;
    }

    pub fn apply_node(&mut self, options: &NodeOptions) {
        if let Some(port) = options.controller_port {
            self.node.controller_port = port;
        }
        if let Some(port) = options.discovery_port {
            self.node.discovery_port = port;
        }
        if let Some(path) = &options.db_filepath {
            self.node.db_filepath = Some(path.clone());
        }
        if let Some(teacher) = &options.teacher_uri {
            self.node.teacher_uri = Some(teacher.clone());
        }
        if let Some(min_stake) = options.min_stake {
            self.node.min_stake = min_stake;
        }
        self.node.federated_only |= options.federated_only;
    }
}

/// `<config dir>/worklock`
pub fn default_config_root() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("worklock"))
}

fn default_network() -> String {
    "mainnet".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("worklock-config-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILENAME);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_file_values_override_defaults() {
        let path = write_config(
            "file",
            r#"
network = "ibex"
provider_uri = "http://localhost:8545"

[node]
controller_port = 9000
federated_only = true

[logging]
format = "json"
"#,
        );

        let config = WorklockConfig::load(Some(&path), None).unwrap();
        assert_eq!(config.network, "ibex");
        assert_eq!(config.provider_uri.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.node.controller_port, 9000);
        assert_eq!(config.node.discovery_port, 9151);
        assert!(config.node.federated_only);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_root_without_file_uses_defaults() {
        let root = std::env::temp_dir().join(format!("worklock-empty-root-{}", std::process::id()));
        let config = WorklockConfig::load(None, Some(&root)).unwrap();
        assert_eq!(config.network, "mainnet");
        assert_eq!(config.node.controller_port, 8151);
    }

    #[test]
    fn test_malformed_file_is_a_configuration_error() {
        let path = write_config("malformed", "[node\ncontroller_port = ");
        assert!(matches!(
            WorklockConfig::load(Some(&path), None),
            Err(CliError::Configuration { .. })
        ));
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = WorklockConfig::default();
        config.apply_provider(&ProviderOptions {
            provider_uri: Some("http://node:8545".to_string()),
            poa: true,
            ..ProviderOptions::default()
        });
        config.apply_node(&NodeOptions {
            discovery_port: Some(10151),
            min_stake: Some(15000),
            ..NodeOptions::default()
        });

        assert_eq!(config.provider_uri.as_deref(), Some("http://node:8545"));
        assert!(config.poa);
        assert_eq!(config.node.discovery_port, 10151);
        assert_eq!(config.node.min_stake, 15000);
    }
}
