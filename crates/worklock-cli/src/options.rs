//! Option groups shared by the commands
//!
//! Each group is a struct flattened into the commands that need it, so a
//! handler receives the whole group as one typed value.

use std::path::PathBuf;

use clap::Args;
use worklock_types::{parse_checksum_address, Address, ValidationError};

use crate::error::CliError;

/// `--config-file` / `--config-root`
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOptions {
    /// Path to configuration file
    #[arg(long, global = true, value_parser = existing_file)]
    pub config_file: Option<PathBuf>,

    /// Custom configuration directory
    #[arg(long, global = true)]
    pub config_root: Option<PathBuf>,
}

/// How to reach the chain
#[derive(Debug, Clone, Default, Args)]
pub struct ProviderOptions {
    /// Blockchain provider's URI i.e. 'http://localhost:8545'
    #[arg(long = "provider")]
    pub provider_uri: Option<String>,

    /// Network domain name
    #[arg(long)]
    pub network: Option<String>,

    /// Custom contract registry filepath
    #[arg(long, value_parser = existing_file)]
    pub registry_filepath: Option<PathBuf>,

    /// Inject POA middleware
    #[arg(long)]
    pub poa: bool,

    /// Run using the built-in geth node
    #[arg(long, short = 'G')]
    pub geth: bool,

    /// Enable development mode (a fresh in-process tester chain per invocation)
    #[arg(long, short = 'd')]
    pub dev: bool,

    /// Indicate that node is light
    #[arg(long)]
    pub light: bool,
}

/// Options of commands that send transactions
#[derive(Debug, Clone, Default, Args)]
pub struct TransactingOptions {
    /// Run with a specified account
    #[arg(long, value_parser = parse_checksum_address)]
    pub checksum_address: Option<Address>,

    /// Don't ask for confirmation
    #[arg(long)]
    pub force: bool,

    /// Print the transaction without sending it
    #[arg(long, short = 'x')]
    pub dry_run: bool,

    /// Enable viewing TX in Etherscan
    #[arg(long, overrides_with = "no_etherscan")]
    pub(crate) etherscan: bool,

    /// Disable viewing TX in Etherscan
    #[arg(long, overrides_with = "etherscan")]
    pub(crate) no_etherscan: bool,

    /// Sign with a hardware wallet
    #[arg(long, overrides_with = "no_hw_wallet")]
    pub(crate) hw_wallet: bool,

    #[arg(long, overrides_with = "hw_wallet")]
    pub(crate) no_hw_wallet: bool,
}

impl TransactingOptions {
    pub fn etherscan(&self) -> bool {
        self.etherscan && !self.no_etherscan
    }

    pub fn hw_wallet(&self) -> bool {
        self.hw_wallet && !self.no_hw_wallet
    }
}

/// Node settings
#[derive(Debug, Clone, Default, Args)]
pub struct NodeOptions {
    /// The host port to run HTTP controller services on
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub controller_port: Option<u16>,

    /// The host port to run node discovery services on
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub discovery_port: Option<u16>,

    /// The database filepath to connect to
    #[arg(long)]
    pub db_filepath: Option<PathBuf>,

    /// Connect only to federated nodes
    #[arg(long, short = 'F')]
    pub federated_only: bool,

    /// A node URI to start learning from (seednode)
    #[arg(long = "teacher")]
    pub teacher_uri: Option<String>,

    /// The minimum stake the teacher must have to be a teacher
    #[arg(long)]
    pub min_stake: Option<u64>,
}

/// Policy settings
#[derive(Debug, Clone, Default, Args)]
pub struct PolicyOptions {
    /// The label for a policy
    #[arg(long)]
    pub label: Option<String>,

    /// The message kit unicode string encoded in base64
    #[arg(long)]
    pub message_kit: Option<String>,

    /// M-Threshold KFrags
    #[arg(long = "m")]
    pub m: Option<u32>,

    /// N-Total KFrags
    #[arg(long = "n")]
    pub n: Option<u32>,

    /// Encrypting public key for the policy as a hexadecimal string
    #[arg(long)]
    pub policy_encrypting_key: Option<String>,
}

/// A policy group whose required fields are present and consistent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyParameters {
    pub label: String,
    pub m: u32,
    pub n: u32,
    pub policy_encrypting_key: Vec<u8>,
    pub message_kit: Option<String>,
}

impl PolicyOptions {
    pub fn validate(&self) -> Result<PolicyParameters, CliError> {
        let label = required(&self.label, "--label")?.clone();
        let m = *required(&self.m, "--m")?;
        let n = *required(&self.n, "--n")?;
        if m == 0 || n == 0 {
            return Err(CliError::configuration("--m and --n must be positive"));
        }
        if m > n {
            return Err(CliError::configuration(format!(
                "threshold --m {} exceeds total --n {}",
                m, n
            )));
        }

        let key = required(&self.policy_encrypting_key, "--policy-encrypting-key")?;
        let digits = key.strip_prefix("0x").unwrap_or(key);
        let policy_encrypting_key = hex::decode(digits).map_err(|e| ValidationError::InvalidHex {
            input: key.clone(),
            reason: e.to_string(),
        })?;

        Ok(PolicyParameters {
            label,
            m,
            n,
            policy_encrypting_key,
            message_kit: self.message_kit.clone(),
        })
    }
}

fn required<'a, T>(value: &'a Option<T>, name: &str) -> Result<&'a T, CliError> {
    value
        .as_ref()
        .ok_or_else(|| CliError::configuration(format!("{} is required", name)))
}

fn existing_file(input: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(input);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{} is not a readable file", input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(m: Option<u32>, n: Option<u32>, key: Option<&str>) -> PolicyOptions {
        PolicyOptions {
            label: Some("worklock-docs".to_string()),
            message_kit: None,
            m,
            n,
            policy_encrypting_key: key.map(str::to_string),
        }
    }

    #[test]
    fn test_policy_validation() {
        let valid = policy(Some(2), Some(3), Some("0x02abcdef")).validate().unwrap();
        assert_eq!(valid.policy_encrypting_key, vec![0x02, 0xab, 0xcd, 0xef]);

        assert!(matches!(
            policy(Some(4), Some(3), Some("02")).validate(),
            Err(CliError::Configuration { .. })
        ));
        assert!(policy(Some(0), Some(3), Some("02")).validate().is_err());
        assert!(policy(None, Some(3), Some("02")).validate().is_err());
        assert!(matches!(
            policy(Some(1), Some(1), Some("zz")).validate(),
            Err(CliError::Validation(_))
        ));
    }

    #[test]
    fn test_toggle_pairs() {
        let mut options = TransactingOptions::default();
        assert!(!options.etherscan());
        options.etherscan = true;
        assert!(options.etherscan());
        options.no_etherscan = true;
        assert!(!options.etherscan());
    }
}
