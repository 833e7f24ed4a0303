//! Chain connection from the merged configuration

use std::sync::Arc;

use worklock_agents::ContractAgency;
use worklock_chain::{ChainClient, ContractRegistry, RpcProvider, TesterChain};
use worklock_types::{checksum, Address};

use crate::config::WorklockConfig;
use crate::error::CliError;
use crate::options::{ProviderOptions, TransactingOptions};

/// Endpoint used by `--geth` when no provider is given
pub const LOCAL_GETH_URI: &str = "http://localhost:8545";

/// Shown before `--dev` commands that need an earlier bid
pub const DEV_CHAIN_NOTICE: &str =
    "--dev starts a fresh tester chain for every command, so no earlier bid exists; run `worklock simulate` for a whole round";

pub struct Connection {
    pub client: Arc<dyn ChainClient>,
    pub registry: Arc<ContractRegistry>,
    pub agency: ContractAgency,
    /// Set in development mode
    pub tester: Option<Arc<TesterChain>>,
}

impl Connection {
    /// Connect using `--dev` (in-process tester chain) or a JSON-RPC provider
    pub fn open(config: &WorklockConfig, options: &ProviderOptions) -> anyhow::Result<Self> {
        if options.dev {
            let tester = Arc::new(TesterChain::with_test_economics()?);
            let registry = match &config.registry_filepath {
                Some(path) => Arc::new(ContractRegistry::from_file(path)?),
                None => tester.registry(),
            };
            tracing::info!(registry = %registry.id(), "using development tester chain");
            let client: Arc<dyn ChainClient> = tester.clone();
            return Ok(Self {
                agency: ContractAgency::new(client.clone()),
                client,
                registry,
                tester: Some(tester),
            });
        }

        let uri = match (&config.provider_uri, options.geth) {
            (Some(uri), _) => uri.clone(),
            (None, true) => LOCAL_GETH_URI.to_string(),
            (None, false) => {
                return Err(CliError::configuration("--provider is required unless --dev or --geth is set").into())
            }
        };
        let path = config
            .registry_filepath
            .as_ref()
            .ok_or_else(|| CliError::configuration(format!("--registry-filepath is required for network {}", config.network)))?;
        let registry = Arc::new(ContractRegistry::from_file(path)?);

        tracing::info!(provider = %uri, network = %config.network, poa = config.poa, registry = %registry.id(), "connecting to provider");
        let client: Arc<dyn ChainClient> = Arc::new(RpcProvider::new(&uri)?);
        Ok(Self {
            agency: ContractAgency::new(client.clone()),
            client,
            registry,
            tester: None,
        })
    }

    /// Warning for commands that depend on state from an earlier invocation
    pub fn ephemeral_notice(&self) -> Option<&'static str> {
        self.tester.as_ref().map(|_| DEV_CHAIN_NOTICE)
    }

    /// The account transactions are sent from
    pub async fn transacting_account(&self, options: &TransactingOptions) -> anyhow::Result<Address> {
        if options.hw_wallet() {
            return Err(CliError::configuration(
                "hardware wallet signing is not available; the provider signs with its own accounts",
            )
            .into());
        }

        let accounts = self.client.accounts().await?;
        let account = match options.checksum_address {
            Some(address) if accounts.contains(&address) => address,
            Some(address) => {
                return Err(CliError::configuration(format!(
                    "account {} is not managed by the provider",
                    checksum(&address)
                ))
                .into())
            }
            None => match &self.tester {
                // The etherbase deploys; bid from the first funded bidder instead
                Some(tester) => tester
                    .unassigned_accounts()
                    .first()
                    .copied()
                    .ok_or_else(|| CliError::configuration("tester chain has no funded accounts"))?,
                None => accounts
                    .first()
                    .copied()
                    .ok_or_else(|| CliError::configuration("provider manages no accounts; pass --checksum-address"))?,
            },
        };
        Ok(account)
    }
}

/// Block explorer link for a transaction
pub fn etherscan_url(network: &str, tx_hash: &str) -> String {
    match network {
        "mainnet" => format!("https://etherscan.io/tx/{}", tx_hash),
        other => format!("https://{}.etherscan.io/tx/{}", other, tx_hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dev_connection_uses_tester_registry() {
        let connection = Connection::open(
            &WorklockConfig::default(),
            &ProviderOptions {
                dev: true,
                ..ProviderOptions::default()
            },
        )
        .unwrap();
        let tester = connection.tester.clone().unwrap();
        assert_eq!(connection.registry.id(), tester.registry().id());

        let account = connection
            .transacting_account(&TransactingOptions::default())
            .await
            .unwrap();
        assert_eq!(account, tester.unassigned_accounts()[0]);
        assert_eq!(connection.ephemeral_notice(), Some(DEV_CHAIN_NOTICE));
    }

    #[tokio::test]
    async fn test_dev_claim_has_no_earlier_bid() {
        let connection = Connection::open(
            &WorklockConfig::default(),
            &ProviderOptions {
                dev: true,
                ..ProviderOptions::default()
            },
        )
        .unwrap();
        let agent = connection
            .agency
            .get_agent::<worklock_agents::WorkLockAgent>(&connection.registry)
            .unwrap();
        let bidder = connection
            .transacting_account(&TransactingOptions::default())
            .await
            .unwrap();
        assert!(agent.get_deposited_eth(&bidder).await.unwrap().is_zero());
    }

    #[test]
    fn test_provider_required_without_dev() {
        let result = Connection::open(&WorklockConfig::default(), &ProviderOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_etherscan_urls() {
        assert_eq!(etherscan_url("mainnet", "0xab"), "https://etherscan.io/tx/0xab");
        assert_eq!(etherscan_url("goerli", "0xab"), "https://goerli.etherscan.io/tx/0xab");
    }
}
