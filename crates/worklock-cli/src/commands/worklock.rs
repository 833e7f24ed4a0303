//! WorkLock commands - bid, cancel, claim and status

use colored::*;
use dialoguer::Confirm;
use worklock_agents::{AgentError, ContractAgent, StakingEscrowAgent, WorkLockAgent};
use worklock_chain::TransactionRequest;
use worklock_types::{parse_amount, Address, TxReceipt};

use crate::config::WorklockConfig;
use crate::connect::{etherscan_url, Connection};
use crate::display;
use crate::options::TransactingOptions;

/// A WorkLock transaction ready to confirm and send
enum Action {
    Bid,
    CancelBid,
    Claim,
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Action::Bid => "Place bid",
            Action::CancelBid => "Cancel bid",
            Action::Claim => "Claim tokens",
        }
    }
}

/// Bid `value` ETH
pub async fn bid(
    connection: &Connection,
    config: &WorklockConfig,
    options: &TransactingOptions,
    value: &str,
) -> anyhow::Result<()> {
    let value = parse_amount(value)?;
    let agent = connection.agency.get_agent::<WorkLockAgent>(&connection.registry)?;
    let bidder = connection.transacting_account(options).await?;

    display::banner("Bid");
    display::field("Bidder", &display::address(&bidder));
    display::field("Value", &display::eth(value));

    let tx = agent.bid_transaction(&bidder, value)?;
    execute(connection, config, options, &agent, Action::Bid, tx, bidder).await
}

pub async fn cancel_bid(
    connection: &Connection,
    config: &WorklockConfig,
    options: &TransactingOptions,
) -> anyhow::Result<()> {
    let agent = connection.agency.get_agent::<WorkLockAgent>(&connection.registry)?;
    let bidder = connection.transacting_account(options).await?;

    display::banner("Cancel Bid");
    if let Some(notice) = connection.ephemeral_notice() {
        display::caution(notice);
    }
    display::field("Bidder", &display::address(&bidder));
    display::field("Refund", &display::eth(agent.get_deposited_eth(&bidder).await?));

    let tx = agent.cancel_bid_transaction(&bidder)?;
    execute(connection, config, options, &agent, Action::CancelBid, tx, bidder).await
}

pub async fn claim(
    connection: &Connection,
    config: &WorklockConfig,
    options: &TransactingOptions,
) -> anyhow::Result<()> {
    let agent = connection.agency.get_agent::<WorkLockAgent>(&connection.registry)?;
    let bidder = connection.transacting_account(options).await?;

    display::banner("Claim");
    if let Some(notice) = connection.ephemeral_notice() {
        display::caution(notice);
    }
    display::field("Bidder", &display::address(&bidder));
    let deposited = agent.get_deposited_eth(&bidder).await?;
    display::field("Deposited", &display::eth(deposited));
    display::field("Tokens", &display::nu(agent.eth_to_tokens(deposited).await?));

    let tx = agent.claim_transaction(&bidder)?;
    execute(connection, config, options, &agent, Action::Claim, tx, bidder).await
}

async fn execute(
    connection: &Connection,
    config: &WorklockConfig,
    options: &TransactingOptions,
    agent: &WorkLockAgent,
    action: Action,
    tx: TransactionRequest,
    bidder: Address,
) -> anyhow::Result<()> {
    if options.dry_run {
        display::notice("Dry run: nothing will be sent");
        display::field("To", &display::address(&tx.to));
        display::field("Value", &display::eth(tx.value));
        display::field("Calldata", &format!("0x{}", hex::encode(&tx.data)));
        return Ok(());
    }

    if !options.force {
        let proceed = Confirm::new()
            .with_prompt(format!("{} from {}?", action.describe(), display::address(&bidder)))
            .default(false)
            .interact()?;
        if !proceed {
            display::caution("Aborted");
            return Ok(());
        }
    }

    let result = match action {
        Action::Bid => agent.bid(&bidder, tx.value).await,
        Action::CancelBid => agent.cancel_bid(&bidder).await,
        Action::Claim => agent.claim(&bidder).await,
    };

    match result {
        Ok(receipt) => {
            display::confirmed(&format!("{} succeeded", action.describe()));
            report(config, options, &receipt);
            if matches!(action, Action::Claim) {
                let staking = connection
                    .agency
                    .get_agent::<StakingEscrowAgent>(&connection.registry)?;
                display::field("Locked (next period)", &display::nu(staking.get_locked_tokens(&bidder, 1).await?));
            }
            Ok(())
        }
        Err(AgentError::TransactionReverted { reason, receipt }) => {
            display::reverted(&format!("{} reverted: {}", action.describe(), reason));
            if let Some(receipt) = &receipt {
                report(config, options, receipt);
            }
            Err(AgentError::TransactionReverted { reason, receipt }.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn report(config: &WorklockConfig, options: &TransactingOptions, receipt: &TxReceipt) {
    display::receipt(receipt);
    if options.etherscan() {
        display::field("Etherscan", &etherscan_url(&config.network, &receipt.tx_hash_hex()));
    }
}

/// Auction state, and a bidder's position when an address is known
pub async fn status(connection: &Connection, staker: Option<Address>) -> anyhow::Result<()> {
    let worklock = connection.agency.get_agent::<WorkLockAgent>(&connection.registry)?;
    let staking = connection
        .agency
        .get_agent::<StakingEscrowAgent>(&connection.registry)?;

    display::banner("Status");
    let start = worklock.start_bid_date().await?;
    let end = worklock.end_bid_date().await?;
    display::field("Contract", &display::address(&worklock.contract_address()));
    display::field("Bidding opens", &format_timestamp(start));
    display::field("Bidding closes", &format_timestamp(end));
    let open = worklock.bidding_window_open().await?;
    display::field("Window", if open { "open" } else { "closed" });
    display::field("ETH supply", &display::eth(worklock.eth_supply().await?));
    display::field("Token supply", &display::nu(worklock.token_supply().await?));
    display::field("Current period", &staking.get_current_period().await?.to_string());

    if let Some(staker) = staker {
        println!();
        println!("  {}", display::address(&staker).bright_white().bold());
        display::field("Deposited", &display::eth(worklock.get_deposited_eth(&staker).await?));
        display::field("Remaining work", &worklock.get_remaining_work(&staker).await?.to_string());
        display::field("Claimed", &worklock.is_claimed(&staker).await?.to_string());
        display::field("Locked (next period)", &display::nu(staking.get_locked_tokens(&staker, 1).await?));
        display::field("All tokens", &display::nu(staking.get_all_tokens(&staker).await?));
    }
    Ok(())
}

fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProviderOptions;

    fn dev_connection() -> Connection {
        Connection::open(
            &WorklockConfig::default(),
            &ProviderOptions {
                dev: true,
                ..ProviderOptions::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_status_reports_contract_and_staker() {
        let connection = dev_connection();
        let staker = connection.tester.as_ref().unwrap().unassigned_accounts()[0];
        status(&connection, Some(staker)).await.unwrap();
        status(&connection, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_dry_run_bid_sends_nothing() {
        let connection = dev_connection();
        let options = TransactingOptions {
            dry_run: true,
            ..TransactingOptions::default()
        };
        bid(&connection, &WorklockConfig::default(), &options, "1.5")
            .await
            .unwrap();

        let agent = connection
            .agency
            .get_agent::<WorkLockAgent>(&connection.registry)
            .unwrap();
        assert!(agent.eth_supply().await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_bid_rejects_malformed_value() {
        let connection = dev_connection();
        let options = TransactingOptions {
            dry_run: true,
            ..TransactingOptions::default()
        };
        assert!(bid(&connection, &WorklockConfig::default(), &options, "1e18")
            .await
            .is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(u64::MAX), u64::MAX.to_string());
    }
}
