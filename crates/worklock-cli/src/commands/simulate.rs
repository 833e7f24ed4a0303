//! Simulate a full WorkLock round on a tester chain

use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use worklock_agents::{AgentError, ContractAgency, StakingEscrowAgent, WorkLockAgent};
use worklock_chain::{TesterChain, TesterConfig};
use worklock_types::{ether, Address, U256};

use crate::display;

/// What happened to one simulated bidder
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    /// Bid placed, not settled yet
    Bidding,
    Claimed(U256),
    Cancelled,
    /// The bid itself was rejected
    BidReverted(String),
    CancelReverted(String),
    ClaimReverted(String),
}

struct Row {
    bidder: Address,
    deposited: U256,
    work: U256,
    outcome: Outcome,
}

impl Row {
    fn is_open(&self) -> bool {
        self.outcome == Outcome::Bidding
    }
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Bidding => "unsettled".to_string(),
        Outcome::Claimed(tokens) => display::nu(*tokens).bright_cyan().to_string(),
        Outcome::Cancelled => "cancelled".yellow().to_string(),
        Outcome::BidReverted(reason) => format!("bid reverted: {}", reason).bright_red().to_string(),
        Outcome::CancelReverted(reason) => format!("cancel reverted: {}", reason).bright_red().to_string(),
        Outcome::ClaimReverted(reason) => format!("claim reverted: {}", reason).bright_red().to_string(),
    }
}

/// Reverts become table rows; anything else aborts the run
fn revert_reason(error: AgentError) -> anyhow::Result<String> {
    match error {
        AgentError::TransactionReverted { reason, .. } => Ok(reason),
        other => Err(other.into()),
    }
}

/// Bidder `i` bids `(i + 1) * base_bid` ETH; bidder `cancel` cancels before
/// the window closes; everyone else claims once it has.
pub async fn run_simulation(bidders: u32, base_bid: u64, cancel: Option<usize>) -> anyhow::Result<()> {
    let round = simulate_round(bidders, base_bid, cancel).await?;
    print_table(&round.rows);
    display::field("ETH supply", &display::eth(round.eth_supply));
    display::field("Token supply", &display::nu(round.token_supply));
    display::confirmed("Simulation complete");
    Ok(())
}

struct Round {
    rows: Vec<Row>,
    eth_supply: U256,
    token_supply: U256,
}

async fn simulate_round(bidders: u32, base_bid: u64, cancel: Option<usize>) -> anyhow::Result<Round> {
    display::banner("Simulation");

    let chain = Arc::new(TesterChain::new(TesterConfig {
        unassigned_accounts: bidders,
        ..TesterConfig::default()
    })?);
    let registry = chain.registry();
    let agency = ContractAgency::new(chain.clone());
    let worklock = agency.get_agent::<WorkLockAgent>(&registry)?;
    let staking = agency.get_agent::<StakingEscrowAgent>(&registry)?;
    let accounts = chain.unassigned_accounts().to_vec();

    let pb = ProgressBar::new(accounts.len() as u64 * 2 + 2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );

    let mut rows = Vec::with_capacity(accounts.len());
    for (multiplier, bidder) in (1u64..).zip(accounts.iter()) {
        pb.set_message(format!("bidding from {}", display::address(bidder)));
        let value = ether(base_bid) * multiplier;
        let row = match worklock.bid(bidder, value).await {
            Ok(_) => Row {
                bidder: *bidder,
                deposited: value,
                work: worklock.get_remaining_work(bidder).await?,
                outcome: Outcome::Bidding,
            },
            Err(e) => Row {
                bidder: *bidder,
                deposited: U256::zero(),
                work: U256::zero(),
                outcome: Outcome::BidReverted(revert_reason(e)?),
            },
        };
        rows.push(row);
        pb.inc(1);
    }

    if let Some(index) = cancel.filter(|i| *i < accounts.len()) {
        if rows[index].is_open() {
            pb.set_message("cancelling one bid");
            rows[index].outcome = match worklock.cancel_bid(&accounts[index]).await {
                Ok(_) => Outcome::Cancelled,
                Err(e) => Outcome::CancelReverted(revert_reason(e)?),
            };
        }
    }
    pb.inc(1);

    pb.set_message("closing the bidding window");
    chain.time_travel(chain.economics().bidding_duration + 1).await;
    pb.inc(1);

    for row in rows.iter_mut() {
        pb.set_message(format!("claiming for {}", display::address(&row.bidder)));
        if row.is_open() {
            row.work = worklock.get_remaining_work(&row.bidder).await?;
            row.outcome = match worklock.claim(&row.bidder).await {
                Ok(_) => Outcome::Claimed(staking.get_locked_tokens(&row.bidder, 1).await?),
                Err(e) => Outcome::ClaimReverted(revert_reason(e)?),
            };
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    Ok(Round {
        rows,
        eth_supply: worklock.eth_supply().await?,
        token_supply: worklock.token_supply().await?,
    })
}

fn print_table(rows: &[Row]) {
    println!();
    println!(
        "  {:<42} {:>18} {:>28} {:>26}",
        "Bidder".bright_white().bold(),
        "Deposit".bright_white().bold(),
        "Outcome".bright_white().bold(),
        "Work owed".bright_white().bold()
    );
    for row in rows {
        println!(
            "  {:<42} {:>18} {:>28} {:>26}",
            display::address(&row.bidder),
            display::eth(row.deposited),
            describe(&row.outcome),
            row.work
        );
    }
    println!();
}
