//! WorkLock agent
//!
//! Drives the per-bidder cycle `NoBid -> Bidding -> {Cancelled | Claimed}`.
//! The contract enforces the rules; invalid transitions come back as
//! `AgentError::TransactionReverted`.

use ethers::abi::Token;
use worklock_chain::interface::worklock as iface;
use worklock_chain::TransactionRequest;
use worklock_types::{checksum, Address, TxReceipt, U256};

use crate::contract::{unexpected, ContractAgent, ContractHandle};
use crate::Result;

#[derive(Debug, Clone)]
pub struct WorkLockAgent {
    contract: ContractHandle,
}

impl ContractAgent for WorkLockAgent {
    const CONTRACT_NAME: &'static str = iface::CONTRACT_NAME;

    fn from_handle(handle: ContractHandle) -> Self {
        Self { contract: handle }
    }

    fn handle(&self) -> &ContractHandle {
        &self.contract
    }
}

impl PartialEq for WorkLockAgent {
    fn eq(&self, other: &Self) -> bool {
        self.contract.address() == other.contract.address()
    }
}

impl Eq for WorkLockAgent {}

impl WorkLockAgent {
    // --- transactions ---

    pub fn bid_transaction(&self, bidder: &Address, value: U256) -> Result<TransactionRequest> {
        self.contract.transaction(*bidder, "bid", &[], value)
    }

    pub fn cancel_bid_transaction(&self, bidder: &Address) -> Result<TransactionRequest> {
        self.contract.transaction(*bidder, "cancelBid", &[], U256::zero())
    }

    pub fn claim_transaction(&self, bidder: &Address) -> Result<TransactionRequest> {
        self.contract.transaction(*bidder, "claim", &[], U256::zero())
    }

    /// Add `value` wei to the bidder's deposit. Reverts when the window is
    /// closed, the value is below the minimum, or the bidder cancelled.
    pub async fn bid(&self, bidder: &Address, value: U256) -> Result<TxReceipt> {
        tracing::info!(bidder = %checksum(bidder), %value, "placing bid");
        self.contract.transact(self.bid_transaction(bidder, value)?).await
    }

    /// Refund the whole deposit. A second cancel reverts.
    pub async fn cancel_bid(&self, bidder: &Address) -> Result<TxReceipt> {
        tracing::info!(bidder = %checksum(bidder), "cancelling bid");
        self.contract.transact(self.cancel_bid_transaction(bidder)?).await
    }

    /// Convert the deposit into a locked stake. Only after bidding closes,
    /// and only once.
    pub async fn claim(&self, bidder: &Address) -> Result<TxReceipt> {
        tracing::info!(bidder = %checksum(bidder), "claiming tokens");
        self.contract.transact(self.claim_transaction(bidder)?).await
    }

    // --- reads ---

    async fn work_info(&self, bidder: &Address) -> Result<(U256, bool)> {
        let output = self.contract.call("workInfo", &[Token::Address(*bidder)]).await?;
        match output.as_slice() {
            [Token::Uint(deposited), Token::Bool(claimed)] => Ok((*deposited, *claimed)),
            _ => Err(unexpected("workInfo", "expected (uint256, bool)")),
        }
    }

    /// Current deposit in wei; zero when none or cancelled
    pub async fn get_deposited_eth(&self, bidder: &Address) -> Result<U256> {
        Ok(self.work_info(bidder).await?.0)
    }

    pub async fn is_claimed(&self, bidder: &Address) -> Result<bool> {
        Ok(self.work_info(bidder).await?.1)
    }

    /// Work still owed by the bidder; zero once claimed
    pub async fn get_remaining_work(&self, bidder: &Address) -> Result<U256> {
        self.contract
            .call_uint("getRemainingWork", &[Token::Address(*bidder)])
            .await
    }

    /// Sum of all live deposits
    pub async fn eth_supply(&self) -> Result<U256> {
        self.contract.call_uint("ethSupply", &[]).await
    }

    /// Tokens allocated for distribution
    pub async fn token_supply(&self) -> Result<U256> {
        self.contract.call_uint("tokenSupply", &[]).await
    }

    pub async fn start_bid_date(&self) -> Result<u64> {
        self.contract.call_u64("startBidDate", &[]).await
    }

    pub async fn end_bid_date(&self) -> Result<u64> {
        self.contract.call_u64("endBidDate", &[]).await
    }

    /// Whether bids are accepted at the latest block's timestamp
    pub async fn bidding_window_open(&self) -> Result<bool> {
        let now = self.contract.client().block_timestamp().await?;
        let start = self.start_bid_date().await?;
        let end = self.end_bid_date().await?;
        Ok(start <= now && now < end)
    }

    pub async fn eth_to_tokens(&self, eth: U256) -> Result<U256> {
        self.contract.call_uint("ethToTokens", &[Token::Uint(eth)]).await
    }

    pub async fn eth_to_work(&self, eth: U256) -> Result<U256> {
        self.contract.call_uint("ethToWork", &[Token::Uint(eth)]).await
    }
}
