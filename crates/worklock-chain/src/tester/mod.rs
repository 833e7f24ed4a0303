//! In-process tester chain
//!
//! Executes the WorkLock and StakingEscrow rules against a balance ledger,
//! with deterministic funded accounts and explicit time travel. One block is
//! mined per transaction; a reverted transaction still mines (status `0`)
//! but leaves contract state and balances untouched.

mod accounts;
mod escrow;
mod worklock;

pub use accounts::{contract_address, derive_account};

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Token;
use tokio::sync::Mutex;
use worklock_types::{
    checksum, ether, keccak256, Address, Bytes, TokenEconomics, TxHash, TxReceipt, TxStatus, U256,
};

use crate::interface::{self, encode_output, ContractInterface, InterfaceError};
use crate::ledger::{Asset, Checkpoint, EntryReason, Ledger, LedgerEntry, LedgerError};
use crate::registry::{ContractRegistry, RegistryEntry};
use crate::{CallRequest, ChainClient, ChainError, Result, TransactionRequest};

use escrow::StakingEscrowContract;
use worklock::WorkLockContract;

/// Version recorded in the tester registry
pub const TESTER_CONTRACT_VERSION: &str = "v0.0.0";

const BASE_GAS: u64 = 21_000;

/// A contract-level rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Revert(pub String);

impl Revert {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn overflow() -> Self {
        Self::new("Arithmetic overflow")
    }

    /// A view function sent as a transaction
    pub fn not_a_transaction(function: &str) -> Self {
        Self(format!("{} cannot be sent as a transaction", function))
    }

    /// A transaction sent as a read-only call
    pub fn not_callable(function: &str) -> Self {
        Self(format!("{} changes state and cannot be called read-only", function))
    }
}

impl From<InterfaceError> for Revert {
    fn from(e: InterfaceError) -> Self {
        Self(e.to_string())
    }
}

impl From<LedgerError> for Revert {
    fn from(e: LedgerError) -> Self {
        Self(e.to_string())
    }
}

pub(crate) fn arg_address(args: &[Token], index: usize) -> std::result::Result<Address, Revert> {
    args.get(index)
        .cloned()
        .and_then(Token::into_address)
        .ok_or_else(|| Revert::new(format!("argument {} is not an address", index)))
}

pub(crate) fn arg_uint(args: &[Token], index: usize) -> std::result::Result<U256, Revert> {
    args.get(index)
        .cloned()
        .and_then(Token::into_uint)
        .ok_or_else(|| Revert::new(format!("argument {} is not an integer", index)))
}

/// Execution environment of one transaction
#[derive(Debug, Clone)]
pub(crate) struct CallContext {
    pub sender: Address,
    pub value: U256,
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

impl CallContext {
    pub fn require_no_value(&self) -> std::result::Result<(), Revert> {
        if self.value.is_zero() {
            Ok(())
        } else {
            Err(Revert::new("Function is not payable"))
        }
    }

    pub fn entry_reason(&self) -> EntryReason {
        EntryReason::Transaction {
            tx_hash: self.tx_hash,
        }
    }
}

/// Tester chain parameters
#[derive(Debug, Clone)]
pub struct TesterConfig {
    pub economics: TokenEconomics,
    /// Funded accounts besides the etherbase
    pub unassigned_accounts: u32,
    /// Starting ETH balance of every account, in wei
    pub initial_balance: U256,
    /// Defaults to the current wall-clock time
    pub genesis_timestamp: Option<u64>,
    /// Receipts kept for lookup; older ones are dropped
    pub receipt_retention: usize,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            economics: TokenEconomics::test(),
            unassigned_accounts: 10,
            initial_balance: ether(1_000_000),
            genesis_timestamp: None,
            receipt_retention: 1024,
        }
    }
}

/// Parsed ABIs of the deployed contracts
#[derive(Debug)]
struct Interfaces {
    token: ContractInterface,
    worklock: ContractInterface,
    escrow: ContractInterface,
}

impl Interfaces {
    fn load() -> Result<Self> {
        Ok(Self {
            token: ContractInterface::for_contract(interface::token::CONTRACT_NAME)?,
            worklock: ContractInterface::for_contract(interface::worklock::CONTRACT_NAME)?,
            escrow: ContractInterface::for_contract(interface::staking_escrow::CONTRACT_NAME)?,
        })
    }
}

/// State a reverted transaction must leave untouched
struct Snapshot {
    ledger: Checkpoint,
    worklock: WorkLockContract,
    escrow: StakingEscrowContract,
}

/// Contract state and balances
#[derive(Debug)]
struct World {
    ledger: Ledger,
    token: Address,
    worklock: WorkLockContract,
    escrow: StakingEscrowContract,
    interfaces: Interfaces,
}

impl World {
    fn is_contract(&self, address: &Address) -> bool {
        *address == self.token || *address == self.worklock.address || *address == self.escrow.address
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            ledger: self.ledger.checkpoint(),
            worklock: self.worklock.clone(),
            escrow: self.escrow.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.ledger.rollback(snapshot.ledger);
        self.worklock = snapshot.worklock;
        self.escrow = snapshot.escrow;
    }

    fn execute(&mut self, ctx: &CallContext, to: &Address, data: &[u8]) -> std::result::Result<Vec<u8>, Revert> {
        if !self.is_contract(to) {
            if !data.is_empty() {
                return Err(Revert::new("No contract code at destination"));
            }
            self.ledger
                .transfer(&ctx.sender, to, Asset::Eth, ctx.value, ctx.entry_reason(), ctx.block_number)?;
            return Ok(Vec::new());
        }

        self.ledger
            .transfer(&ctx.sender, to, Asset::Eth, ctx.value, ctx.entry_reason(), ctx.block_number)?;

        if *to == self.worklock.address {
            self.worklock.execute(
                ctx,
                &self.interfaces.worklock,
                data,
                &mut self.escrow,
                &mut self.ledger,
            )
        } else {
            Err(Revert::new("Contract accepts no transactions in the tester chain"))
        }
    }

    fn call(&self, to: &Address, data: &[u8], now: u64) -> std::result::Result<Vec<u8>, Revert> {
        if *to == self.worklock.address {
            self.worklock.call(&self.interfaces.worklock, data)
        } else if *to == self.escrow.address {
            self.escrow.call(&self.interfaces.escrow, data, now)
        } else if *to == self.token {
            let (_, args) = self.interfaces.token.decode_call(data)?;
            let holder = arg_address(&args, 0)?;
            Ok(encode_output(&[Token::Uint(self.ledger.balance(&holder, Asset::Nu))]))
        } else {
            Err(Revert::new("No contract code at destination"))
        }
    }
}

#[derive(Debug)]
struct ChainState {
    timestamp: u64,
    block_number: u64,
    nonces: HashMap<Address, u64>,
    receipts: HashMap<TxHash, TxReceipt>,
    /// Receipt hashes, oldest first
    receipt_order: VecDeque<TxHash>,
    world: World,
}

impl ChainState {
    fn store_receipt(&mut self, receipt: TxReceipt, retention: usize) {
        self.receipt_order.push_back(receipt.tx_hash);
        self.receipts.insert(receipt.tx_hash, receipt);
        while self.receipt_order.len() > retention {
            if let Some(oldest) = self.receipt_order.pop_front() {
                self.receipts.remove(&oldest);
            }
        }
    }
}

/// In-process chain with the WorkLock contracts deployed
pub struct TesterChain {
    state: Mutex<ChainState>,
    economics: TokenEconomics,
    etherbase: Address,
    unassigned: Vec<Address>,
    registry: Arc<ContractRegistry>,
    receipt_retention: usize,
}

impl TesterChain {
    /// Create a chain, fund its accounts and deploy the contracts
    pub fn new(config: TesterConfig) -> Result<Self> {
        config.economics.validate()?;

        let etherbase = derive_account(0)?;
        let unassigned = (1..=config.unassigned_accounts)
            .map(derive_account)
            .collect::<Result<Vec<_>>>()?;

        let genesis = config
            .genesis_timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);

        let token = contract_address(&etherbase, 0);
        let escrow = StakingEscrowContract::deploy(contract_address(&etherbase, 1), &config.economics);
        let worklock = WorkLockContract::deploy(contract_address(&etherbase, 2), &config.economics, genesis);

        let interfaces = Interfaces::load()?;

        let mut ledger = Ledger::new();
        for account in std::iter::once(&etherbase).chain(unassigned.iter()) {
            ledger
                .credit(account, Asset::Eth, config.initial_balance, EntryReason::Genesis, 0)
                .map_err(ledger_failure)?;
        }
        ledger
            .credit(&worklock.address, Asset::Nu, config.economics.worklock_supply, EntryReason::Genesis, 0)
            .map_err(ledger_failure)?;

        let registry = ContractRegistry::new(vec![
            registry_entry(interface::token::CONTRACT_NAME, token),
            registry_entry(interface::staking_escrow::CONTRACT_NAME, escrow.address),
            registry_entry(interface::worklock::CONTRACT_NAME, worklock.address),
        ]);

        tracing::info!(
            worklock = %checksum(&worklock.address),
            staking_escrow = %checksum(&escrow.address),
            accounts = unassigned.len() + 1,
            genesis,
            "tester chain deployed"
        );

        let mut nonces = HashMap::new();
        nonces.insert(etherbase, 3);

        Ok(Self {
            state: Mutex::new(ChainState {
                timestamp: genesis,
                block_number: 0,
                nonces,
                receipts: HashMap::new(),
                receipt_order: VecDeque::new(),
                world: World {
                    ledger,
                    token,
                    worklock,
                    escrow,
                    interfaces,
                },
            }),
            economics: config.economics,
            etherbase,
            unassigned,
            registry: Arc::new(registry),
            receipt_retention: config.receipt_retention.max(1),
        })
    }

    /// Chain with the test economics and ten funded bidders
    pub fn with_test_economics() -> Result<Self> {
        Self::new(TesterConfig::default())
    }

    pub fn registry(&self) -> Arc<ContractRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn economics(&self) -> &TokenEconomics {
        &self.economics
    }

    /// The deployer account
    pub fn etherbase(&self) -> Address {
        self.etherbase
    }

    /// Funded accounts with no role, for use as bidders
    pub fn unassigned_accounts(&self) -> &[Address] {
        &self.unassigned
    }

    /// Advance chain time and mine an empty block
    pub async fn time_travel(&self, seconds: u64) {
        let mut state = self.state.lock().await;
        state.timestamp += seconds;
        state.block_number += 1;
        tracing::info!(seconds, timestamp = state.timestamp, "time travel");
    }

    pub async fn time_travel_periods(&self, periods: u64) {
        self.time_travel(periods * self.economics.seconds_per_period()).await;
    }

    pub async fn receipt(&self, tx_hash: &TxHash) -> Option<TxReceipt> {
        self.state.lock().await.receipts.get(tx_hash).cloned()
    }

    /// Ledger history of an account, oldest first
    pub async fn account_entries(&self, account: &Address) -> Vec<LedgerEntry> {
        self.state.lock().await.world.ledger.account_entries(account)
    }

    pub async fn token_balance(&self, account: &Address) -> U256 {
        self.state.lock().await.world.ledger.balance(account, Asset::Nu)
    }

    fn is_account(&self, address: &Address) -> bool {
        *address == self.etherbase || self.unassigned.contains(address)
    }
}

#[async_trait]
impl ChainClient for TesterChain {
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxReceipt> {
        if !self.is_account(&tx.from) {
            return Err(ChainError::UnknownAccount { address: tx.from });
        }

        let mut state = self.state.lock().await;
        let nonce = {
            let counter = state.nonces.entry(tx.from).or_insert(0);
            let current = *counter;
            *counter += 1;
            current
        };
        state.block_number += 1;

        let tx_hash = transaction_hash(&tx, nonce);
        let ctx = CallContext {
            sender: tx.from,
            value: tx.value,
            timestamp: state.timestamp,
            block_number: state.block_number,
            tx_hash,
        };

        let snapshot = state.world.snapshot();
        let (status, revert_reason) = match state.world.execute(&ctx, &tx.to, &tx.data) {
            Ok(_) => (TxStatus::Success, None),
            Err(Revert(reason)) => {
                state.world.restore(snapshot);
                tracing::warn!(tx_hash = ?tx_hash, from = ?tx.from, to = ?tx.to, %reason, "transaction reverted");
                (TxStatus::Reverted, Some(reason))
            }
        };

        let receipt = TxReceipt {
            tx_hash,
            block_number: state.block_number,
            from: tx.from,
            to: Some(tx.to),
            status,
            gas_used: BASE_GAS + 16 * tx.data.len() as u64,
            revert_reason,
        };
        tracing::debug!(tx_hash = ?tx_hash, block = receipt.block_number, status = receipt.status.code(), "mined transaction");
        state.store_receipt(receipt.clone(), self.receipt_retention);
        Ok(receipt)
    }

    async fn call(&self, call: CallRequest) -> Result<Bytes> {
        let state = self.state.lock().await;
        state
            .world
            .call(&call.to, &call.data, state.timestamp)
            .map(Bytes::from)
            .map_err(|Revert(reason)| ChainError::Reverted { reason })
    }

    async fn block_timestamp(&self) -> Result<u64> {
        Ok(self.state.lock().await.timestamp)
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().await.block_number)
    }

    async fn balance(&self, account: &Address) -> Result<U256> {
        Ok(self.state.lock().await.world.ledger.balance(account, Asset::Eth))
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(std::iter::once(self.etherbase)
            .chain(self.unassigned.iter().copied())
            .collect())
    }
}

fn registry_entry(name: &str, address: Address) -> RegistryEntry {
    RegistryEntry {
        contract_name: name.to_string(),
        contract_version: TESTER_CONTRACT_VERSION.to_string(),
        address,
    }
}

fn ledger_failure(e: LedgerError) -> ChainError {
    ChainError::InvalidResponse {
        message: format!("genesis allocation failed: {}", e),
    }
}

fn transaction_hash(tx: &TransactionRequest, nonce: u64) -> TxHash {
    let mut material = Vec::with_capacity(20 + 8 + 20 + 32 + tx.data.len());
    material.extend_from_slice(tx.from.as_bytes());
    material.extend_from_slice(&nonce.to_be_bytes());
    material.extend_from_slice(tx.to.as_bytes());
    let mut value = [0u8; 32];
    tx.value.to_big_endian(&mut value);
    material.extend_from_slice(&value);
    material.extend_from_slice(&tx.data);
    TxHash::from(keccak256(&material))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worklock_address(chain: &TesterChain) -> Address {
        chain
            .registry()
            .search(interface::worklock::CONTRACT_NAME, None)
            .unwrap()
            .address
    }

    fn worklock_call(function: &str) -> Bytes {
        ContractInterface::for_contract(interface::worklock::CONTRACT_NAME)
            .unwrap()
            .encode_call(function, &[])
            .unwrap()
            .into()
    }

    fn transaction(from: Address, to: Address, value: U256, function: &str) -> TransactionRequest {
        TransactionRequest {
            from,
            to,
            value,
            data: worklock_call(function),
            gas: None,
        }
    }

    #[tokio::test]
    async fn test_bid_moves_eth_into_worklock() {
        let chain = TesterChain::with_test_economics().unwrap();
        let bidder = chain.unassigned_accounts()[0];
        let worklock = worklock_address(&chain);
        let before = chain.balance(&bidder).await.unwrap();

        let receipt = chain
            .send_transaction(transaction(bidder, worklock, ether(10), "bid"))
            .await
            .unwrap();

        assert!(receipt.is_success());
        assert_eq!(chain.balance(&bidder).await.unwrap(), before - ether(10));
        assert_eq!(chain.balance(&worklock).await.unwrap(), ether(10));
        assert_eq!(chain.receipt(&receipt.tx_hash).await, Some(receipt));
    }

    #[tokio::test]
    async fn test_revert_leaves_state_untouched() {
        let chain = TesterChain::with_test_economics().unwrap();
        let bidder = chain.unassigned_accounts()[0];
        let worklock = worklock_address(&chain);
        let balance_before = chain.balance(&bidder).await.unwrap();
        let entries_before = chain.account_entries(&bidder).await.len();

        // Claiming while bidding is open reverts, even with value attached
        let receipt = chain
            .send_transaction(transaction(bidder, worklock, ether(5), "claim"))
            .await
            .unwrap();

        assert_eq!(receipt.status, TxStatus::Reverted);
        assert!(receipt.revert_reason.is_some());
        assert_eq!(chain.balance(&worklock).await.unwrap(), U256::zero());
        assert_eq!(chain.balance(&bidder).await.unwrap(), balance_before);
        assert_eq!(chain.account_entries(&bidder).await.len(), entries_before);
    }

    #[tokio::test]
    async fn test_unknown_sender_rejected() {
        let chain = TesterChain::with_test_economics().unwrap();
        let result = chain
            .send_transaction(transaction(Address::repeat_byte(0x42), worklock_address(&chain), ether(1), "bid"))
            .await;
        assert!(matches!(result, Err(ChainError::UnknownAccount { .. })));
    }

    #[tokio::test]
    async fn test_time_travel_and_token_balances() {
        let chain = TesterChain::new(TesterConfig {
            genesis_timestamp: Some(1_000_000),
            ..TesterConfig::default()
        })
        .unwrap();
        chain.time_travel(60).await;
        assert_eq!(chain.block_timestamp().await.unwrap(), 1_000_060);
        assert_eq!(chain.block_number().await.unwrap(), 1);

        let supply = chain.economics().worklock_supply;
        assert_eq!(chain.token_balance(&worklock_address(&chain)).await, supply);
    }

    #[tokio::test]
    async fn test_read_of_unknown_function_reverts() {
        let chain = TesterChain::with_test_economics().unwrap();
        let burn = ContractInterface::parse("WorkLock", &["function burnUnclaimed() external"])
            .unwrap()
            .encode_call("burnUnclaimed", &[])
            .unwrap();
        let result = chain
            .call(CallRequest {
                from: None,
                to: worklock_address(&chain),
                data: burn.into(),
            })
            .await;
        assert!(matches!(result, Err(ChainError::Reverted { .. })));

        // A transaction function is not a read
        let result = chain
            .call(CallRequest {
                from: None,
                to: worklock_address(&chain),
                data: worklock_call("claim"),
            })
            .await;
        assert!(matches!(result, Err(ChainError::Reverted { .. })));
    }

    #[tokio::test]
    async fn test_old_receipts_are_dropped() {
        let chain = TesterChain::new(TesterConfig {
            receipt_retention: 2,
            ..TesterConfig::default()
        })
        .unwrap();
        let bidder = chain.unassigned_accounts()[0];
        let worklock = worklock_address(&chain);

        let mut hashes = Vec::new();
        for _ in 0..3 {
            let receipt = chain
                .send_transaction(transaction(bidder, worklock, ether(1), "bid"))
                .await
                .unwrap();
            hashes.push(receipt.tx_hash);
        }

        assert!(chain.receipt(&hashes[0]).await.is_none());
        assert!(chain.receipt(&hashes[1]).await.is_some());
        assert!(chain.receipt(&hashes[2]).await.is_some());
    }
}
