//! Balance ledger backing the tester chain
//!
//! The ledger is:
//! - Asset-scoped (ETH and NU)
//! - Account-keyed by `Address`
//! - Double-entry (every transfer debits one account and credits another)
//! - Append-only (entries are never rewritten; a rollback only drops the
//!   entries of a transaction that did not commit)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. Every entry has a reason
//! 3. A failed debit leaves no entries behind

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use worklock_types::{Address, TxHash, U256};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient {asset:?} balance for {account:?}: have {available}, need {required}")]
    InsufficientBalance {
        account: Address,
        asset: Asset,
        available: U256,
        required: U256,
    },

    #[error("Balance overflow for {account:?}")]
    Overflow { account: Address },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Assets tracked by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Native currency, in wei
    Eth,
    /// Staking token, in NuNits
    Nu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    Credit,
    Debit,
}

/// Why a balance moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    /// Funds allocated when the chain was created
    Genesis,
    /// Movement caused by a mined transaction
    Transaction { tx_hash: TxHash },
}

/// One side of a double-entry movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub account: Address,
    pub asset: Asset,
    pub entry_type: EntryType,
    pub amount: U256,
    pub balance_after: U256,
    pub reason: EntryReason,
    pub block_number: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<(Address, Asset), U256>,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &Address, asset: Asset) -> U256 {
        self.balances
            .get(&(*account, asset))
            .copied()
            .unwrap_or_default()
    }

    /// Credit an account. Zero amounts are a no-op.
    pub fn credit(
        &mut self,
        account: &Address,
        asset: Asset,
        amount: U256,
        reason: EntryReason,
        block_number: u64,
    ) -> Result<U256> {
        let current = self.balance(account, asset);
        if amount.is_zero() {
            return Ok(current);
        }
        let new_balance = current
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *account })?;

        self.balances.insert((*account, asset), new_balance);
        self.entries.push(LedgerEntry {
            account: *account,
            asset,
            entry_type: EntryType::Credit,
            amount,
            balance_after: new_balance,
            reason,
            block_number,
        });
        Ok(new_balance)
    }

    /// Debit an account. Fails if the balance would go negative.
    pub fn debit(
        &mut self,
        account: &Address,
        asset: Asset,
        amount: U256,
        reason: EntryReason,
        block_number: u64,
    ) -> Result<U256> {
        let current = self.balance(account, asset);
        if amount.is_zero() {
            return Ok(current);
        }
        let new_balance =
            current
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientBalance {
                    account: *account,
                    asset,
                    available: current,
                    required: amount,
                })?;

        self.balances.insert((*account, asset), new_balance);
        self.entries.push(LedgerEntry {
            account: *account,
            asset,
            entry_type: EntryType::Debit,
            amount,
            balance_after: new_balance,
            reason,
            block_number,
        });
        Ok(new_balance)
    }

    /// Move `amount` between accounts; both sides or neither.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        asset: Asset,
        amount: U256,
        reason: EntryReason,
        block_number: u64,
    ) -> Result<()> {
        let receiver = self.balance(to, asset);
        if receiver.checked_add(amount).is_none() {
            return Err(LedgerError::Overflow { account: *to });
        }
        self.debit(from, asset, amount, reason.clone(), block_number)?;
        self.credit(to, asset, amount, reason, block_number)?;
        Ok(())
    }

    pub fn account_entries(&self, account: &Address) -> Vec<LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| &e.account == account)
            .cloned()
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Mark the current end of the history
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.entries.len())
    }

    /// Undo every entry recorded after `checkpoint`, newest first
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.entries.len() > checkpoint.0 {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            let before = match entry.entry_type {
                EntryType::Credit => entry.balance_after - entry.amount,
                EntryType::Debit => entry.balance_after + entry.amount,
            };
            self.balances.insert((entry.account, entry.asset), before);
        }
    }
}

/// Position in the ledger history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);
