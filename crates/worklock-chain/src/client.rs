//! The chain client seam
//!
//! Agents only ever talk to a `ChainClient`. Each call completes when the
//! read returns or the transaction is mined; reverts are surfaced, never
//! retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use worklock_types::{Address, Bytes, TxReceipt, U256};

use crate::Result;

/// A state-changing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    /// Wei sent along with the call
    pub value: U256,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
}

/// A read-only call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

/// Submits transactions and reads state from a ledger
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submit a transaction and wait for its receipt.
    ///
    /// A contract-level rejection either comes back as a receipt with status
    /// `0` or, for clients that detect it before mining, as
    /// `ChainError::Reverted`.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxReceipt>;

    /// Execute a read-only call against the latest state
    async fn call(&self, call: CallRequest) -> Result<Bytes>;

    /// Timestamp of the latest block
    async fn block_timestamp(&self) -> Result<u64>;

    async fn block_number(&self) -> Result<u64>;

    /// ETH balance in wei
    async fn balance(&self, account: &Address) -> Result<U256>;

    /// Accounts the client can send from
    async fn accounts(&self) -> Result<Vec<Address>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_request_json() {
        let tx = TransactionRequest {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            value: U256::from(16),
            data: Bytes::from(vec![0xde, 0xad]),
            gas: None,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["data"], "0xdead");
        assert!(json.get("gas").is_none());

        let back: TransactionRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
