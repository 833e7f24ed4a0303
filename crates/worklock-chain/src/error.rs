//! Chain access errors
//!
//! A revert is never retried here: it is surfaced to the caller as
//! `ChainError::Reverted` or as a receipt with status `0`.

use thiserror::Error;
use worklock_types::{Address, TxHash, ValidationError};

use crate::interface::InterfaceError;

/// Result type for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors raised by chain clients and the contract registry
#[derive(Debug, Error)]
pub enum ChainError {
    /// The chain rejected the call before or while executing it
    #[error("Transaction reverted: {reason}")]
    Reverted { reason: String },

    #[error("ABI error: {0}")]
    Abi(#[from] InterfaceError),

    #[error("Unknown account {address:?}")]
    UnknownAccount { address: Address },

    #[error("Contract {name} (version {version}) not found in registry")]
    ContractNotRegistered { name: String, version: String },

    #[error("Registry error: {message}")]
    Registry { message: String },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Provider error: {message}")]
    Provider { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("No receipt for {tx_hash:#x} after {seconds}s")]
    ReceiptTimeout { tx_hash: TxHash, seconds: u64 },

    #[error("Transaction {tx_hash:#x} was dropped from the mempool")]
    Dropped { tx_hash: TxHash },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        ChainError::Transport {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(e: serde_json::Error) -> Self {
        ChainError::InvalidResponse {
            message: e.to_string(),
        }
    }
}
