//! Agent errors

use thiserror::Error;
use worklock_chain::ChainError;
use worklock_types::TxReceipt;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    /// The chain rejected the transaction. Never retried here.
    #[error("Transaction reverted: {reason}")]
    TransactionReverted {
        reason: String,
        receipt: Option<Box<TxReceipt>>,
    },

    #[error("Chain error: {0}")]
    Chain(ChainError),

    /// Arguments or return data did not match the contract ABI
    #[error("ABI mismatch in {function}: {message}")]
    Abi { function: String, message: String },

    /// The agent cache returned an entry of another type for this key
    #[error("Agent cache entry for {contract} holds a different agent type")]
    AgencyTypeMismatch { contract: &'static str },
}

impl AgentError {
    pub fn is_revert(&self) -> bool {
        matches!(self, AgentError::TransactionReverted { .. })
    }

    /// Receipt of the failed transaction, if it was mined
    pub fn receipt(&self) -> Option<&TxReceipt> {
        match self {
            AgentError::TransactionReverted { receipt, .. } => receipt.as_deref(),
            _ => None,
        }
    }
}

impl From<ChainError> for AgentError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::Reverted { reason } => AgentError::TransactionReverted {
                reason,
                receipt: None,
            },
            other => AgentError::Chain(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_revert_becomes_transaction_reverted() {
        let err: AgentError = ChainError::Reverted {
            reason: "Tokens are already claimed".to_string(),
        }
        .into();
        assert!(err.is_revert());
        assert!(err.receipt().is_none());

        let err: AgentError = ChainError::Transport {
            message: "connection refused".to_string(),
        }
        .into();
        assert!(matches!(err, AgentError::Chain(ChainError::Transport { .. })));
    }
}
