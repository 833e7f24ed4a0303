//! Transaction receipts
//!
//! A receipt is the confirmation record of a mined transaction. Its status
//! is `1` on success and `0` when the contract reverted.

use ethers::types::{Address, TxHash};
use serde::{Deserialize, Serialize};

/// Outcome of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    /// Status `0`: the contract rejected the call
    Reverted,
    /// Status `1`
    Success,
}

impl TxStatus {
    /// The numeric status field carried by chain receipts
    pub fn code(&self) -> u8 {
        match self {
            Self::Reverted => 0,
            Self::Success => 1,
        }
    }

    pub fn from_code(code: u64) -> Self {
        if code == 1 {
            Self::Success
        } else {
            Self::Reverted
        }
    }
}

/// Confirmation record of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub status: TxStatus,
    pub gas_used: u64,
    /// Revert reason, when the chain reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }

    /// Full `0x`-prefixed transaction hash
    pub fn tx_hash_hex(&self) -> String {
        format!("{:#x}", self.tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TxStatus::Success.code(), 1);
        assert_eq!(TxStatus::Reverted.code(), 0);
        assert_eq!(TxStatus::from_code(1), TxStatus::Success);
        assert_eq!(TxStatus::from_code(0), TxStatus::Reverted);
    }

    #[test]
    fn test_receipt_json_keeps_full_hash() {
        let receipt = TxReceipt {
            tx_hash: TxHash::repeat_byte(0xab),
            block_number: 7,
            from: Address::repeat_byte(1),
            to: None,
            status: TxStatus::Reverted,
            gas_used: 21_000,
            revert_reason: Some("No bid to claim".to_string()),
        };
        assert_eq!(receipt.tx_hash_hex(), format!("0x{}", "ab".repeat(32)));

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["tx_hash"], receipt.tx_hash_hex());
        let back: TxReceipt = serde_json::from_value(json).unwrap();
        assert_eq!(back, receipt);
    }
}
