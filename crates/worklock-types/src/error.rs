//! Validation errors for the WorkLock client
//!
//! Raised at the edges (CLI arguments, registry files, RPC payloads) when
//! input is malformed. Chain-side failures live in `worklock-chain`.

use thiserror::Error;

/// Result type for validation
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Malformed input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Address is not `0x` followed by 40 hex characters
    #[error("Invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    /// Mixed-case address whose casing does not match its EIP-55 checksum
    #[error("Address {input} fails EIP-55 checksum (expected {expected})")]
    ChecksumMismatch { input: String, expected: String },

    /// Amount could not be parsed or does not fit
    #[error("Invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },

    /// Hex string could not be decoded
    #[error("Invalid hex {input:?}: {reason}")]
    InvalidHex { input: String, reason: String },

    /// Economics parameters are inconsistent
    #[error("Invalid token economics: {reason}")]
    InvalidEconomics { reason: String },
}
