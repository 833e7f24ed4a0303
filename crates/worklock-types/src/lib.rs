//! WorkLock Types - Canonical domain types for the WorkLock client
//!
//! This crate has zero dependencies on other worklock crates. It defines:
//!
//! - Strict EIP-55 address parsing on top of the `ethers` primitives
//! - 256-bit amounts (wei / NuNits) and unit formatting
//! - Transaction receipts with a status code and revert reason
//! - `TokenEconomics`: the deployment parameters of the WorkLock round
//! - `ValidationError`: malformed input at the edges

pub mod address;
pub mod amount;
pub mod economics;
pub mod error;
pub mod receipt;

pub use address::*;
pub use amount::*;
pub use economics::*;
pub use error::*;
pub use receipt::*;

pub use ethers::types::{Address, Bytes, TxHash, U256};
pub use ethers::utils::keccak256;
