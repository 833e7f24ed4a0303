//! WorkLock Chain - Blockchain access for the WorkLock client
//!
//! # Layers
//!
//! - `interface`: human-readable contract ABIs and calldata codec
//! - `registry`: contract name to address resolution
//! - `client`: the `ChainClient` trait every agent talks through
//! - `provider`: JSON-RPC provider for a live node
//! - `tester`: in-process chain with the WorkLock contracts deployed
//!
//! The tester chain keeps balances in a double-entry `ledger` so every
//! movement of ETH or NU can be traced back to a transaction.

pub mod client;
pub mod error;
pub mod interface;
pub mod ledger;
pub mod provider;
pub mod registry;
pub mod tester;

pub use client::{CallRequest, ChainClient, TransactionRequest};
pub use error::{ChainError, Result};
pub use interface::{ContractInterface, InterfaceError};
pub use provider::{PollSettings, RpcProvider};
pub use registry::{ContractRegistry, RegistryEntry, RegistryId};
pub use tester::{TesterChain, TesterConfig};
