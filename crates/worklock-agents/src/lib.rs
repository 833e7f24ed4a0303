//! WorkLock Agents - Contract facades for the WorkLock client
//!
//! - **WorkLockAgent**: bid, cancel and claim, plus the auction reads
//! - **StakingEscrowAgent**: locked stake reads, used to confirm claims
//! - **NucypherTokenAgent**: token balances
//! - **ContractAgency**: shares one agent per (type, registry)
//!
//! Agents hold no state of their own. Every operation is a single chain
//! call and a revert is surfaced to the caller as
//! `AgentError::TransactionReverted`, never retried.

pub mod agency;
pub mod contract;
pub mod error;
pub mod staking;
pub mod token;
pub mod worklock;

pub use agency::ContractAgency;
pub use contract::{ContractAgent, ContractHandle};
pub use error::{AgentError, Result};
pub use staking::StakingEscrowAgent;
pub use token::NucypherTokenAgent;
pub use worklock::WorkLockAgent;
