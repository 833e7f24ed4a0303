//! StakingEscrow agent (read-only)

use ethers::abi::Token;
use worklock_chain::interface::staking_escrow as iface;
use worklock_types::{Address, U256};

use crate::contract::{ContractAgent, ContractHandle};
use crate::Result;

#[derive(Debug, Clone)]
pub struct StakingEscrowAgent {
    contract: ContractHandle,
}

impl ContractAgent for StakingEscrowAgent {
    const CONTRACT_NAME: &'static str = iface::CONTRACT_NAME;

    fn from_handle(handle: ContractHandle) -> Self {
        Self { contract: handle }
    }

    fn handle(&self) -> &ContractHandle {
        &self.contract
    }
}

impl PartialEq for StakingEscrowAgent {
    fn eq(&self, other: &Self) -> bool {
        self.contract.address() == other.contract.address()
    }
}

impl Eq for StakingEscrowAgent {}

impl StakingEscrowAgent {
    /// Tokens locked by `staker` in the period `periods` after the current one
    pub async fn get_locked_tokens(&self, staker: &Address, periods: u16) -> Result<U256> {
        self.contract
            .call_uint(
                "getLockedTokens",
                &[Token::Address(*staker), Token::Uint(U256::from(periods))],
            )
            .await
    }

    /// All tokens held for `staker`, locked or not
    pub async fn get_all_tokens(&self, staker: &Address) -> Result<U256> {
        self.contract
            .call_uint("getAllTokens", &[Token::Address(*staker)])
            .await
    }

    pub async fn get_current_period(&self) -> Result<u64> {
        self.contract.call_u64("getCurrentPeriod", &[]).await
    }
}
