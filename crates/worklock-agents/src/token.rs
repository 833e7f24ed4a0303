//! Token agent

use ethers::abi::Token;
use worklock_chain::interface::token as iface;
use worklock_types::{Address, U256};

use crate::contract::{ContractAgent, ContractHandle};
use crate::Result;

#[derive(Debug, Clone)]
pub struct NucypherTokenAgent {
    contract: ContractHandle,
}

impl ContractAgent for NucypherTokenAgent {
    const CONTRACT_NAME: &'static str = iface::CONTRACT_NAME;

    fn from_handle(handle: ContractHandle) -> Self {
        Self { contract: handle }
    }

    fn handle(&self) -> &ContractHandle {
        &self.contract
    }
}

impl NucypherTokenAgent {
    /// Token balance in NuNits
    pub async fn get_balance(&self, account: &Address) -> Result<U256> {
        self.contract
            .call_uint("balanceOf", &[Token::Address(*account)])
            .await
    }
}
