//! Deployed contract handle
//!
//! Binds a chain client to one registry entry and the contract's ABI. Agents
//! build on this: reads go through `call`, writes through `transact`, which
//! turns a status-0 receipt into `AgentError::TransactionReverted`.

use std::fmt;
use std::sync::Arc;

use ethers::abi::Token;
use worklock_chain::{CallRequest, ChainClient, ContractInterface, ContractRegistry, TransactionRequest};
use worklock_types::{checksum, Address, TxReceipt, U256};

use crate::{AgentError, Result};

#[derive(Clone)]
pub struct ContractHandle {
    client: Arc<dyn ChainClient>,
    interface: Arc<ContractInterface>,
    version: String,
    address: Address,
}

impl ContractHandle {
    /// Resolve the latest registered deployment of `name`
    pub fn resolve(
        client: Arc<dyn ChainClient>,
        registry: &ContractRegistry,
        name: &'static str,
    ) -> Result<Self> {
        let entry = registry.search(name, None)?;
        let interface = ContractInterface::for_contract(name).map_err(worklock_chain::ChainError::from)?;
        tracing::debug!(
            contract = name,
            version = %entry.contract_version,
            address = %checksum(&entry.address),
            "resolved contract"
        );
        Ok(Self {
            client,
            interface: Arc::new(interface),
            version: entry.contract_version.clone(),
            address: entry.address,
        })
    }

    pub fn name(&self) -> &'static str {
        self.interface.name()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    fn encode(&self, function: &str, args: &[Token]) -> Result<Vec<u8>> {
        self.interface
            .encode_call(function, args)
            .map_err(|e| unexpected(function, &e.to_string()))
    }

    /// Build, but do not send, a transaction against this contract
    pub fn transaction(&self, from: Address, function: &str, args: &[Token], value: U256) -> Result<TransactionRequest> {
        Ok(TransactionRequest {
            from,
            to: self.address,
            value,
            data: self.encode(function, args)?.into(),
            gas: None,
        })
    }

    /// Send a transaction and wait for it to be mined
    pub async fn transact(&self, tx: TransactionRequest) -> Result<TxReceipt> {
        let from = tx.from;
        let receipt = self.client.send_transaction(tx).await?;
        if receipt.is_success() {
            tracing::info!(contract = self.name(), from = %checksum(&from), tx_hash = %receipt.tx_hash_hex(), "transaction succeeded");
            return Ok(receipt);
        }

        let reason = receipt
            .revert_reason
            .clone()
            .unwrap_or_else(|| "execution reverted".to_string());
        tracing::warn!(contract = self.name(), from = %checksum(&from), tx_hash = %receipt.tx_hash_hex(), %reason, "transaction reverted");
        Err(AgentError::TransactionReverted {
            reason,
            receipt: Some(Box::new(receipt)),
        })
    }

    /// Read-only call returning the decoded return values
    pub async fn call(&self, function: &str, args: &[Token]) -> Result<Vec<Token>> {
        let data = self
            .client
            .call(CallRequest {
                from: None,
                to: self.address,
                data: self.encode(function, args)?.into(),
            })
            .await?;
        self.interface
            .decode_output(function, &data)
            .map_err(|e| unexpected(function, &e.to_string()))
    }

    pub async fn call_uint(&self, function: &str, args: &[Token]) -> Result<U256> {
        let output = self.call(function, args).await?;
        output
            .into_iter()
            .next()
            .and_then(Token::into_uint)
            .ok_or_else(|| unexpected(function, "expected a uint"))
    }

    pub async fn call_u64(&self, function: &str, args: &[Token]) -> Result<u64> {
        let value = self.call_uint(function, args).await?;
        if value > U256::from(u64::MAX) {
            return Err(unexpected(function, "value exceeds 64 bits"));
        }
        Ok(value.low_u64())
    }
}

impl fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractHandle")
            .field("name", &self.name())
            .field("version", &self.version)
            .field("address", &self.address)
            .finish()
    }
}

pub(crate) fn unexpected(function: &str, message: &str) -> AgentError {
    AgentError::Abi {
        function: function.to_string(),
        message: message.to_string(),
    }
}

/// A typed facade over one deployed contract
pub trait ContractAgent: Send + Sync + Sized + 'static {
    /// Registry name of the contract
    const CONTRACT_NAME: &'static str;

    fn from_handle(handle: ContractHandle) -> Self;

    fn handle(&self) -> &ContractHandle;

    /// Look the contract up in `registry` and bind it to `client`
    fn new(client: Arc<dyn ChainClient>, registry: &ContractRegistry) -> Result<Self> {
        ContractHandle::resolve(client, registry, Self::CONTRACT_NAME).map(Self::from_handle)
    }

    fn contract_address(&self) -> Address {
        self.handle().address()
    }
}
