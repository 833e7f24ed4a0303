//! JSON-RPC provider
//!
//! Wraps an `ethers` `Provider<Http>` for a node that manages its own
//! accounts (`eth_accounts`, `eth_sendTransaction`). Sending waits for the
//! receipt, polling at the configured interval up to a deadline.

use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{BlockNumber, TransactionReceipt};
use worklock_types::{Address, Bytes, TxReceipt, TxStatus, U256};

use crate::client::{CallRequest, ChainClient, TransactionRequest};
use crate::{ChainError, Result};

/// Request and receipt polling behaviour
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Delay between receipt polls
    pub interval: Duration,
    /// Give up waiting for a receipt after this long
    pub receipt_timeout: Duration,
    /// Timeout of a single HTTP request
    pub request_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            receipt_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// `ChainClient` over an Ethereum node's JSON-RPC endpoint
#[derive(Debug, Clone)]
pub struct RpcProvider {
    endpoint: String,
    provider: Provider<Http>,
    settings: PollSettings,
}

impl RpcProvider {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_poll_settings(endpoint, PollSettings::default())
    }

    pub fn with_poll_settings(endpoint: &str, settings: PollSettings) -> Result<Self> {
        let url = reqwest::Url::parse(endpoint).map_err(|e| ChainError::Transport {
            message: format!("invalid provider uri {}: {}", endpoint, e),
        })?;
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        let provider = Provider::new(Http::new_with_client(url, client)).interval(settings.interval);

        Ok(Self {
            endpoint: endpoint.to_string(),
            provider,
            settings,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChainClient for RpcProvider {
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxReceipt> {
        let mut request = ethers::types::TransactionRequest::new()
            .from(tx.from)
            .to(tx.to)
            .value(tx.value)
            .data(tx.data);
        if let Some(gas) = tx.gas {
            request = request.gas(gas);
        }

        let pending = self
            .provider
            .send_transaction(request, None)
            .await
            .map_err(provider_error)?;
        let tx_hash = *pending;
        tracing::info!(tx_hash = ?tx_hash, from = ?tx.from, to = ?tx.to, "transaction broadcast");

        let receipt = tokio::time::timeout(self.settings.receipt_timeout, pending.interval(self.settings.interval))
            .await
            .map_err(|_| ChainError::ReceiptTimeout {
                tx_hash,
                seconds: self.settings.receipt_timeout.as_secs(),
            })?
            .map_err(provider_error)?
            .ok_or(ChainError::Dropped { tx_hash })?;
        Ok(into_receipt(receipt))
    }

    async fn call(&self, call: CallRequest) -> Result<Bytes> {
        let mut request = ethers::types::TransactionRequest::new().to(call.to).data(call.data);
        if let Some(from) = call.from {
            request = request.from(from);
        }
        let tx: TypedTransaction = request.into();
        self.provider.call(&tx, None).await.map_err(provider_error)
    }

    async fn block_timestamp(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(provider_error)?
            .ok_or_else(|| ChainError::InvalidResponse {
                message: "node returned no latest block".to_string(),
            })?;
        if block.timestamp > U256::from(u64::MAX) {
            return Err(ChainError::InvalidResponse {
                message: format!("block timestamp {} exceeds 64 bits", block.timestamp),
            });
        }
        Ok(block.timestamp.low_u64())
    }

    async fn block_number(&self) -> Result<u64> {
        let number = self.provider.get_block_number().await.map_err(provider_error)?;
        Ok(number.as_u64())
    }

    async fn balance(&self, account: &Address) -> Result<U256> {
        self.provider
            .get_balance(*account, None)
            .await
            .map_err(provider_error)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.provider.get_accounts().await.map_err(provider_error)
    }
}

fn into_receipt(receipt: TransactionReceipt) -> TxReceipt {
    // Pre-Byzantium receipts carry no status; a mined transaction counts as applied
    let status = receipt
        .status
        .map_or(TxStatus::Success, |code| TxStatus::from_code(code.as_u64()));
    TxReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|n| n.as_u64()).unwrap_or_default(),
        from: receipt.from,
        to: receipt.to,
        status,
        gas_used: receipt.gas_used.map(|gas| gas.low_u64()).unwrap_or_default(),
        revert_reason: None,
    }
}

fn provider_error(e: ProviderError) -> ChainError {
    match e.as_error_response() {
        Some(response) => rpc_error(response.code, response.message.clone()),
        None => ChainError::Provider { message: e.to_string() },
    }
}

/// Nodes report reverts as JSON-RPC errors; surface those as reverts
fn rpc_error(code: i64, message: String) -> ChainError {
    if message.to_lowercase().contains("revert") {
        ChainError::Reverted { reason: message }
    } else {
        ChainError::Rpc { code, message }
    }
}
