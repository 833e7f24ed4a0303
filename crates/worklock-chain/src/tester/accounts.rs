//! Deterministic tester accounts
//!
//! Each account is the address of a secp256k1 key derived from its index, so
//! the same index yields the same address on every run.

use ethers::utils::{get_contract_address, secret_key_to_address};
use k256::ecdsa::SigningKey;
use worklock_types::Address;

use crate::{ChainError, Result};

const ACCOUNT_SEED_CONTEXT: &str = "worklock tester chain account seed v1";

/// Address of the tester account at `index`
pub fn derive_account(index: u32) -> Result<Address> {
    let seed = blake3::derive_key(ACCOUNT_SEED_CONTEXT, &index.to_le_bytes());
    let key = SigningKey::from_bytes((&seed).into()).map_err(|e| ChainError::InvalidResponse {
        message: format!("cannot derive tester key {}: {}", index, e),
    })?;
    Ok(secret_key_to_address(&key))
}

/// Address of a contract deployed by `deployer` with `nonce`
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    get_contract_address(*deployer, nonce)
}
