//! Contract registry
//!
//! Resolves contract names (and optionally versions) to deployed addresses.
//! A registry is immutable once built; its id is a digest of its entries so
//! two registries with the same contents share agents in a `ContractAgency`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use worklock_types::Address;

use crate::{ChainError, Result};

/// One deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub contract_name: String,
    pub contract_version: String,
    pub address: Address,
}

/// Content digest identifying a registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistryId(pub String);

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ContractRegistry {
    entries: Vec<RegistryEntry>,
    id: RegistryId,
}

impl ContractRegistry {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for entry in &entries {
            hasher.update(entry.contract_name.as_bytes());
            hasher.update(&[0]);
            hasher.update(entry.contract_version.as_bytes());
            hasher.update(&[0]);
            hasher.update(entry.address.as_bytes());
        }
        let id = RegistryId(hasher.finalize().to_hex()[..16].to_string());
        Self { entries, id }
    }

    /// Load a registry from a JSON array of entries
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ChainError::Registry {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<RegistryEntry> =
            serde_json::from_str(json).map_err(|e| ChainError::Registry {
                message: format!("malformed registry: {}", e),
            })?;
        Ok(Self::new(entries))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn id(&self) -> &RegistryId {
        &self.id
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Find a contract by name. Without a version the most recently
    /// registered entry wins.
    pub fn search(&self, name: &str, version: Option<&str>) -> Result<&RegistryEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.contract_name == name && version.map_or(true, |v| e.contract_version == v))
            .ok_or_else(|| ChainError::ContractNotRegistered {
                name: name.to_string(),
                version: version.unwrap_or("latest").to_string(),
            })
    }
}
