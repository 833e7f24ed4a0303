//! Agent cache
//!
//! One agent per (agent type, registry) pair. Callers hold a
//! `ContractAgency` and pass it where agents are needed; lookups with the
//! same key hand back the same `Arc`.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use worklock_chain::{ChainClient, ContractRegistry, RegistryId};

use crate::{AgentError, ContractAgent, Result};

type CachedAgent = Arc<dyn Any + Send + Sync>;

pub struct ContractAgency {
    client: Arc<dyn ChainClient>,
    agents: DashMap<(TypeId, RegistryId), CachedAgent>,
}

impl ContractAgency {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self {
            client,
            agents: DashMap::new(),
        }
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// Get the cached agent for `registry`, creating it on first use
    pub fn get_agent<A: ContractAgent>(&self, registry: &ContractRegistry) -> Result<Arc<A>> {
        let key = (TypeId::of::<A>(), registry.id().clone());

        if let Some(cached) = self.agents.get(&key) {
            if let Ok(agent) = Arc::clone(cached.value()).downcast::<A>() {
                tracing::trace!(contract = A::CONTRACT_NAME, registry = %key.1, "agent cache hit");
                return Ok(agent);
            }
        }

        let created: CachedAgent = Arc::new(A::new(Arc::clone(&self.client), registry)?);
        tracing::debug!(contract = A::CONTRACT_NAME, registry = %key.1, "agent created");

        // A concurrent caller may have inserted first; keep whichever landed.
        let stored = Arc::clone(self.agents.entry(key).or_insert(created).value());
        stored
            .downcast::<A>()
            .map_err(|_| AgentError::AgencyTypeMismatch {
                contract: A::CONTRACT_NAME,
            })
    }

    /// Number of cached agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StakingEscrowAgent, WorkLockAgent};
    use worklock_chain::TesterChain;

    #[test]
    fn test_same_key_shares_instance() {
        let chain = Arc::new(TesterChain::with_test_economics().unwrap());
        let registry = chain.registry();
        let agency = ContractAgency::new(chain);

        let first = agency.get_agent::<WorkLockAgent>(&registry).unwrap();
        let second = agency.get_agent::<WorkLockAgent>(&registry).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let escrow = agency.get_agent::<StakingEscrowAgent>(&registry).unwrap();
        assert_ne!(escrow.contract_address(), first.contract_address());
        assert_eq!(agency.len(), 2);
    }

    #[test]
    fn test_missing_contract_is_not_cached() {
        let chain = Arc::new(TesterChain::with_test_economics().unwrap());
        let agency = ContractAgency::new(chain);
        let empty = ContractRegistry::new(Vec::new());

        assert!(agency.get_agent::<WorkLockAgent>(&empty).is_err());
        assert!(agency.is_empty());
    }

    #[test]
    fn test_foreign_cache_entry_is_reported() {
        let chain = Arc::new(TesterChain::with_test_economics().unwrap());
        let registry = chain.registry();
        let agency = ContractAgency::new(chain);
        agency.agents.insert(
            (TypeId::of::<WorkLockAgent>(), registry.id().clone()),
            Arc::new(42u32),
        );

        assert!(matches!(
            agency.get_agent::<WorkLockAgent>(&registry),
            Err(AgentError::AgencyTypeMismatch { contract: "WorkLock" })
        ));
    }
}
