//! Token economics of a WorkLock round
//!
//! These are deployment parameters: they are fixed when the WorkLock and
//! StakingEscrow contracts are deployed and every conversion the contracts
//! perform depends on them.

use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::{nu, Result, ValidationError};

/// Denominator of the boosting refund rate
pub const SLOWING_REFUND: u64 = 100;

/// Deployment parameters of a WorkLock round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEconomics {
    /// Smallest stake StakingEscrow accepts from a staker (NuNits). Stakes
    /// deposited by WorkLock on claim are exempt.
    pub minimum_allowed_locked: U256,
    /// Largest stake StakingEscrow accepts (NuNits)
    pub maximum_allowed_locked: U256,
    /// Tokens allocated to WorkLock for distribution (NuNits)
    pub worklock_supply: U256,
    /// Length of the bidding window in seconds
    pub bidding_duration: u64,
    pub hours_per_period: u16,
    /// Periods a claimed stake stays locked
    pub worklock_commitment_duration: u16,
    /// Work owed per token, scaled by `SLOWING_REFUND`
    pub worklock_boosting_refund_rate: u64,
    /// Smallest accepted bid (wei)
    pub min_allowed_bid: U256,
}

impl TokenEconomics {
    /// Economics used by the tester chain and the test suite
    pub fn test() -> Self {
        Self {
            minimum_allowed_locked: nu(15_000),
            maximum_allowed_locked: nu(4_000_000),
            worklock_supply: nu(1_000_000),
            bidding_duration: 60 * 60,
            hours_per_period: 24,
            worklock_commitment_duration: 60,
            worklock_boosting_refund_rate: 50,
            min_allowed_bid: U256::one(),
        }
    }

    pub fn seconds_per_period(&self) -> u64 {
        u64::from(self.hours_per_period) * 60 * 60
    }

    /// Period containing the timestamp
    pub fn period_at(&self, timestamp: u64) -> u64 {
        timestamp / self.seconds_per_period()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(ValidationError::InvalidEconomics {
                reason: reason.to_string(),
            })
        };
        if self.hours_per_period == 0 {
            return invalid("hours_per_period must be positive");
        }
        if self.bidding_duration == 0 {
            return invalid("bidding_duration must be positive");
        }
        if self.worklock_commitment_duration == 0 {
            return invalid("worklock_commitment_duration must be positive");
        }
        if self.minimum_allowed_locked > self.maximum_allowed_locked {
            return invalid("minimum_allowed_locked exceeds maximum_allowed_locked");
        }
        if self.worklock_supply.is_zero() {
            return invalid("worklock_supply must be positive");
        }
        // A single bidder may end up with the whole supply
        if self.worklock_supply > self.maximum_allowed_locked {
            return invalid("worklock_supply exceeds maximum_allowed_locked");
        }
        if self.min_allowed_bid.is_zero() {
            return invalid("min_allowed_bid must be positive");
        }
        Ok(())
    }
}

impl Default for TokenEconomics {
    fn default() -> Self {
        Self::test()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_economics_are_valid() {
        let economics = TokenEconomics::test();
        assert!(economics.validate().is_ok());
        assert_eq!(economics.seconds_per_period(), 86_400);
        assert_eq!(economics.period_at(86_400 * 3 + 5), 3);
    }

    #[test]
    fn test_inverted_stake_bounds_rejected() {
        let economics = TokenEconomics {
            minimum_allowed_locked: nu(10),
            maximum_allowed_locked: nu(1),
            ..TokenEconomics::test()
        };
        assert!(matches!(
            economics.validate(),
            Err(ValidationError::InvalidEconomics { .. })
        ));
    }

    #[test]
    fn test_supply_above_maximum_stake_rejected() {
        let economics = TokenEconomics {
            worklock_supply: nu(4_000_001),
            ..TokenEconomics::test()
        };
        assert!(economics.validate().is_err());
    }
}
