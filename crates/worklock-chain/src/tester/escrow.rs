//! StakingEscrow rules on the tester chain
//!
//! Holds locked stakes as sub-stakes spanning a range of periods. WorkLock
//! deposits into it on claim; everything else here is read-only.

use std::collections::HashMap;

use ethers::abi::Token;
use worklock_types::{Address, TokenEconomics, U256};

use crate::interface::{encode_output, ContractInterface};

use super::{arg_address, arg_uint, Revert};

#[derive(Debug, Clone)]
struct SubStake {
    first_period: u64,
    last_period: u64,
    locked_value: U256,
}

#[derive(Debug, Clone, Default)]
struct StakerInfo {
    value: U256,
    sub_stakes: Vec<SubStake>,
}

#[derive(Debug, Clone)]
pub(crate) struct StakingEscrowContract {
    pub address: Address,
    maximum_allowed_locked: U256,
    seconds_per_period: u64,
    stakers: HashMap<Address, StakerInfo>,
}

impl StakingEscrowContract {
    pub fn deploy(address: Address, economics: &TokenEconomics) -> Self {
        Self {
            address,
            maximum_allowed_locked: economics.maximum_allowed_locked,
            seconds_per_period: economics.seconds_per_period(),
            stakers: HashMap::new(),
        }
    }

    pub fn current_period(&self, now: u64) -> u64 {
        now / self.seconds_per_period
    }

    /// Lock `value` claimed from WorkLock for `periods` periods starting with
    /// the next one. WorkLock stakes skip the minimum stake size; the
    /// maximum still applies.
    pub fn deposit_from_worklock(&mut self, staker: Address, value: U256, periods: u16, now: u64) -> Result<(), Revert> {
        if value.is_zero() {
            return Err(Revert::new("Stake must be positive"));
        }
        let info = self.stakers.entry(staker).or_default();
        let total = info.value.checked_add(value).ok_or_else(|| Revert::new("Stake overflow"))?;
        if total > self.maximum_allowed_locked {
            return Err(Revert::new("Stake is out of allowed bounds"));
        }

        let current = now / self.seconds_per_period;
        info.value = total;
        info.sub_stakes.push(SubStake {
            first_period: current + 1,
            last_period: current + u64::from(periods),
            locked_value: value,
        });
        Ok(())
    }

    pub fn locked_tokens(&self, staker: &Address, period: u64) -> U256 {
        self.stakers.get(staker).map_or_else(U256::zero, |info| {
            info.sub_stakes
                .iter()
                .filter(|s| s.first_period <= period && period <= s.last_period)
                .fold(U256::zero(), |acc, s| acc + s.locked_value)
        })
    }

    pub fn all_tokens(&self, staker: &Address) -> U256 {
        self.stakers.get(staker).map(|info| info.value).unwrap_or_default()
    }

    pub fn call(&self, interface: &ContractInterface, data: &[u8], now: u64) -> Result<Vec<u8>, Revert> {
        let (function, args) = interface.decode_call(data)?;
        let output = match function.name.as_str() {
            "getLockedTokens" => {
                let staker = arg_address(&args, 0)?;
                let periods = arg_uint(&args, 1)?;
                if periods > U256::from(u16::MAX) {
                    return Err(Revert::new("Periods must fit in uint16"));
                }
                let period = self.current_period(now) + periods.low_u64();
                Token::Uint(self.locked_tokens(&staker, period))
            }
            "getAllTokens" => Token::Uint(self.all_tokens(&arg_address(&args, 0)?)),
            "getCurrentPeriod" => Token::Uint(U256::from(self.current_period(now))),
            other => return Err(Revert::not_callable(other)),
        };
        Ok(encode_output(&[output]))
    }
}
