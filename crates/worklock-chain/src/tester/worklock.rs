//! WorkLock rules on the tester chain
//!
//! Bidders deposit ETH while the bidding window is open. After it closes,
//! each bid converts into tokens in proportion to its share of all ETH
//! deposited, and the tokens are locked in StakingEscrow.
//!
//! Per bidder: `NoBid -> Bidding -> {Cancelled | Claimed}`, both terminal.

use std::collections::HashMap;

use ethers::abi::Token;
use worklock_types::{mul_div, mul_div_ceil, Address, TokenEconomics, U256, SLOWING_REFUND};

use crate::interface::{encode_output, ContractInterface};
use crate::ledger::{Asset, Ledger};

use super::escrow::StakingEscrowContract;
use super::{arg_address, arg_uint, CallContext, Revert};

#[derive(Debug, Clone, Default)]
struct WorkInfo {
    deposited_eth: U256,
    claimed: bool,
    cancelled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct WorkLockContract {
    pub address: Address,
    token_supply: U256,
    start_bid_date: u64,
    end_bid_date: u64,
    min_allowed_bid: U256,
    boosting_refund: u64,
    commitment_duration: u16,
    eth_supply: U256,
    work_info: HashMap<Address, WorkInfo>,
}

impl WorkLockContract {
    pub fn deploy(address: Address, economics: &TokenEconomics, start_bid_date: u64) -> Self {
        Self {
            address,
            token_supply: economics.worklock_supply,
            start_bid_date,
            end_bid_date: start_bid_date + economics.bidding_duration,
            min_allowed_bid: economics.min_allowed_bid,
            boosting_refund: economics.worklock_boosting_refund_rate,
            commitment_duration: economics.worklock_commitment_duration,
            eth_supply: U256::zero(),
            work_info: HashMap::new(),
        }
    }

    fn bidding_open(&self, now: u64) -> bool {
        self.start_bid_date <= now && now < self.end_bid_date
    }

    fn eth_to_tokens(&self, eth: U256) -> Result<U256, Revert> {
        if self.eth_supply.is_zero() {
            return Ok(U256::zero());
        }
        mul_div(eth, self.token_supply, self.eth_supply).ok_or_else(Revert::overflow)
    }

    fn eth_to_work(&self, eth: U256) -> Result<U256, Revert> {
        if self.eth_supply.is_zero() {
            return Ok(U256::zero());
        }
        let numerator = eth.checked_mul(self.token_supply).ok_or_else(Revert::overflow)?;
        let denominator = self
            .eth_supply
            .checked_mul(U256::from(SLOWING_REFUND))
            .ok_or_else(Revert::overflow)?;
        mul_div_ceil(numerator, U256::from(self.boosting_refund), denominator)
            .ok_or_else(Revert::overflow)
    }

    fn remaining_work(&self, bidder: &Address) -> Result<U256, Revert> {
        match self.work_info.get(bidder) {
            Some(info) if !info.claimed && !info.deposited_eth.is_zero() => {
                self.eth_to_work(info.deposited_eth)
            }
            _ => Ok(U256::zero()),
        }
    }

    /// Execute a state-changing call. `ctx.value` has already been moved
    /// from the sender to this contract.
    pub fn execute(
        &mut self,
        ctx: &CallContext,
        interface: &ContractInterface,
        data: &[u8],
        escrow: &mut StakingEscrowContract,
        ledger: &mut Ledger,
    ) -> Result<Vec<u8>, Revert> {
        let (function, _) = interface.decode_call(data)?;
        match function.name.as_str() {
            "bid" => self.bid(ctx),
            "cancelBid" => {
                ctx.require_no_value()?;
                self.cancel_bid(ctx, ledger)
            }
            "claim" => {
                ctx.require_no_value()?;
                self.claim(ctx, escrow, ledger)
            }
            other => Err(Revert::not_a_transaction(other)),
        }
    }

    fn bid(&mut self, ctx: &CallContext) -> Result<Vec<u8>, Revert> {
        if !self.bidding_open(ctx.timestamp) {
            return Err(Revert::new("Bidding is not open"));
        }
        if ctx.value.is_zero() || ctx.value < self.min_allowed_bid {
            return Err(Revert::new("Bid must be at least the minimum allowed bid"));
        }

        let info = self.work_info.entry(ctx.sender).or_default();
        if info.cancelled {
            return Err(Revert::new("Bid was cancelled"));
        }
        info.deposited_eth = info
            .deposited_eth
            .checked_add(ctx.value)
            .ok_or_else(Revert::overflow)?;
        self.eth_supply = self
            .eth_supply
            .checked_add(ctx.value)
            .ok_or_else(Revert::overflow)?;

        Ok(Vec::new())
    }

    fn cancel_bid(&mut self, ctx: &CallContext, ledger: &mut Ledger) -> Result<Vec<u8>, Revert> {
        let window_open = self.bidding_open(ctx.timestamp);
        let info = self
            .work_info
            .get_mut(&ctx.sender)
            .ok_or_else(|| Revert::new("No bid to cancel"))?;
        if info.claimed {
            return Err(Revert::new("Tokens are already claimed"));
        }
        if info.deposited_eth.is_zero() {
            return Err(Revert::new("No bid to cancel"));
        }

        let refund = info.deposited_eth;
        info.deposited_eth = U256::zero();
        info.cancelled = true;
        // The supply is frozen once bidding closes.
        if window_open {
            self.eth_supply -= refund;
        }

        ledger.transfer(
            &self.address,
            &ctx.sender,
            Asset::Eth,
            refund,
            ctx.entry_reason(),
            ctx.block_number,
        )?;
        Ok(encode_output(&[Token::Uint(refund)]))
    }

    fn claim(
        &mut self,
        ctx: &CallContext,
        escrow: &mut StakingEscrowContract,
        ledger: &mut Ledger,
    ) -> Result<Vec<u8>, Revert> {
        if ctx.timestamp < self.end_bid_date {
            return Err(Revert::new("Bidding is not finished"));
        }
        let deposited = match self.work_info.get(&ctx.sender) {
            Some(info) if info.claimed => return Err(Revert::new("Tokens are already claimed")),
            Some(info) if !info.deposited_eth.is_zero() => info.deposited_eth,
            _ => return Err(Revert::new("No bid to claim")),
        };

        let tokens = self.eth_to_tokens(deposited)?;
        if tokens.is_zero() {
            return Err(Revert::new("No tokens to claim"));
        }

        ledger.transfer(
            &self.address,
            &escrow.address,
            Asset::Nu,
            tokens,
            ctx.entry_reason(),
            ctx.block_number,
        )?;
        escrow.deposit_from_worklock(ctx.sender, tokens, self.commitment_duration, ctx.timestamp)?;

        if let Some(info) = self.work_info.get_mut(&ctx.sender) {
            info.claimed = true;
        }
        Ok(encode_output(&[Token::Uint(tokens)]))
    }

    pub fn call(&self, interface: &ContractInterface, data: &[u8]) -> Result<Vec<u8>, Revert> {
        let (function, args) = interface.decode_call(data)?;
        let output = match function.name.as_str() {
            "workInfo" => {
                let info = self.work_info.get(&arg_address(&args, 0)?).cloned().unwrap_or_default();
                vec![Token::Uint(info.deposited_eth), Token::Bool(info.claimed)]
            }
            "getRemainingWork" => vec![Token::Uint(self.remaining_work(&arg_address(&args, 0)?)?)],
            "ethSupply" => vec![Token::Uint(self.eth_supply)],
            "tokenSupply" => vec![Token::Uint(self.token_supply)],
            "startBidDate" => vec![Token::Uint(U256::from(self.start_bid_date))],
            "endBidDate" => vec![Token::Uint(U256::from(self.end_bid_date))],
            "ethToTokens" => vec![Token::Uint(self.eth_to_tokens(arg_uint(&args, 0)?)?)],
            "ethToWork" => vec![Token::Uint(self.eth_to_work(arg_uint(&args, 0)?)?)],
            other => return Err(Revert::not_callable(other)),
        };
        Ok(encode_output(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EntryReason;
    use worklock_types::{ether, nu, TxHash};

    fn context(sender: Address, value: U256, timestamp: u64) -> CallContext {
        CallContext {
            sender,
            value,
            timestamp,
            block_number: 1,
            tx_hash: TxHash::zero(),
        }
    }

    fn deployed() -> (WorkLockContract, StakingEscrowContract, Ledger) {
        let economics = TokenEconomics::test();
        let worklock = WorkLockContract::deploy(Address::repeat_byte(0xaa), &economics, 1_000);
        let escrow = StakingEscrowContract::deploy(Address::repeat_byte(0xbb), &economics);
        let mut ledger = Ledger::new();
        ledger
            .credit(&worklock.address, Asset::Nu, economics.worklock_supply, EntryReason::Genesis, 0)
            .unwrap();
        (worklock, escrow, ledger)
    }

    #[test]
    fn test_window_edges() {
        let (worklock, _, _) = deployed();
        assert!(!worklock.bidding_open(999));
        assert!(worklock.bidding_open(1_000));
        assert!(worklock.bidding_open(1_000 + 3_599));
        assert!(!worklock.bidding_open(1_000 + 3_600));
    }

    #[test]
    fn test_single_bidder_gets_whole_supply() {
        let (mut worklock, mut escrow, mut ledger) = deployed();
        let bidder = Address::repeat_byte(1);

        worklock.bid(&context(bidder, ether(20_000), 1_000)).unwrap();

        // Half the supply, rounded up, is owed as work
        assert_eq!(worklock.remaining_work(&bidder).unwrap(), worklock.token_supply / 2);

        let claimed = worklock
            .claim(&context(bidder, U256::zero(), 5_000), &mut escrow, &mut ledger)
            .unwrap();
        assert_eq!(claimed, encode_output(&[Token::Uint(worklock.token_supply)]));
        assert_eq!(ledger.balance(&escrow.address, Asset::Nu), worklock.token_supply);
        assert_eq!(worklock.remaining_work(&bidder).unwrap(), U256::zero());
    }

    #[test]
    fn test_small_share_still_claims() {
        let (mut worklock, mut escrow, mut ledger) = deployed();
        let small = Address::repeat_byte(1);
        let large = Address::repeat_byte(2);

        worklock.bid(&context(small, ether(150), 1_000)).unwrap();
        worklock.bid(&context(large, ether(400_000), 1_000)).unwrap();

        // Well under the 15,000 NU staker minimum
        let share = worklock.eth_to_tokens(ether(150)).unwrap();
        assert!(share < nu(15_000));

        worklock
            .claim(&context(small, U256::zero(), 5_000), &mut escrow, &mut ledger)
            .unwrap();
        assert_eq!(escrow.all_tokens(&small), share);
    }

    #[test]
    fn test_zero_bid_reverts() {
        let (mut worklock, _, _) = deployed();
        let result = worklock.bid(&context(Address::repeat_byte(1), U256::zero(), 1_500));
        assert!(result.is_err());
        assert!(worklock.eth_supply.is_zero());
    }
}
