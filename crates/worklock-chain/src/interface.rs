//! Contract interfaces
//!
//! Human-readable ABIs of the deployed contracts, parsed with `ethers::abi`.
//! Agents encode calls and decode return data through a `ContractInterface`;
//! the tester chain dispatches incoming calldata through the same one.

use ethers::abi::{self, Abi, Function, Token};
use thiserror::Error;

/// WorkLock contract
pub mod worklock {
    pub const CONTRACT_NAME: &str = "WorkLock";

    pub const ABI: &[&str] = &[
        "function bid() external payable",
        "function cancelBid() external returns (uint256)",
        "function claim() external returns (uint256)",
        "function workInfo(address bidder) external view returns (uint256, bool)",
        "function getRemainingWork(address bidder) external view returns (uint256)",
        "function ethSupply() external view returns (uint256)",
        "function tokenSupply() external view returns (uint256)",
        "function startBidDate() external view returns (uint256)",
        "function endBidDate() external view returns (uint256)",
        "function ethToTokens(uint256 ethAmount) external view returns (uint256)",
        "function ethToWork(uint256 ethAmount) external view returns (uint256)",
    ];
}

/// StakingEscrow contract
pub mod staking_escrow {
    pub const CONTRACT_NAME: &str = "StakingEscrow";

    pub const ABI: &[&str] = &[
        "function getLockedTokens(address staker, uint16 periods) external view returns (uint256)",
        "function getAllTokens(address staker) external view returns (uint256)",
        "function getCurrentPeriod() external view returns (uint16)",
    ];
}

/// Token contract
pub mod token {
    pub const CONTRACT_NAME: &str = "NuCypherToken";

    pub const ABI: &[&str] = &["function balanceOf(address account) external view returns (uint256)"];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceError {
    #[error("No interface known for contract {name}")]
    UnknownContract { name: String },

    #[error("Malformed ABI for {contract}: {message}")]
    Parse { contract: String, message: String },

    #[error("{contract} has no function {function}")]
    UnknownFunction { contract: String, function: String },

    #[error("{contract} has no function with selector 0x{selector}")]
    UnknownSelector { contract: String, selector: String },

    #[error("Calldata shorter than a selector ({len} bytes)")]
    MissingSelector { len: usize },

    #[error("Cannot encode or decode {function}: {message}")]
    Codec { function: String, message: String },
}

pub type Result<T> = std::result::Result<T, InterfaceError>;

/// The parsed ABI of one contract
#[derive(Debug, Clone)]
pub struct ContractInterface {
    name: &'static str,
    abi: Abi,
}

impl ContractInterface {
    /// Interface of a registered contract name
    pub fn for_contract(name: &str) -> Result<Self> {
        match name {
            worklock::CONTRACT_NAME => Self::parse(worklock::CONTRACT_NAME, worklock::ABI),
            staking_escrow::CONTRACT_NAME => Self::parse(staking_escrow::CONTRACT_NAME, staking_escrow::ABI),
            token::CONTRACT_NAME => Self::parse(token::CONTRACT_NAME, token::ABI),
            other => Err(InterfaceError::UnknownContract {
                name: other.to_string(),
            }),
        }
    }

    pub fn parse(name: &'static str, signatures: &[&str]) -> Result<Self> {
        let abi = abi::parse_abi(signatures).map_err(|e| InterfaceError::Parse {
            contract: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { name, abi })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn function(&self, function: &str) -> Result<&Function> {
        self.abi
            .function(function)
            .map_err(|_| InterfaceError::UnknownFunction {
                contract: self.name.to_string(),
                function: function.to_string(),
            })
    }

    /// Selector followed by the encoded arguments
    pub fn encode_call(&self, function: &str, args: &[Token]) -> Result<Vec<u8>> {
        self.function(function)?
            .encode_input(args)
            .map_err(|e| codec_error(function, e))
    }

    /// Resolve calldata to its function and decoded arguments
    pub fn decode_call(&self, calldata: &[u8]) -> Result<(&Function, Vec<Token>)> {
        if calldata.len() < 4 {
            return Err(InterfaceError::MissingSelector { len: calldata.len() });
        }
        let (selector, args) = calldata.split_at(4);
        let function = self
            .abi
            .functions()
            .find(|f| f.short_signature()[..] == *selector)
            .ok_or_else(|| InterfaceError::UnknownSelector {
                contract: self.name.to_string(),
                selector: hex::encode(selector),
            })?;
        let tokens = function
            .decode_input(args)
            .map_err(|e| codec_error(&function.name, e))?;
        Ok((function, tokens))
    }

    pub fn decode_output(&self, function: &str, data: &[u8]) -> Result<Vec<Token>> {
        self.function(function)?
            .decode_output(data)
            .map_err(|e| codec_error(function, e))
    }
}

/// ABI-encode return values
pub fn encode_output(tokens: &[Token]) -> Vec<u8> {
    abi::encode(tokens)
}

fn codec_error(function: &str, e: abi::Error) -> InterfaceError {
    InterfaceError::Codec {
        function: function.to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Address, U256};

    #[test]
    fn test_interfaces_parse() {
        for name in [worklock::CONTRACT_NAME, staking_escrow::CONTRACT_NAME, token::CONTRACT_NAME] {
            assert_eq!(ContractInterface::for_contract(name).unwrap().name(), name);
        }
        assert!(matches!(
            ContractInterface::for_contract("PolicyManager"),
            Err(InterfaceError::UnknownContract { .. })
        ));
    }

    #[test]
    fn test_known_selectors() {
        let token = ContractInterface::for_contract(token::CONTRACT_NAME).unwrap();
        assert_eq!(hex::encode(token.function("balanceOf").unwrap().short_signature()), "70a08231");

        let escrow = ContractInterface::for_contract(staking_escrow::CONTRACT_NAME).unwrap();
        assert_eq!(
            escrow.function("getLockedTokens").unwrap().signature(),
            "getLockedTokens(address,uint16)"
        );
    }

    #[test]
    fn test_call_dispatch() {
        let escrow = ContractInterface::for_contract(staking_escrow::CONTRACT_NAME).unwrap();
        let staker = Address::repeat_byte(0x5a);
        let data = escrow
            .encode_call("getLockedTokens", &[Token::Address(staker), Token::Uint(U256::from(10))])
            .unwrap();
        assert_eq!(data.len(), 4 + 64);

        let (function, args) = escrow.decode_call(&data).unwrap();
        assert_eq!(function.name, "getLockedTokens");
        assert_eq!(args, vec![Token::Address(staker), Token::Uint(U256::from(10))]);
    }

    #[test]
    fn test_bad_calldata() {
        let worklock = ContractInterface::for_contract(worklock::CONTRACT_NAME).unwrap();
        assert_eq!(
            worklock.decode_call(&[1, 2]).unwrap_err(),
            InterfaceError::MissingSelector { len: 2 }
        );
        assert!(matches!(
            worklock.decode_call(&[0xde, 0xad, 0xbe, 0xef]),
            Err(InterfaceError::UnknownSelector { .. })
        ));
        // Wrong argument type
        assert!(matches!(
            worklock.encode_call("getRemainingWork", &[Token::Bool(true)]),
            Err(InterfaceError::Codec { .. })
        ));
    }

    #[test]
    fn test_tuple_output() {
        let worklock = ContractInterface::for_contract(worklock::CONTRACT_NAME).unwrap();
        let data = encode_output(&[Token::Uint(U256::from(42)), Token::Bool(true)]);
        let tokens = worklock.decode_output("workInfo", &data).unwrap();
        assert_eq!(tokens, vec![Token::Uint(U256::from(42)), Token::Bool(true)]);
    }
}
