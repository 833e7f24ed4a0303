//! Account and contract addresses
//!
//! `Address` is the `ethers` 20-byte hash type. Its `Display` abbreviates, so
//! anything shown to a user goes through [`checksum`]. Parsing is strict:
//! `0x` followed by 40 hex digits, and mixed-case input must carry a valid
//! EIP-55 checksum.

use std::str::FromStr;

use ethers::types::Address;
use ethers::utils::to_checksum;

use crate::{Result, ValidationError};

/// EIP-55 mixed-case encoding, `0x`-prefixed
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

/// Parse an address, validating its checksum when the input is mixed-case.
///
/// All-lowercase and all-uppercase input carries no checksum and is accepted.
pub fn parse_address(input: &str) -> Result<Address> {
    let invalid = |reason: &str| ValidationError::InvalidAddress {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| invalid("missing 0x prefix"))?;
    if digits.len() != 40 {
        return Err(invalid("expected 40 hex characters"));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("not a hex string"));
    }
    let address = Address::from_str(digits).map_err(|e| invalid(&e.to_string()))?;

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let expected = checksum(&address);
        if &expected[2..] != digits {
            return Err(ValidationError::ChecksumMismatch {
                input: input.to_string(),
                expected,
            });
        }
    }
    Ok(address)
}

/// Parse an address that must be written in its exact checksum form
pub fn parse_checksum_address(input: &str) -> Result<Address> {
    let address = parse_address(input)?;
    let expected = checksum(&address);
    if expected != input {
        return Err(ValidationError::ChecksumMismatch {
            input: input.to_string(),
            expected,
        });
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_checksum_vectors() {
        for vector in CHECKSUMMED {
            let address = parse_address(vector).unwrap();
            assert_eq!(checksum(&address), vector);
            assert_eq!(parse_checksum_address(vector).unwrap(), address);
        }
    }

    #[test]
    fn test_single_case_input_accepted() {
        let lower = CHECKSUMMED[0].to_lowercase();
        let upper = format!("0x{}", CHECKSUMMED[0][2..].to_uppercase());
        let a = parse_address(&lower).unwrap();
        assert_eq!(a, parse_address(&upper).unwrap());
        assert_eq!(checksum(&a), CHECKSUMMED[0]);

        // Strict parsing wants the checksum form itself
        assert!(matches!(
            parse_checksum_address(&lower),
            Err(ValidationError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let bad = "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert!(matches!(
            parse_address(bad),
            Err(ValidationError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(parse_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
        assert!(parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeA").is_err());
        assert!(parse_address("0xZZAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
    }
}
