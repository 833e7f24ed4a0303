//! Amounts in base units
//!
//! ETH is counted in wei and NU in NuNits, both with 18 decimals. Values in a
//! WorkLock round routinely exceed `u128` once multiplied, so everything is a
//! 256-bit `U256`.

use ethers::types::U256;
use ethers::utils::{self, ParseUnits};

use crate::{Result, ValidationError};

/// Decimals of both ETH and NU
pub const DECIMALS: u32 = 18;

/// `whole` ether in wei
pub fn ether(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(DECIMALS as usize)
}

/// `whole` NU in NuNits
pub fn nu(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(DECIMALS as usize)
}

/// `a * b / denominator`, rounding down. `None` on overflow or zero denominator.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    a.checked_mul(b).map(|product| product / denominator)
}

/// `a * b / denominator`, rounding up. `None` on overflow or zero denominator.
pub fn mul_div_ceil(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = a.checked_mul(b)?;
    let quotient = product / denominator;
    if (product % denominator).is_zero() {
        Some(quotient)
    } else {
        quotient.checked_add(U256::one())
    }
}

/// Render a base-unit value as a decimal string, trimming trailing zeros.
///
/// `format_amount(1_500_000_000_000_000_000) == "1.5"`
pub fn format_amount(value: U256) -> String {
    match utils::format_units(value, DECIMALS) {
        Ok(formatted) if formatted.contains('.') => formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string(),
        Ok(formatted) => formatted,
        Err(_) => value.to_string(),
    }
}

/// Parse a decimal string (`"40000"`, `"0.25"`) into base units.
pub fn parse_amount(input: &str) -> Result<U256> {
    let invalid = |reason: String| ValidationError::InvalidAmount {
        input: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty amount".to_string()));
    }
    // Signs and exponents are not amounts
    if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid("only decimal digits and one '.' are allowed".to_string()));
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.contains('.') {
            return Err(invalid("only decimal digits and one '.' are allowed".to_string()));
        }
        if fraction.len() > DECIMALS as usize {
            return Err(invalid("too many decimal places".to_string()));
        }
    }

    match utils::parse_units(trimmed, DECIMALS) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(invalid("amount must not be negative".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(ether(40_300)), "40300");
        assert_eq!(format_amount(U256::from(1_500_000_000_000_000_000u128)), "1.5");
        assert_eq!(format_amount(U256::one()), "0.000000000000000001");
        assert_eq!(format_amount(U256::zero()), "0");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("40000").unwrap(), ether(40_000));
        assert_eq!(
            parse_amount("0.25").unwrap(),
            U256::from(250_000_000_000_000_000u128)
        );
        assert_eq!(parse_amount(" 12.5 ").unwrap(), ether(25) / 2);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("1.2.3").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("1e18").is_err());
        assert!(parse_amount("0.0000000000000000001").is_err());
    }

    #[test]
    fn test_mul_div_rounding() {
        let seven = U256::from(7);
        let two = U256::from(2);
        assert_eq!(mul_div(seven, U256::one(), two), Some(U256::from(3)));
        assert_eq!(mul_div_ceil(seven, U256::one(), two), Some(U256::from(4)));
        assert_eq!(mul_div_ceil(U256::from(8), U256::one(), two), Some(U256::from(4)));
        assert_eq!(mul_div(seven, seven, U256::zero()), None);
    }
}
