//! Terminal output for WorkLock commands
//!
//! Every command prints a banner, then aligned `label  value` fields, then an
//! outcome line. Amounts always carry their unit and addresses are always
//! printed in checksum form.

use colored::*;
use worklock_types::{checksum, format_amount, Address, TxReceipt, TxStatus, U256};

/// Width of the label column
const LABEL_WIDTH: usize = 22;

/// `WorkLock › Bid` banner with an underline sized to the title
pub fn banner(title: &str) {
    let text = format!("WorkLock › {}", title);
    println!();
    println!("{}", text.bright_white().bold());
    println!("{}", "─".repeat(text.chars().count()).bright_black());
}

/// Aligned label and value
pub fn field(label: &str, value: &str) {
    println!("  {} {}", pad_label(label).bright_black(), value.bright_cyan());
}

fn pad_label(label: &str) -> String {
    format!("{:<width$}", label, width = LABEL_WIDTH)
}

pub fn confirmed(message: &str) {
    println!("  {} {}", "[ok]".bright_green().bold(), message);
}

pub fn reverted(message: &str) {
    println!("  {} {}", "[reverted]".bright_red().bold(), message.bright_red());
}

pub fn notice(message: &str) {
    println!("  {} {}", "[note]".bright_blue(), message);
}

pub fn caution(message: &str) {
    println!("  {} {}", "[!]".yellow().bold(), message.yellow());
}

/// Wei as ETH
pub fn eth(value: U256) -> String {
    format!("{} ETH", format_amount(value))
}

/// NuNits as NU
pub fn nu(value: U256) -> String {
    format!("{} NU", format_amount(value))
}

pub fn address(address: &Address) -> String {
    checksum(address)
}

/// Mined transaction fields
pub fn receipt(receipt: &TxReceipt) {
    let status = match receipt.status {
        TxStatus::Success => "mined".to_string(),
        TxStatus::Reverted => format!("reverted (status {})", receipt.status.code()),
    };
    field("Transaction", &receipt.tx_hash_hex());
    field("Block", &format!("#{}", receipt.block_number));
    field("Status", &status);
    field("Gas used", &receipt.gas_used.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use worklock_types::ether;

    #[test]
    fn test_amounts_carry_units() {
        assert_eq!(eth(ether(12) + ether(1) / 2), "12.5 ETH");
        assert_eq!(nu(U256::zero()), "0 NU");
    }

    #[test]
    fn test_labels_are_aligned() {
        assert_eq!(pad_label("Bidder").len(), LABEL_WIDTH);
        assert_eq!(pad_label("Locked (next period)").len(), LABEL_WIDTH);
    }

    #[test]
    fn test_addresses_are_checksummed() {
        let parsed = worklock_types::parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(address(&parsed), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }
}
