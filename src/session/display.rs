//! Display helpers for wallet details

use crate::wallet::Balance;

/// Human readable network name for an EIP-155 chain id
pub fn network_name(chain_id: &str) -> String {
    let name = match chain_id.to_lowercase().as_str() {
        "0x1" => "Ethereum Mainnet",
        "0x3" => "Ropsten Testnet",
        "0x4" => "Rinkeby Testnet",
        "0x5" => "Goerli Testnet",
        "0x89" => "Polygon Mainnet",
        "0x13881" => "Polygon Mumbai Testnet",
        _ => return format!("Unknown network ({})", chain_id),
    };
    name.to_string()
}

/// "0xABCD...1234" form of an address
pub fn short_address(address: &str) -> String {
    if address.len() < 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Ether balance with 4 decimals, "0.0000" when unknown
pub fn format_balance(balance: Option<Balance>) -> String {
    balance.unwrap_or_default().format_ether(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_name() {
        assert_eq!(network_name("0x1"), "Ethereum Mainnet");
        assert_eq!(network_name("0x89"), "Polygon Mainnet");
        assert_eq!(network_name("0x13881"), "Polygon Mumbai Testnet");
        assert_eq!(network_name("0xa4b1"), "Unknown network (0xa4b1)");
        assert_eq!(network_name(""), "Unknown network ()");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0xABCD00000000000000000000000000000000001234"),
            "0xABCD...1234"
        );
        assert_eq!(short_address("0xabc"), "0xabc");
        assert_eq!(short_address(""), "");
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance(None), "0.0000");
        assert_eq!(
            format_balance(Some(Balance(3_141_592_653_589_793_238))),
            "3.1416"
        );
    }
}
