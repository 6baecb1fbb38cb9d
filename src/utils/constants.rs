//! Constants Module - Single Source of Truth
//!
//! Every chain constant, conversion helper and heuristic threshold used
//! across the crate lives here. No hardcoded values in other modules.

use alloy_primitives::{Address, U256};
use std::str::FromStr;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "RusterTrace";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = "RusterTrace/0.1.0";

// ============================================
// PROVIDER CONSTANTS
// ============================================

/// Default timeout for explorer requests (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Default explorer response cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Expired cache entries are swept once every this many inserts
pub const CACHE_CLEANUP_EVERY: u64 = 128;

/// Free-tier explorer keys allow 5 calls per second
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

/// Retry attempts on retryable provider errors
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base retry delay in milliseconds (doubles each attempt)
pub const BASE_RETRY_MS: u64 = 500;

/// Retry delay cap in milliseconds
pub const MAX_RETRY_MS: u64 = 8000;

/// Jitter percentage applied to retry delays
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Page size for full history requests
pub const EXPLORER_PAGE_SIZE: u32 = 1000;

/// Upper block bound for account queries (resolved by the explorer)
pub const EXPLORER_END_BLOCK: &str = "latest";

/// Transactions scanned when looking for the first funder
pub const FIRST_FUNDER_SCAN_SIZE: u32 = 25;

// ============================================
// CHAIN IDS - Single Source of Truth
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// Linea
pub const CHAIN_ID_LINEA: u64 = 59144;
/// Arbitrum One
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
/// Base
pub const CHAIN_ID_BASE: u64 = 8453;
/// Optimism
pub const CHAIN_ID_OPTIMISM: u64 = 10;
/// Polygon
pub const CHAIN_ID_POLYGON: u64 = 137;

/// All known chain IDs
pub const SUPPORTED_CHAIN_IDS: [u64; 6] = [
    CHAIN_ID_ETHEREUM,
    CHAIN_ID_LINEA,
    CHAIN_ID_ARBITRUM,
    CHAIN_ID_BASE,
    CHAIN_ID_OPTIMISM,
    CHAIN_ID_POLYGON,
];

// ============================================
// CHAIN METADATA
// ============================================

/// Get chain name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_LINEA => "Linea",
        CHAIN_ID_ARBITRUM => "Arbitrum One",
        CHAIN_ID_BASE => "Base",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_POLYGON => "Polygon",
        _ => "Unknown",
    }
}

/// Get native token symbol
pub fn get_native_symbol(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_POLYGON => "MATIC",
        _ => "ETH",
    }
}

/// Get block explorer URL
pub fn get_explorer_url(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "https://etherscan.io",
        CHAIN_ID_LINEA => "https://lineascan.build",
        CHAIN_ID_ARBITRUM => "https://arbiscan.io",
        CHAIN_ID_BASE => "https://basescan.org",
        CHAIN_ID_OPTIMISM => "https://optimistic.etherscan.io",
        CHAIN_ID_POLYGON => "https://polygonscan.com",
        _ => "https://etherscan.io",
    }
}

/// Get Etherscan-compatible API endpoint
pub fn get_explorer_api_url(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("https://api.etherscan.io/api"),
        CHAIN_ID_LINEA => Some("https://api.lineascan.build/api"),
        CHAIN_ID_ARBITRUM => Some("https://api.arbiscan.io/api"),
        CHAIN_ID_BASE => Some("https://api.basescan.org/api"),
        CHAIN_ID_OPTIMISM => Some("https://api-optimistic.etherscan.io/api"),
        CHAIN_ID_POLYGON => Some("https://api.polygonscan.com/api"),
        _ => None,
    }
}

/// Environment variable holding the explorer key for a chain
pub fn get_api_key_env(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("ETHERSCAN_API_KEY"),
        CHAIN_ID_LINEA => Some("LINEASCAN_API_KEY"),
        CHAIN_ID_ARBITRUM => Some("ARBISCAN_API_KEY"),
        CHAIN_ID_BASE => Some("BASESCAN_API_KEY"),
        CHAIN_ID_OPTIMISM => Some("OPTIMISM_API_KEY"),
        CHAIN_ID_POLYGON => Some("POLYGONSCAN_API_KEY"),
        _ => None,
    }
}

/// Optimism and Polygon explorers are not wired up yet
pub fn is_chain_enabled(chain_id: u64) -> bool {
    matches!(
        chain_id,
        CHAIN_ID_ETHEREUM | CHAIN_ID_LINEA | CHAIN_ID_ARBITRUM | CHAIN_ID_BASE
    )
}

/// Check if chain ID is known
#[inline]
pub fn is_chain_supported(chain_id: u64) -> bool {
    SUPPORTED_CHAIN_IDS.contains(&chain_id)
}

// ============================================
// FUNDING TREE
// ============================================

/// Children kept per funding node (top-K by value)
pub const MAX_CHILDREN_PER_NODE: usize = 10;

/// Builder default depth
pub const DEFAULT_TREE_DEPTH: u32 = 5;

/// Hard ceiling on depth, keeps recursion bounded
pub const MAX_TREE_DEPTH: u32 = 8;

/// Default depth for the common-ancestor search
pub const DEFAULT_ANCESTOR_DEPTH: u32 = 3;

/// Entries in the summary's top sources / destinations
pub const SUMMARY_TOP_COUNTERPARTIES: usize = 5;

/// Seconds per day
pub const SECONDS_PER_DAY: u64 = 86_400;

// ============================================
// DETECTOR THRESHOLDS
// ============================================

/// Fresh wallet: younger than this many days
pub const FRESH_WALLET_DAYS: u64 = 7;
/// Fresh wallet: at least this many transactions
pub const FRESH_WALLET_MIN_TXS: usize = 10;
/// Brand new wallet (same day) with heavy activity
pub const BRAND_NEW_WALLET_MIN_TXS: usize = 20;

/// Same-block group needs this many distinct counterparties
pub const SAME_BLOCK_MIN_COUNTERPARTIES: usize = 2;

/// Rapid movement: forward window in seconds
pub const RAPID_MOVEMENT_WINDOW_SECS: u64 = 600;
/// Rapid movement: fraction of the incoming value forwarded
pub const RAPID_MOVEMENT_MIN_RATIO: f64 = 0.5;

/// Dust: incoming value strictly below this (native units)
pub const DUST_THRESHOLD_ETH: f64 = 0.0001;
/// Dust: distinct senders required
pub const DUST_MIN_SENDERS: usize = 5;

/// Wash trading: minimum transfers each way with one counterparty
pub const WASH_MIN_TRANSFERS_EACH_WAY: usize = 3;
/// Wash trading: max relative difference between in and out totals
pub const WASH_MAX_IMBALANCE: f64 = 0.2;

/// Sybil fan-out: minimum direct recipients
pub const SYBIL_MIN_RECIPIENTS: usize = 5;
/// Sybil fan-out: max relative spread of recipient amounts
pub const SYBIL_MAX_AMOUNT_SPREAD: f64 = 0.1;
/// Single funder share of total inflow
pub const SYBIL_SINGLE_FUNDER_SHARE: f64 = 0.9;

/// Per-type cap when combining indicator scores
pub const RISK_CATEGORY_CAP: f64 = 40.0;

/// Sybil decision threshold on the correlation score
pub const SYBIL_CORRELATION_THRESHOLD: u8 = 60;

// ============================================
// CONVERSION UTILITIES - Single Source of Truth
// ============================================

/// Convert wei to ETH (or native token)
#[inline]
pub fn wei_to_eth(wei: U256) -> f64 {
    let wei_u128: u128 = wei.try_into().unwrap_or(u128::MAX);
    wei_u128 as f64 / 1e18
}

/// Parse a decimal wei string, unparseable input counts as zero
pub fn parse_wei(value: &str) -> U256 {
    U256::from_str_radix(value.trim(), 10).unwrap_or(U256::ZERO)
}

/// Parse a `0x` hex quantity (as returned by proxy endpoints)
pub fn parse_hex_quantity(value: &str) -> u64 {
    u64::from_str_radix(value.trim_start_matches("0x"), 16).unwrap_or(0)
}

/// Scale a raw token amount by its decimals
pub fn format_token_amount(raw: &str, decimals: u8) -> f64 {
    let raw_u128: u128 = parse_wei(raw).try_into().unwrap_or(u128::MAX);
    raw_u128 as f64 / 10f64.powi(decimals as i32)
}

/// Lowercase canonical form used as identity everywhere
#[inline]
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// EVM address check (0x + 40 hex chars)
pub fn is_valid_address(address: &str) -> bool {
    let trimmed = address.trim();
    trimmed.len() == 42 && trimmed.starts_with("0x") && Address::from_str(trimmed).is_ok()
}

/// `0x12345678...` form used in log lines
pub fn short_address(address: &str) -> &str {
    address.get(..10).unwrap_or(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wei_to_eth() {
        let one_eth = U256::from(1_000_000_000_000_000_000u128);
        assert!((wei_to_eth(one_eth) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_parse_wei() {
        assert_eq!(parse_wei("1500000000000000000"), U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(parse_wei("not-a-number"), U256::ZERO);
        assert_eq!(parse_wei(""), U256::ZERO);
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x1a"), 26);
        assert_eq!(parse_hex_quantity("0x"), 0);
    }

    #[test]
    fn test_format_token_amount() {
        assert!((format_token_amount("2500000", 6) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_address_validation() {
        assert!(is_valid_address("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"));
        assert!(!is_valid_address("0x7a250d5630"));
        assert!(!is_valid_address("7a250d5630B4cF539739dF2C5dAcb4c659F2488D00"));
        assert!(!is_valid_address("0xzz250d5630B4cF539739dF2C5dAcb4c659F2488D"));
    }

    #[test]
    fn test_chain_support() {
        assert!(is_chain_supported(CHAIN_ID_LINEA));
        assert!(is_chain_enabled(CHAIN_ID_BASE));
        assert!(!is_chain_enabled(CHAIN_ID_POLYGON));
        assert!(!is_chain_supported(999));
        assert!(get_explorer_api_url(999).is_none());
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("0x1234567890abcdef"), "0x12345678");
        assert_eq!(short_address("0x12"), "0x12");
    }
}
