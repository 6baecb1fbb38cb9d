//! Configuration module
//!
//! Chain identities, per-chain explorer configuration and API keys.
//! Addresses and URLs come from utils/constants.rs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{
    get_api_key_env, get_chain_name, get_explorer_api_url, get_explorer_url, get_native_symbol,
    is_chain_enabled, CHAIN_ID_ARBITRUM, CHAIN_ID_BASE, CHAIN_ID_ETHEREUM, CHAIN_ID_LINEA,
    CHAIN_ID_OPTIMISM, CHAIN_ID_POLYGON, DEFAULT_CACHE_TTL_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MAX_RETRIES, DEFAULT_REQUESTS_PER_SECOND,
};

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Ethereum,
    Linea,
    Arbitrum,
    Base,
    Optimism,
    Polygon,
}

impl ChainId {
    /// All chains, enabled or not
    pub const ALL: [ChainId; 6] = [
        ChainId::Ethereum,
        ChainId::Linea,
        ChainId::Arbitrum,
        ChainId::Base,
        ChainId::Optimism,
        ChainId::Polygon,
    ];

    /// EIP-155 chain id
    pub fn id(&self) -> u64 {
        match self {
            Self::Ethereum => CHAIN_ID_ETHEREUM,
            Self::Linea => CHAIN_ID_LINEA,
            Self::Arbitrum => CHAIN_ID_ARBITRUM,
            Self::Base => CHAIN_ID_BASE,
            Self::Optimism => CHAIN_ID_OPTIMISM,
            Self::Polygon => CHAIN_ID_POLYGON,
        }
    }

    /// Get chain from numeric ID
    pub fn from_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Lowercase key used in config files and JSON
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Linea => "linea",
            Self::Arbitrum => "arbitrum",
            Self::Base => "base",
            Self::Optimism => "optimism",
            Self::Polygon => "polygon",
        }
    }

    /// Get chain name (delegates to constants)
    pub fn name(&self) -> &'static str {
        get_chain_name(self.id())
    }

    /// Get chain symbol (delegates to constants)
    pub fn symbol(&self) -> &'static str {
        get_native_symbol(self.id())
    }

    /// Human-facing explorer
    pub fn explorer_url(&self) -> &'static str {
        get_explorer_url(self.id())
    }

    pub fn is_enabled(&self) -> bool {
        is_chain_enabled(self.id())
    }

    /// Enabled chains only
    pub fn enabled() -> Vec<ChainId> {
        Self::ALL.into_iter().filter(|c| c.is_enabled()).collect()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ChainId {
    type Err = AppError;

    /// Accepts the lowercase key or the numeric chain id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if let Ok(id) = lowered.parse::<u64>() {
            return Self::from_id(id).ok_or_else(|| AppError::unsupported_chain(s));
        }
        Self::ALL
            .into_iter()
            .find(|c| c.key() == lowered)
            .ok_or_else(|| AppError::unsupported_chain(s))
    }
}

/// Explorer credentials per chain
#[derive(Debug, Clone, Default)]
pub struct ApiKeyConfig {
    keys: HashMap<ChainId, String>,
}

impl ApiKeyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every `<EXPLORER>_API_KEY` variable that is set.
    /// Keys are never logged.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        for chain in ChainId::ALL {
            let Some(env_key) = get_api_key_env(chain.id()) else {
                continue;
            };
            if let Ok(key) = std::env::var(env_key) {
                if !key.is_empty() && key != "YourApiKeyToken" {
                    info!("🔑 {} configured (key hidden)", env_key);
                    config.keys.insert(chain, key);
                }
            }
        }
        config
    }

    pub fn with_key(mut self, chain: ChainId, key: impl Into<String>) -> Self {
        self.set_key(chain, key);
        self
    }

    pub fn set_key(&mut self, chain: ChainId, key: impl Into<String>) {
        self.keys.insert(chain, key.into());
    }

    pub fn get(&self, chain: ChainId) -> Option<&str> {
        self.keys.get(&chain).map(String::as_str)
    }

    pub fn chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.keys.keys().copied()
    }
}

/// Everything one Etherscan-compatible explorer needs: data, not a subclass
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub chain: ChainId,
    pub api_url: String,
    pub api_key: String,
    /// Request spacing; 0 disables spacing
    pub requests_per_second: u32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub cache_ttl_secs: u64,
}

impl ExplorerConfig {
    /// Default config for a chain's public explorer API
    pub fn for_chain(chain: ChainId, api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AppError::missing_api_key(
                get_api_key_env(chain.id()).unwrap_or("API_KEY"),
            ));
        }
        let api_url = get_explorer_api_url(chain.id())
            .ok_or_else(|| AppError::unsupported_chain(chain))?;

        Ok(Self {
            chain,
            api_url: api_url.to_string(),
            api_key,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        })
    }

    /// Point at a different endpoint (self-hosted mirrors, test servers)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    /// Minimum delay between two requests
    pub fn min_request_interval(&self) -> Option<Duration> {
        if self.requests_per_second == 0 {
            return None;
        }
        Some(Duration::from_millis(1000 / self.requests_per_second as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_parsing() {
        assert_eq!("ethereum".parse::<ChainId>().unwrap(), ChainId::Ethereum);
        assert_eq!("Base".parse::<ChainId>().unwrap(), ChainId::Base);
        assert_eq!("59144".parse::<ChainId>().unwrap(), ChainId::Linea);
        assert!("solana".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_enabled_chains() {
        let enabled = ChainId::enabled();
        assert!(enabled.contains(&ChainId::Ethereum));
        assert!(!enabled.contains(&ChainId::Polygon));
        assert_eq!(ChainId::Polygon.symbol(), "MATIC");
    }

    #[test]
    fn test_explorer_config() {
        let cfg = ExplorerConfig::for_chain(ChainId::Arbitrum, "key").unwrap();
        assert_eq!(cfg.api_url, "https://api.arbiscan.io/api");
        assert_eq!(cfg.min_request_interval(), Some(Duration::from_millis(200)));
        assert!(cfg.with_rate_limit(0).min_request_interval().is_none());
    }

    #[test]
    fn test_explorer_config_requires_key() {
        let err = ExplorerConfig::for_chain(ChainId::Ethereum, "").unwrap_err();
        assert_eq!(err.code_str(), "CFG_MISSING_API_KEY");
    }

    #[test]
    fn test_chain_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChainId::Linea).unwrap(), "\"linea\"");
    }
}
