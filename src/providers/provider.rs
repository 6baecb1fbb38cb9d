//! Transaction provider contract and per-chain registry
//!
//! The analysis core depends only on [`TransactionProvider`]. Concrete
//! explorers are configured data behind one generic adapter, and the
//! registry maps a chain to whichever provider serves it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::config::{ApiKeyConfig, ChainId, ExplorerConfig};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{FilterOptions, FundingNode, Transaction, WalletInfo};
use crate::providers::explorer::ExplorerProvider;

/// Normalized ledger data for one chain
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    /// Chain this provider serves
    fn chain(&self) -> ChainId;

    async fn get_wallet_info(&self, address: &str) -> AppResult<WalletInfo>;

    /// Ordinary transactions, `is_incoming` relative to `address`
    async fn get_transactions(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>>;

    /// Internal (trace) value transfers
    async fn get_internal_transactions(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>>;

    /// Token transfers with token metadata attached
    async fn get_token_transfers(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>>;

    /// Earliest positive-value incoming transfer, as a depth-1 source node
    async fn get_first_funder(&self, address: &str) -> AppResult<Option<FundingNode>>;
}

/// Chain → provider lookup
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ChainId, Arc<dyn TransactionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explorer providers for every enabled chain that has a key
    pub fn from_api_keys(keys: &ApiKeyConfig) -> AppResult<Self> {
        let mut registry = Self::new();
        for chain in ChainId::enabled() {
            let Some(key) = keys.get(chain) else {
                continue;
            };
            let config = ExplorerConfig::for_chain(chain, key)?;
            registry.register(Arc::new(ExplorerProvider::new(config)?));
        }
        info!("🔌 {} chain provider(s) configured", registry.len());
        Ok(registry)
    }

    /// Register (or replace) the provider for its chain
    pub fn register(&mut self, provider: Arc<dyn TransactionProvider>) {
        let chain = provider.chain();
        if self.providers.insert(chain, provider).is_some() {
            warn!("🔄 Replacing provider for {}", chain);
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn TransactionProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Fatal setup error when the chain cannot be served
    pub fn get(&self, chain: ChainId) -> AppResult<Arc<dyn TransactionProvider>> {
        if let Some(provider) = self.providers.get(&chain) {
            return Ok(provider.clone());
        }
        if !chain.is_enabled() {
            return Err(AppError::chain_disabled(chain.name()));
        }
        Err(AppError::provider_not_configured(chain.name()))
    }

    pub fn contains(&self, chain: ChainId) -> bool {
        self.providers.contains_key(&chain)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
