//! In-memory transaction provider
//!
//! Serves a fixed ledger held in `DashMap`s. Used for offline replays of
//! captured histories and as the fixture behind the test suites.
//! Addresses can be marked unreachable to reproduce explorer rate limiting.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::config::ChainId;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    Direction, FilterOptions, FundingNode, Transaction, TxCategory, TxStatus, WalletInfo,
};
use crate::providers::provider::TransactionProvider;
use crate::utils::constants::normalize_address;
use crate::utils::known_addresses::{label_for, lookup_entity};

/// Build a successful native transfer record (as seen by the receiver)
pub fn native_transfer(
    hash: &str,
    from: &str,
    to: &str,
    value_eth: f64,
    timestamp: u64,
    block_number: u64,
) -> Transaction {
    let wei = (value_eth * 1e18).max(0.0) as u128;
    Transaction {
        hash: hash.to_lowercase(),
        block_number,
        timestamp,
        from: normalize_address(from),
        to: Some(normalize_address(to)),
        value: wei.to_string(),
        value_in_eth: value_eth,
        gas_cost_in_eth: 0.0,
        status: TxStatus::Success,
        category: TxCategory::Transfer,
        method_id: None,
        is_incoming: true,
        token_transfers: Vec::new(),
    }
}

/// Fixed ledger provider
pub struct MemoryProvider {
    chain: ChainId,
    wallets: DashMap<String, WalletInfo>,
    transactions: DashMap<String, Vec<Transaction>>,
    internal: DashMap<String, Vec<Transaction>>,
    tokens: DashMap<String, Vec<Transaction>>,
    first_funders: DashMap<String, String>,
    unreachable: DashSet<String>,
    calls: DashMap<&'static str, usize>,
    next_hash: AtomicU64,
}

impl MemoryProvider {
    pub fn new(chain: ChainId) -> Self {
        Self {
            chain,
            wallets: DashMap::new(),
            transactions: DashMap::new(),
            internal: DashMap::new(),
            tokens: DashMap::new(),
            first_funders: DashMap::new(),
            unreachable: DashSet::new(),
            calls: DashMap::new(),
            next_hash: AtomicU64::new(1),
        }
    }

    /// Record a native transfer in both histories, returns its hash
    pub fn add_transfer(&self, from: &str, to: &str, value_eth: f64, timestamp: u64) -> String {
        self.add_transfer_in_block(from, to, value_eth, timestamp, timestamp / 12)
    }

    pub fn add_transfer_in_block(
        &self,
        from: &str,
        to: &str,
        value_eth: f64,
        timestamp: u64,
        block_number: u64,
    ) -> String {
        let n = self.next_hash.fetch_add(1, Ordering::Relaxed);
        let hash = format!("0x{:064x}", n);
        self.add_transaction(native_transfer(&hash, from, to, value_eth, timestamp, block_number));
        hash
    }

    /// Record an ordinary transaction in the histories of both parties
    pub fn add_transaction(&self, tx: Transaction) {
        Self::record(&self.transactions, tx);
    }

    /// Record an internal transfer in the histories of both parties
    pub fn add_internal_transaction(&self, tx: Transaction) {
        Self::record(&self.internal, tx);
    }

    /// Record a token transfer in the histories of both parties
    pub fn add_token_transfer(&self, tx: Transaction) {
        Self::record(&self.tokens, tx);
    }

    fn record(store: &DashMap<String, Vec<Transaction>>, tx: Transaction) {
        let from = normalize_address(&tx.from);
        let to = tx.to.as_deref().map(normalize_address);

        if let Some(to) = &to {
            let mut incoming = tx.clone();
            incoming.is_incoming = true;
            store.entry(to.clone()).or_default().push(incoming);
        }
        if to.as_deref() != Some(from.as_str()) {
            let mut outgoing = tx;
            outgoing.is_incoming = false;
            store.entry(from).or_default().push(outgoing);
        }
    }

    pub fn set_wallet_info(&self, info: WalletInfo) {
        self.wallets.insert(normalize_address(&info.address), info);
    }

    /// Override the first-funder answer for an address
    pub fn set_first_funder(&self, address: &str, funder: &str) {
        self.first_funders
            .insert(normalize_address(address), normalize_address(funder));
    }

    /// Every call touching `address` fails as rate limited
    pub fn set_unreachable(&self, address: &str) {
        self.unreachable.insert(normalize_address(address));
    }

    /// How many times a trait method was invoked
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.get(method).map(|c| *c).unwrap_or(0)
    }

    fn enter(&self, method: &'static str, address: &str) -> AppResult<String> {
        *self.calls.entry(method).or_insert(0) += 1;
        let address = normalize_address(address);
        if self.unreachable.contains(&address) {
            return Err(AppError::rate_limited());
        }
        Ok(address)
    }

    fn history(
        store: &DashMap<String, Vec<Transaction>>,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> Vec<Transaction> {
        let mut txs = store.get(address).map(|h| h.value().clone()).unwrap_or_default();
        txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        match filters {
            Some(f) => f.apply(txs),
            None => txs,
        }
    }

    fn earliest_incoming(store: &DashMap<String, Vec<Transaction>>, address: &str) -> Option<Transaction> {
        store.get(address).and_then(|h| {
            h.iter()
                .filter(|tx| tx.is_incoming && tx.is_success() && tx.value_in_eth > 0.0)
                .min_by_key(|tx| tx.timestamp)
                .cloned()
        })
    }
}

#[async_trait]
impl TransactionProvider for MemoryProvider {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn get_wallet_info(&self, address: &str) -> AppResult<WalletInfo> {
        let address = self.enter("get_wallet_info", address)?;
        if let Some(info) = self.wallets.get(&address) {
            return Ok(info.value().clone());
        }

        let history = Self::history(&self.transactions, &address, None);
        let entity = lookup_entity(self.chain, &address);
        let mut info = WalletInfo::unknown(&address, self.chain);
        info.tx_count = history.len() as u64;
        info.first_tx_timestamp = history.iter().map(|t| t.timestamp).min();
        info.last_tx_timestamp = history.iter().map(|t| t.timestamp).max();
        info.label = label_for(self.chain, &address).map(str::to_string);
        info.is_infrastructure = entity.is_some_and(|e| e.kind.is_infrastructure());
        info.infrastructure_type = entity.map(|e| e.kind);
        Ok(info)
    }

    async fn get_transactions(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>> {
        let address = self.enter("get_transactions", address)?;
        Ok(Self::history(&self.transactions, &address, filters))
    }

    async fn get_internal_transactions(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>> {
        let address = self.enter("get_internal_transactions", address)?;
        Ok(Self::history(&self.internal, &address, filters))
    }

    async fn get_token_transfers(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>> {
        let address = self.enter("get_token_transfers", address)?;
        Ok(Self::history(&self.tokens, &address, filters))
    }

    async fn get_first_funder(&self, address: &str) -> AppResult<Option<FundingNode>> {
        let address = self.enter("get_first_funder", address)?;

        if let Some(funder) = self.first_funders.get(&address) {
            let mut node = FundingNode::new(funder.value(), 1, Direction::Source);
            node.tx_count = 1;
            return Ok(Some(node));
        }

        let tx = Self::earliest_incoming(&self.transactions, &address)
            .or_else(|| Self::earliest_incoming(&self.internal, &address));

        Ok(tx.map(|tx| {
            let mut node = FundingNode::new(&tx.from, 1, Direction::Source);
            node.total_value_in_eth = tx.value_in_eth;
            node.tx_count = 1;
            node.first_tx = Some(tx);
            node
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0xaaaa000000000000000000000000000000000001";
    const B: &str = "0xbbbb000000000000000000000000000000000002";

    #[tokio::test]
    async fn test_transfer_recorded_on_both_sides() {
        let provider = MemoryProvider::new(ChainId::Ethereum);
        provider.add_transfer(A, B, 1.5, 1_700_000_000);

        let sent = provider.get_transactions(A, None).await.unwrap();
        let received = provider.get_transactions(B, None).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].is_incoming);
        assert!(received[0].is_incoming);
        assert_eq!(sent[0].hash, received[0].hash);
        assert_eq!(provider.call_count("get_transactions"), 2);
    }

    #[tokio::test]
    async fn test_unreachable_address_is_rate_limited() {
        let provider = MemoryProvider::new(ChainId::Ethereum);
        provider.set_unreachable(B);
        let err = provider.get_transactions(B, None).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_first_funder_is_earliest_incoming() {
        let provider = MemoryProvider::new(ChainId::Ethereum);
        let c = "0xcccc000000000000000000000000000000000003";
        provider.add_transfer(c, B, 2.0, 2_000);
        provider.add_transfer(A, B, 1.0, 1_000);

        let funder = provider.get_first_funder(B).await.unwrap().unwrap();
        assert_eq!(funder.address, A);
        assert_eq!(funder.depth, 1);
        assert!(provider.get_first_funder(A).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_derived_wallet_info() {
        let provider = MemoryProvider::new(ChainId::Ethereum);
        provider.add_transfer(A, B, 1.0, 1_000);
        provider.add_transfer(A, B, 1.0, 5_000);

        let info = provider.get_wallet_info(B).await.unwrap();
        assert_eq!(info.tx_count, 2);
        assert_eq!(info.first_tx_timestamp, Some(1_000));
        assert_eq!(info.last_tx_timestamp, Some(5_000));
    }
}
