//! Funding Tree Builder
//!
//! Bounded-depth exploration of who funded an address (sources) and who
//! it funded (destinations). Each node keeps at most the top 10
//! counterparties by aggregated native value.
//!
//! The visited set belongs to one top-level build and is threaded through
//! the recursion, so a single builder can run several builds at once.

use futures_util::future::{BoxFuture, FutureExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::config::ChainId;
use crate::models::types::{
    Direction, EntityKind, FundingNode, FundingTreeConfig, Progress, ProgressCallback, Transaction,
};
use crate::providers::provider::TransactionProvider;
use crate::utils::constants::{normalize_address, short_address, MAX_CHILDREN_PER_NODE};
use crate::utils::known_addresses::{lookup_entity, lookup_project};

/// Counterparty aggregate for one node
#[derive(Debug, Clone)]
struct Aggregate {
    total_value: f64,
    tx_count: usize,
    first_tx: Transaction,
}

/// Children and totals produced by expanding one address
struct Expansion {
    children: Vec<FundingNode>,
    tx_count: usize,
    total_value: f64,
}

/// Funding tree builder over one chain's provider
#[derive(Clone)]
pub struct FundingTreeBuilder {
    provider: Arc<dyn TransactionProvider>,
    on_progress: Option<ProgressCallback>,
}

impl FundingTreeBuilder {
    pub fn new(provider: Arc<dyn TransactionProvider>) -> Self {
        Self {
            provider,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    fn chain(&self) -> ChainId {
        self.provider.chain()
    }

    /// Who funded `address`
    pub async fn build_source_tree(&self, address: &str, config: &FundingTreeConfig) -> FundingNode {
        self.build_tree(address, config, Direction::Source).await
    }

    /// Who `address` funded
    pub async fn build_destination_tree(
        &self,
        address: &str,
        config: &FundingTreeConfig,
    ) -> FundingNode {
        self.build_tree(address, config, Direction::Destination).await
    }

    /// Build one tree with a fresh visited set
    pub async fn build_tree(
        &self,
        address: &str,
        config: &FundingTreeConfig,
        direction: Direction,
    ) -> FundingNode {
        let address = normalize_address(address);
        let mut root = FundingNode::new(&address, 0, direction);
        self.annotate(&mut root);

        let mut visited = HashSet::new();
        if let Some(expansion) = self
            .expand(address, 0, direction, config, &mut visited)
            .await
        {
            root.children = expansion.children;
            root.tx_count = expansion.tx_count;
            root.total_value_in_eth = expansion.total_value;
        }

        debug!(
            "🌳 {:?} tree for {}...: {} nodes, {} expanded",
            direction,
            short_address(&root.address),
            root.node_count(),
            visited.len()
        );
        root
    }

    /// Expand `address` at `depth`.
    ///
    /// Returns `None` when the node stays terminal: depth bound reached,
    /// already expanded in this build, or its transactions could not be
    /// fetched.
    fn expand<'a>(
        &'a self,
        address: String,
        depth: u32,
        direction: Direction,
        config: &'a FundingTreeConfig,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Option<Expansion>> {
        async move {
            let max_depth = config.effective_max_depth();
            if depth >= max_depth || visited.contains(&address) {
                return None;
            }
            visited.insert(address.clone());

            self.report(Progress {
                stage: direction.stage_name().to_string(),
                current: visited.len(),
                total: (max_depth as usize) * MAX_CHILDREN_PER_NODE,
                message: format!("Analyzing {}... (depth {})", short_address(&address), depth),
            });

            let filters = config.to_filters();
            let txs = match self.provider.get_transactions(&address, Some(&filters)).await {
                Ok(txs) => txs,
                Err(e) => {
                    let reason = if e.is_rate_limited() {
                        "Rate limited by API".to_string()
                    } else {
                        e.message.clone()
                    };
                    warn!("⚠️ [{}...] Skipped: {}", short_address(&address), reason);
                    return None;
                }
            };

            let relevant: Vec<&Transaction> = txs
                .iter()
                .filter(|tx| tx.is_native_value() && direction.accepts(tx))
                .collect();

            let tx_count = relevant.len();
            let total_value = relevant.iter().map(|tx| tx.value_in_eth).sum();

            let mut children = Vec::new();
            for (counterparty, aggregate) in top_counterparties(&address, &relevant, direction) {
                let mut child = self.child_node(&counterparty, depth + 1, direction, aggregate);

                let expandable = depth + 1 < max_depth
                    && !visited.contains(&child.address)
                    && !(config.stop_at_infrastructure && child.is_infrastructure);

                if expandable {
                    if let Some(expansion) = self
                        .expand(child.address.clone(), depth + 1, direction, config, &mut *visited)
                        .await
                    {
                        child.children = expansion.children;
                    }
                }
                children.push(child);
            }

            Some(Expansion {
                children,
                tx_count,
                total_value,
            })
        }
        .boxed()
    }

    fn child_node(
        &self,
        address: &str,
        depth: u32,
        direction: Direction,
        aggregate: Aggregate,
    ) -> FundingNode {
        let mut node = FundingNode::new(address, depth, direction);
        node.total_value_in_eth = aggregate.total_value;
        node.tx_count = aggregate.tx_count;
        node.first_tx = Some(aggregate.first_tx);
        self.annotate(&mut node);
        node
    }

    /// Label known entities and flag mixers
    fn annotate(&self, node: &mut FundingNode) {
        if let Some(entity) = lookup_entity(self.chain(), &node.address) {
            node.label = Some(entity.name.to_string());
            if entity.kind.is_infrastructure() {
                node.is_infrastructure = true;
                node.suspicious_reasons
                    .push(format!("Known {}: {}", entity.kind.as_str(), entity.name));
            }
            if entity.kind == EntityKind::Mixer {
                node.suspicious_score = 100;
            }
        } else if let Some(project) = lookup_project(&node.address) {
            node.label = Some(project.name.to_string());
        }
    }

    fn report(&self, progress: Progress) {
        if let Some(callback) = &self.on_progress {
            callback(&progress);
        }
    }

    /// Shared funding ancestors of two wallets.
    ///
    /// Fast path: identical first funders. Otherwise both source trees are
    /// built to `max_depth` and intersected in pre-order of the first tree.
    pub async fn find_common_ancestors(&self, a: &str, b: &str, max_depth: u32) -> Vec<String> {
        let a = normalize_address(a);
        let b = normalize_address(b);

        let (funder_a, funder_b) = tokio::join!(
            self.provider.get_first_funder(&a),
            self.provider.get_first_funder(&b)
        );

        match (&funder_a, &funder_b) {
            (Ok(Some(fa)), Ok(Some(fb))) if fa.address == fb.address => {
                info!("🎯 Shared first funder {}...", short_address(&fa.address));
                return vec![fa.address.clone()];
            }
            (Err(e), _) | (_, Err(e)) => {
                debug!("First-funder lookup failed, falling back to tree search: {}", e);
            }
            _ => {}
        }

        let config = FundingTreeConfig::with_depth(max_depth);
        let (tree_a, tree_b) = tokio::join!(
            self.build_source_tree(&a, &config),
            self.build_source_tree(&b, &config)
        );

        let in_b: HashSet<String> = tree_b.flatten_addresses().into_iter().collect();
        let mut seen = HashSet::new();
        tree_a
            .flatten_addresses()
            .into_iter()
            .filter(|addr| in_b.contains(addr) && seen.insert(addr.clone()))
            .collect()
    }
}

/// Aggregate by counterparty, sort by value (ties by address), keep top K
fn top_counterparties(
    address: &str,
    relevant: &[&Transaction],
    direction: Direction,
) -> Vec<(String, Aggregate)> {
    let mut by_counterparty: HashMap<String, Aggregate> = HashMap::new();

    for tx in relevant {
        let Some(counterparty) = tx.counterparty_for(direction) else {
            continue;
        };
        let counterparty = normalize_address(counterparty);
        if counterparty == address {
            continue;
        }

        by_counterparty
            .entry(counterparty)
            .and_modify(|agg| {
                agg.total_value += tx.value_in_eth;
                agg.tx_count += 1;
                if tx.timestamp < agg.first_tx.timestamp {
                    agg.first_tx = (*tx).clone();
                }
            })
            .or_insert_with(|| Aggregate {
                total_value: tx.value_in_eth,
                tx_count: 1,
                first_tx: (*tx).clone(),
            });
    }

    let mut sorted: Vec<(String, Aggregate)> = by_counterparty.into_iter().collect();
    sorted.sort_by(|a, b| {
        b.1.total_value
            .total_cmp(&a.1.total_value)
            .then_with(|| a.0.cmp(&b.0))
    });
    sorted.truncate(MAX_CHILDREN_PER_NODE);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::memory::MemoryProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const W: &str = "0x1000000000000000000000000000000000000000";
    const B: &str = "0x2000000000000000000000000000000000000000";
    const C: &str = "0x3000000000000000000000000000000000000000";
    const D: &str = "0x4000000000000000000000000000000000000000";
    const BINANCE: &str = "0x28c6c06298d514db089934071355e5743bf21d60";
    const TORNADO: &str = "0x12b66ca9ebf262c5700486c8f6114e9d038759e4";

    fn builder(provider: MemoryProvider) -> (FundingTreeBuilder, Arc<MemoryProvider>) {
        let provider = Arc::new(provider);
        (FundingTreeBuilder::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_children_sorted_by_value() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(B, W, 1.0, 100);
        ledger.add_transfer(C, W, 2.0, 200);
        ledger.add_transfer(D, W, 0.5, 300);
        let (builder, _) = builder(ledger);

        let tree = builder
            .build_source_tree(W, &FundingTreeConfig::with_depth(2))
            .await;

        let order: Vec<&str> = tree.children.iter().map(|c| c.address.as_str()).collect();
        assert_eq!(order, vec![C, B, D]);
        assert_eq!(tree.tx_count, 3);
        assert!((tree.total_value_in_eth - 3.5).abs() < 1e-9);
        assert!(tree.children.iter().all(|c| c.depth == 1));
    }

    #[tokio::test]
    async fn test_aggregates_per_counterparty() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(B, W, 1.0, 500);
        ledger.add_transfer(B, W, 0.25, 100);
        let (builder, _) = builder(ledger);

        let tree = builder
            .build_source_tree(W, &FundingTreeConfig::with_depth(1))
            .await;

        assert_eq!(tree.children.len(), 1);
        let child = &tree.children[0];
        assert_eq!(child.tx_count, 2);
        assert!((child.total_value_in_eth - 1.25).abs() < 1e-9);
        assert_eq!(child.first_tx.as_ref().map(|t| t.timestamp), Some(100));
    }

    #[tokio::test]
    async fn test_branching_cap_and_tie_break() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        for i in 0..15u64 {
            let sender = format!("0x{:040x}", 0x9000 + i);
            ledger.add_transfer(&sender, W, 1.0, 1_000 + i);
        }
        let (builder, _) = builder(ledger);

        let tree = builder
            .build_source_tree(W, &FundingTreeConfig::with_depth(1))
            .await;

        assert_eq!(tree.children.len(), MAX_CHILDREN_PER_NODE);
        let addresses: Vec<&String> = tree.children.iter().map(|c| &c.address).collect();
        let mut sorted = addresses.clone();
        sorted.sort();
        assert_eq!(addresses, sorted);
    }

    #[tokio::test]
    async fn test_depth_bound_and_cycle() {
        // W <- B <- C <- W forms a loop
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(B, W, 1.0, 300);
        ledger.add_transfer(C, B, 1.0, 200);
        ledger.add_transfer(W, C, 1.0, 100);
        let (builder, provider) = builder(ledger);

        let tree = builder
            .build_source_tree(W, &FundingTreeConfig::with_depth(5))
            .await;

        // W, B, C expanded once each; the W leaf under C is terminal
        assert_eq!(provider.call_count("get_transactions"), 3);
        assert_eq!(tree.flatten_addresses(), vec![W, B, C, W]);
        assert!(tree.max_depth() <= 5);
    }

    #[tokio::test]
    async fn test_depth_zero_is_bare_root() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(B, W, 1.0, 100);
        let (builder, provider) = builder(ledger);

        let tree = builder
            .build_source_tree(W, &FundingTreeConfig::with_depth(0))
            .await;
        assert!(tree.is_leaf());
        assert_eq!(provider.call_count("get_transactions"), 0);
    }

    #[tokio::test]
    async fn test_failed_child_keeps_aggregate() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(B, W, 1.0, 100);
        ledger.add_transfer(C, W, 2.0, 100);
        ledger.add_transfer(D, C, 3.0, 50);
        ledger.set_unreachable(B);
        let (builder, _) = builder(ledger);

        let tree = builder
            .build_source_tree(W, &FundingTreeConfig::with_depth(3))
            .await;

        let b = tree.children.iter().find(|c| c.address == B).unwrap();
        assert!(b.is_leaf());
        assert_eq!(b.tx_count, 1);
        let c = tree.children.iter().find(|c| c.address == C).unwrap();
        assert_eq!(c.children.len(), 1);
        assert_eq!(c.children[0].address, D);
    }

    #[tokio::test]
    async fn test_infrastructure_is_labelled_leaf() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(BINANCE, W, 5.0, 100);
        ledger.add_transfer(B, BINANCE, 100.0, 50);
        ledger.add_transfer(TORNADO, W, 1.0, 120);
        let (builder, provider) = builder(ledger);

        let tree = builder
            .build_source_tree(W, &FundingTreeConfig::with_depth(3))
            .await;

        let exchange = &tree.children[0];
        assert_eq!(exchange.label.as_deref(), Some("Binance 14"));
        assert!(exchange.is_infrastructure);
        assert!(exchange.is_leaf());
        let mixer = &tree.children[1];
        assert_eq!(mixer.suspicious_score, 100);
        assert_eq!(provider.call_count("get_transactions"), 1);
    }

    #[tokio::test]
    async fn test_destination_tree() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(W, B, 1.0, 100);
        ledger.add_transfer(C, W, 4.0, 50);
        let (builder, _) = builder(ledger);

        let tree = builder
            .build_destination_tree(W, &FundingTreeConfig::with_depth(1))
            .await;
        assert_eq!(tree.direction, Direction::Destination);
        assert_eq!(tree.flatten_addresses(), vec![W, B]);
    }

    #[tokio::test]
    async fn test_progress_reported_per_expanded_node() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(B, W, 1.0, 100);
        ledger.add_transfer(C, B, 1.0, 50);
        let (builder, _) = builder(ledger);

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let builder = builder.with_progress(Arc::new(move |_p: &Progress| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        builder
            .build_source_tree(W, &FundingTreeConfig::with_depth(3))
            .await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_common_ancestors_fast_path() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        ledger.add_transfer(C, W, 1.0, 100);
        ledger.add_transfer(C, B, 1.0, 110);
        let (builder, provider) = builder(ledger);

        let common = builder.find_common_ancestors(W, B, 3).await;
        assert_eq!(common, vec![C]);
        assert_eq!(provider.call_count("get_transactions"), 0);
    }

    #[tokio::test]
    async fn test_common_ancestors_fallback() {
        let ledger = MemoryProvider::new(ChainId::Ethereum);
        // different first funders, shared grandparent D
        ledger.add_transfer(B, W, 1.0, 100);
        ledger.add_transfer(C, "0x5000000000000000000000000000000000000000", 1.0, 100);
        ledger.add_transfer(D, B, 1.0, 50);
        ledger.add_transfer(D, C, 1.0, 50);
        let (builder, _) = builder(ledger);

        let common = builder
            .find_common_ancestors(W, "0x5000000000000000000000000000000000000000", 3)
            .await;
        assert_eq!(common, vec![D]);
    }
}
