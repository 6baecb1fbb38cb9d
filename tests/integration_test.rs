//! Integration tests for Ruster Trace
//!
//! Every test runs against the in-memory ledger, no network needed.

use ruster_trace::models::types::{Direction, PatternType};
use ruster_trace::{
    AnalyzeOptions, ChainId, CompareOptions, ErrorCode, FundingNode, FundingTreeBuilder,
    FundingTreeConfig, MemoryProvider, ProviderRegistry, TransactionProvider, WalletAnalyzer,
};
use std::collections::HashSet;
use std::sync::Arc;

const W: &str = "0x1000000000000000000000000000000000000000";
const A: &str = "0xa000000000000000000000000000000000000000";
const B: &str = "0xb000000000000000000000000000000000000000";
const C: &str = "0xc000000000000000000000000000000000000000";
const D: &str = "0xd000000000000000000000000000000000000000";
const S: &str = "0x5000000000000000000000000000000000000000";
const X: &str = "0x9000000000000000000000000000000000000000";
const TORNADO: &str = "0x12b66ca9ebf262c5700486c8f6114e9d038759e4";

fn ledger() -> Arc<MemoryProvider> {
    Arc::new(MemoryProvider::new(ChainId::Ethereum))
}

fn analyzer_for(provider: &Arc<MemoryProvider>) -> WalletAnalyzer {
    let provider: Arc<dyn TransactionProvider> = provider.clone();
    WalletAnalyzer::new(ProviderRegistry::new().with_provider(provider))
}

fn depth(max_depth: u32) -> AnalyzeOptions {
    AnalyzeOptions {
        tree_config: Some(FundingTreeConfig::with_depth(max_depth)),
        filters: None,
    }
}

fn addr(n: u64) -> String {
    format!("0x{:040x}", n)
}

/// Walks the tree checking depth, branching and ordering
fn assert_well_formed(node: &FundingNode, max_depth: u32) {
    assert!(node.depth <= max_depth, "depth {} > {}", node.depth, max_depth);
    assert!(node.children.len() <= 10, "{} children", node.children.len());
    for pair in node.children.windows(2) {
        assert!(pair[0].total_value_in_eth >= pair[1].total_value_in_eth);
    }
    for child in &node.children {
        assert_eq!(child.depth, node.depth + 1);
        assert_well_formed(child, max_depth);
    }
}

// ============================================
// FUNDING TREES
// ============================================

#[tokio::test]
async fn test_source_children_ordered_by_value() {
    let provider = ledger();
    provider.add_transfer(B, W, 1.0, 1_000);
    provider.add_transfer(C, W, 2.0, 1_100);
    provider.add_transfer(D, W, 0.5, 1_200);

    let result = analyzer_for(&provider)
        .analyze(W, ChainId::Ethereum, depth(2))
        .await
        .unwrap();

    let children: Vec<(&str, f64)> = result
        .funding_sources
        .children
        .iter()
        .map(|c| (c.address.as_str(), c.total_value_in_eth))
        .collect();
    assert_eq!(children, vec![(C, 2.0), (B, 1.0), (D, 0.5)]);
    assert!(result.funding_sources.children.iter().all(|c| c.depth == 1));
}

#[tokio::test]
async fn test_rate_limited_child_keeps_its_aggregate() {
    let provider = ledger();
    provider.add_transfer(B, W, 1.0, 1_000);
    provider.add_transfer(C, W, 2.0, 1_100);
    provider.add_transfer(C, W, 0.5, 1_200);
    provider.add_transfer(D, B, 3.0, 900);
    provider.set_unreachable(C);

    let result = analyzer_for(&provider)
        .analyze(W, ChainId::Ethereum, depth(3))
        .await
        .unwrap();

    let sources = &result.funding_sources;
    let c = sources.children.iter().find(|n| n.address == C).unwrap();
    assert_eq!(c.total_value_in_eth, 2.5);
    assert_eq!(c.tx_count, 2);
    assert!(c.is_leaf());

    let b = sources.children.iter().find(|n| n.address == B).unwrap();
    assert_eq!(b.children.len(), 1);
    assert_eq!(b.children[0].address, D);
}

#[tokio::test]
async fn test_wide_graph_stays_bounded() {
    let provider = ledger();
    for i in 1..=200u64 {
        for k in 0..12u64 {
            let funder = (i * 7 + k * 13) % 200 + 1;
            provider.add_transfer(&addr(funder), &addr(i), (k + 1) as f64, 1_000 + i * 10 + k);
        }
    }

    let builder = FundingTreeBuilder::new(provider.clone());
    let config = FundingTreeConfig::with_depth(3);
    let tree = builder.build_source_tree(&addr(1), &config).await;

    assert_well_formed(&tree, 3);
    assert_eq!(tree.children.len(), 10);

    let distinct: HashSet<String> = tree.flatten_addresses().into_iter().collect();
    assert!(provider.call_count("get_transactions") <= distinct.len());
}

#[tokio::test]
async fn test_cycle_terminates() {
    let provider = ledger();
    provider.add_transfer(A, B, 1.0, 1_000);
    provider.add_transfer(B, C, 1.0, 2_000);
    provider.add_transfer(C, A, 1.0, 3_000);

    let builder = FundingTreeBuilder::new(provider.clone());
    let tree = builder
        .build_source_tree(A, &FundingTreeConfig::with_depth(8))
        .await;

    assert_well_formed(&tree, 8);
    assert_eq!(tree.flatten_addresses(), vec![A, C, B, A]);
    assert_eq!(provider.call_count("get_transactions"), 3);
}

// ============================================
// COMMON ANCESTORS
// ============================================

#[tokio::test]
async fn test_shared_first_funder_fast_path() {
    let provider = ledger();
    provider.add_transfer(X, A, 1.0, 1_000);
    provider.add_transfer(X, B, 1.0, 1_010);
    provider.add_transfer(C, A, 5.0, 2_000);
    provider.add_transfer(D, B, 5.0, 2_000);

    let ancestors = analyzer_for(&provider)
        .find_common_ancestors(A, B, ChainId::Ethereum, None)
        .await
        .unwrap();

    assert_eq!(ancestors, vec![X]);
    assert_eq!(provider.call_count("get_transactions"), 0);
    assert_eq!(provider.call_count("get_first_funder"), 2);
}

#[tokio::test]
async fn test_common_ancestor_found_deeper() {
    let provider = ledger();
    provider.add_transfer(C, A, 1.0, 1_000);
    provider.add_transfer(D, B, 1.0, 1_000);
    provider.add_transfer(X, C, 4.0, 500);
    provider.add_transfer(X, D, 4.0, 500);

    let ancestors = analyzer_for(&provider)
        .find_common_ancestors(A, B, ChainId::Ethereum, Some(3))
        .await
        .unwrap();

    assert_eq!(ancestors, vec![X]);
}

// ============================================
// COMPARISON
// ============================================

#[tokio::test]
async fn test_compare_shared_funder_and_direct_transfer() {
    let provider = ledger();
    provider.add_transfer(S, A, 2.0, 1_000);
    provider.add_transfer(S, B, 2.0, 1_100);
    provider.add_transfer(A, B, 1.0, 2_000);

    let result = analyzer_for(&provider)
        .compare_wallets(&[A, B], ChainId::Ethereum, CompareOptions::default())
        .await
        .unwrap();

    assert_eq!(result.wallets.len(), 2);
    assert_eq!(result.common_funding_sources, vec![S]);
    assert!(result.common_destinations.is_empty());
    assert!(result.shared_projects.is_empty());
    assert_eq!(result.direct_transfers.len(), 1);
    assert_eq!(result.correlation_score, 14);
    assert!(!result.is_sybil_likely);
}

#[tokio::test]
async fn test_compare_dedupes_addresses() {
    let provider = ledger();
    provider.add_transfer(S, A, 1.0, 1_000);

    let upper_a = A.to_uppercase().replace("0X", "0x");
    let err = analyzer_for(&provider)
        .compare_wallets(&[A.to_string(), upper_a], ChainId::Ethereum, CompareOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code_str(), "INPUT_INVALID");
}

// ============================================
// SETUP ERRORS
// ============================================

#[tokio::test]
async fn test_setup_errors_surface() {
    let empty = WalletAnalyzer::new(ProviderRegistry::new());

    let err = empty
        .analyze(W, ChainId::Ethereum, AnalyzeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "PROVIDER_NOT_CONFIGURED");
    assert!(err.is_fatal());

    let err = empty
        .analyze(W, ChainId::Polygon, AnalyzeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "CFG_CHAIN_DISABLED");

    let err = empty
        .analyze("not-an-address", ChainId::Ethereum, AnalyzeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAddress);

    let err = empty
        .compare_wallets(&[W], ChainId::Ethereum, CompareOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "INPUT_INVALID");
}

#[tokio::test]
async fn test_unreachable_wallet_still_produces_result() {
    let provider = ledger();
    provider.add_transfer(B, W, 1.0, 1_000);
    provider.set_unreachable(W);

    let result = analyzer_for(&provider)
        .analyze(W, ChainId::Ethereum, depth(2))
        .await
        .unwrap();

    assert!(result.transactions.is_empty());
    assert!(result.funding_sources.is_leaf());
    assert_eq!(result.wallet.tx_count, 0);
    assert_eq!(result.summary.activity_period_days, 1);
}

// ============================================
// ANALYSIS
// ============================================

#[tokio::test]
async fn test_mixer_funding_is_flagged() {
    let provider = ledger();
    provider.add_transfer(TORNADO, W, 10.0, 1_000);

    let result = analyzer_for(&provider)
        .analyze(W, ChainId::Ethereum, depth(2))
        .await
        .unwrap();

    assert!(result
        .suspicious_indicators
        .iter()
        .any(|i| i.pattern == PatternType::KnownBadActor));
    assert!(result.overall_risk_score >= 40);

    let mixer = &result.funding_sources.children[0];
    assert_eq!(mixer.suspicious_score, 100);
    assert!(mixer.is_infrastructure);
    assert!(mixer.is_leaf());
}

#[tokio::test]
async fn test_same_block_senders_grouped() {
    let provider = ledger();
    provider.add_transfer_in_block(B, W, 0.3, 6_000, 500);
    provider.add_transfer_in_block(C, W, 0.3, 6_000, 500);
    provider.add_transfer_in_block(D, W, 0.3, 9_000, 750);

    let result = analyzer_for(&provider)
        .analyze(W, ChainId::Ethereum, depth(1))
        .await
        .unwrap();

    assert_eq!(result.same_block_transactions.len(), 1);
    let group = &result.same_block_transactions[0];
    assert_eq!(group.block_number, 500);
    assert_eq!(group.transactions.len(), 2);
    assert!(group.is_suspicious);
}

#[tokio::test]
async fn test_summary_and_trees_together() {
    let provider = ledger();
    provider.add_transfer(B, W, 2.0, 1_000);
    provider.add_transfer(W, C, 0.5, 1_000 + 86_400 * 3);

    let result = analyzer_for(&provider)
        .analyze(W, ChainId::Ethereum, depth(2))
        .await
        .unwrap();

    assert_eq!(result.transactions.len(), 2);
    assert_eq!(result.transactions[0].timestamp, 1_000 + 86_400 * 3);
    assert_eq!(result.summary.unique_interacted_addresses, 2);
    assert_eq!(result.summary.activity_period_days, 3);
    assert_eq!(result.summary.top_funding_sources[0].address, B);
    assert_eq!(result.summary.top_funding_destinations[0].address, C);
    assert_eq!(result.funding_destinations.children[0].direction, Direction::Destination);
}

#[tokio::test]
async fn test_concurrent_analyses_agree() {
    let provider = ledger();
    for i in 1..=40u64 {
        provider.add_transfer(&addr(i + 1), &addr(i), i as f64, 1_000 + i);
        provider.add_transfer(&addr(i + 2), &addr(i), 0.5, 2_000 + i);
    }

    let analyzer = analyzer_for(&provider);
    let wallet = addr(1);
    let baseline = analyzer
        .analyze(&wallet, ChainId::Ethereum, depth(4))
        .await
        .unwrap();

    let runs = futures_util::future::join_all(
        (0..4).map(|_| analyzer.analyze(&wallet, ChainId::Ethereum, depth(4))),
    )
    .await;

    for run in runs {
        let run = run.unwrap();
        assert_eq!(run.funding_sources, baseline.funding_sources);
        assert_eq!(run.funding_destinations, baseline.funding_destinations);
        assert_well_formed(&run.funding_sources, 4);
    }
}
