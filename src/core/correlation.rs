//! Correlation Engine
//!
//! Cross-wallet comparison: shared funding ancestry, shared destinations,
//! shared protocol usage and direct transfers between the compared
//! wallets, folded into a 0-100 correlation score.

use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::models::types::{AnalysisResult, MultiWalletResult, ProjectInteraction, Transaction};
use crate::utils::constants::SYBIL_CORRELATION_THRESHOLD;

/// `min(30,10·s) + min(25,8·d) + min(25,5·p) + min(20,4·t)`, capped at 100
pub fn calculate_correlation(
    common_sources: usize,
    common_destinations: usize,
    shared_projects: usize,
    direct_transfers: usize,
) -> u8 {
    let score = common_sources.saturating_mul(10).min(30)
        + common_destinations.saturating_mul(8).min(25)
        + shared_projects.saturating_mul(5).min(25)
        + direct_transfers.saturating_mul(4).min(20);
    score.min(100) as u8
}

/// Addresses present in every list, in the first list's order, deduped
pub fn find_common_elements(lists: &[Vec<String>], exclude: &HashSet<String>) -> Vec<String> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };

    let rest_sets: Vec<HashSet<&str>> = rest
        .iter()
        .map(|list| list.iter().map(String::as_str).collect())
        .collect();

    let mut seen = HashSet::new();
    first
        .iter()
        .filter(|addr| {
            !exclude.contains(*addr)
                && rest_sets.iter().all(|set| set.contains(addr.as_str()))
                && seen.insert(addr.as_str())
        })
        .cloned()
        .collect()
}

/// Contracts every wallet interacted with, merged across wallets
pub fn find_shared_projects(results: &[AnalysisResult]) -> Vec<ProjectInteraction> {
    let mut wallets_per_contract: HashMap<&str, usize> = HashMap::new();
    for result in results {
        let unique: HashSet<&str> = result
            .projects_interacted
            .iter()
            .map(|p| p.contract_address.as_str())
            .collect();
        for contract in unique {
            *wallets_per_contract.entry(contract).or_insert(0) += 1;
        }
    }

    let mut merged: Vec<ProjectInteraction> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for project in results.iter().flat_map(|r| &r.projects_interacted) {
        if wallets_per_contract.get(project.contract_address.as_str()) != Some(&results.len()) {
            continue;
        }
        match index.get(&project.contract_address) {
            Some(&slot) => {
                let shared = &mut merged[slot];
                shared.interaction_count += project.interaction_count;
                shared.total_value_in_eth += project.total_value_in_eth;
                shared.first_interaction = shared.first_interaction.min(project.first_interaction);
                shared.last_interaction = shared.last_interaction.max(project.last_interaction);
            }
            None => {
                index.insert(project.contract_address.clone(), merged.len());
                merged.push(project.clone());
            }
        }
    }

    merged
}

/// Transactions between two compared wallets, deduped by hash, newest first
pub fn find_direct_transfers(results: &[AnalysisResult], wallets: &HashSet<String>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    let mut transfers: Vec<Transaction> = results
        .iter()
        .flat_map(|r| &r.transactions)
        .filter(|tx| {
            wallets.contains(&tx.from.to_lowercase())
                && tx
                    .to
                    .as_deref()
                    .is_some_and(|to| wallets.contains(&to.to_lowercase()))
        })
        .filter(|tx| seen.insert(tx.hash.to_lowercase()))
        .cloned()
        .collect();

    transfers.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    transfers
}

/// Assemble the comparison from per-wallet results
pub fn build_multi_wallet_result(results: Vec<AnalysisResult>) -> MultiWalletResult {
    let wallets: HashSet<String> = results
        .iter()
        .map(|r| r.wallet.address.to_lowercase())
        .collect();

    let sources: Vec<Vec<String>> = results
        .iter()
        .map(|r| r.funding_sources.flatten_addresses())
        .collect();
    let destinations: Vec<Vec<String>> = results
        .iter()
        .map(|r| r.funding_destinations.flatten_addresses())
        .collect();

    let common_funding_sources = find_common_elements(&sources, &wallets);
    let common_destinations = find_common_elements(&destinations, &wallets);
    let shared_projects = find_shared_projects(&results);
    let direct_transfers = find_direct_transfers(&results, &wallets);

    let correlation_score = calculate_correlation(
        common_funding_sources.len(),
        common_destinations.len(),
        shared_projects.len(),
        direct_transfers.len(),
    );
    let is_sybil_likely = correlation_score > SYBIL_CORRELATION_THRESHOLD;

    info!(
        "🕸️ Correlation {}/100 across {} wallets (sources: {}, destinations: {}, projects: {}, transfers: {}){}",
        correlation_score,
        results.len(),
        common_funding_sources.len(),
        common_destinations.len(),
        shared_projects.len(),
        direct_transfers.len(),
        if is_sybil_likely { " - SYBIL LIKELY" } else { "" }
    );

    MultiWalletResult {
        wallets: results,
        common_funding_sources,
        common_destinations,
        shared_projects,
        direct_transfers,
        correlation_score,
        is_sybil_likely,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::ProjectCategory;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn project(contract: &str, count: usize, first: u64, last: u64) -> ProjectInteraction {
        ProjectInteraction {
            contract_address: contract.to_string(),
            project_name: None,
            category: ProjectCategory::Unknown,
            interaction_count: count,
            total_value_in_eth: 1.0,
            first_interaction: first,
            last_interaction: last,
        }
    }

    #[test]
    fn test_correlation_formula() {
        assert_eq!(calculate_correlation(0, 0, 0, 0), 0);
        assert_eq!(calculate_correlation(1, 0, 0, 1), 14);
        assert_eq!(calculate_correlation(3, 4, 5, 5), 100);
        assert_eq!(calculate_correlation(100, 100, 100, 100), 100);
        assert_eq!(calculate_correlation(usize::MAX, 0, 0, 0), 30);
    }

    #[test]
    fn test_correlation_monotonic_per_input() {
        for n in 0..12 {
            assert!(calculate_correlation(n + 1, 0, 0, 0) >= calculate_correlation(n, 0, 0, 0));
            assert!(calculate_correlation(0, n + 1, 0, 0) >= calculate_correlation(0, n, 0, 0));
            assert!(calculate_correlation(0, 0, n + 1, 0) >= calculate_correlation(0, 0, n, 0));
            assert!(calculate_correlation(0, 0, 0, n + 1) >= calculate_correlation(0, 0, 0, n));
        }
        assert_eq!(calculate_correlation(3, 0, 0, 0), calculate_correlation(9, 0, 0, 0));
    }

    #[test]
    fn test_sybil_threshold_is_strict() {
        // 30 + 25 + 5 = 60 is not enough
        let at_threshold = calculate_correlation(3, 4, 1, 0);
        assert_eq!(at_threshold, 60);
        assert!(at_threshold <= SYBIL_CORRELATION_THRESHOLD);
        assert!(calculate_correlation(3, 4, 1, 1) > SYBIL_CORRELATION_THRESHOLD);
    }

    #[test]
    fn test_common_elements() {
        let lists = vec![
            strings(&["0xa", "0xs", "0xt", "0xs"]),
            strings(&["0xb", "0xt", "0xs", "0xa"]),
        ];
        let exclude: HashSet<String> = strings(&["0xa", "0xb"]).into_iter().collect();

        assert_eq!(find_common_elements(&lists, &exclude), strings(&["0xs", "0xt"]));
        assert!(find_common_elements(&[], &exclude).is_empty());
    }

    #[test]
    fn test_common_elements_requires_all_lists() {
        let lists = vec![
            strings(&["0xs", "0xt"]),
            strings(&["0xs", "0xt"]),
            strings(&["0xs"]),
        ];
        assert_eq!(find_common_elements(&lists, &HashSet::new()), strings(&["0xs"]));
    }

    #[test]
    fn test_shared_projects_merged() {
        use crate::models::types::{AnalysisSummary, Direction, FundingNode, Severity, WalletInfo};
        use crate::models::config::ChainId;

        let result = |addr: &str, projects: Vec<ProjectInteraction>| AnalysisResult {
            wallet: WalletInfo::unknown(addr, ChainId::Ethereum),
            transactions: vec![],
            token_transfers: vec![],
            funding_sources: FundingNode::new(addr, 0, Direction::Source),
            funding_destinations: FundingNode::new(addr, 0, Direction::Destination),
            suspicious_indicators: vec![],
            overall_risk_score: 0,
            risk_level: Severity::Low,
            projects_interacted: projects,
            same_block_transactions: vec![],
            summary: AnalysisSummary {
                total_transactions: 0,
                successful_txs: 0,
                failed_txs: 0,
                total_value_sent_eth: 0.0,
                total_value_received_eth: 0.0,
                unique_interacted_addresses: 0,
                top_funding_sources: vec![],
                top_funding_destinations: vec![],
                activity_period_days: 1,
                average_tx_per_day: 0.0,
            },
        };

        let results = vec![
            result("0xa", vec![project("0xuni", 2, 100, 200), project("0xnft", 1, 5, 5)]),
            result("0xb", vec![project("0xuni", 3, 50, 150)]),
        ];

        let shared = find_shared_projects(&results);
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].contract_address, "0xuni");
        assert_eq!(shared[0].interaction_count, 5);
        assert_eq!(shared[0].first_interaction, 50);
        assert_eq!(shared[0].last_interaction, 200);
    }
}
