//! Wallet Analysis Orchestrator
//! Runs the whole per-wallet pipeline and the multi-wallet comparison.
//!
//! Only setup problems (bad address, unavailable chain) fail a call.
//! Everything fetched from a provider degrades to empty data on error.

use chrono::Utc;
use futures_util::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::core::correlation::build_multi_wallet_result;
use crate::core::detector::SuspiciousDetector;
use crate::core::funding_tree::FundingTreeBuilder;
use crate::core::reconciler::merge_transactions;
use crate::models::config::{ApiKeyConfig, ChainId};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    AddressValue, AnalysisResult, AnalysisSummary, AnalyzeOptions, CompareOptions, Direction,
    FundingNode, FundingTreeConfig, MultiWalletResult, ProjectCategory, ProjectInteraction,
    Progress, ProgressCallback, Transaction, TxCategory, TxStatus, WalletInfo,
};
use crate::providers::provider::{ProviderRegistry, TransactionProvider};
use crate::utils::constants::{
    is_valid_address, normalize_address, short_address, DEFAULT_ANCESTOR_DEPTH, SECONDS_PER_DAY,
    SUMMARY_TOP_COUNTERPARTIES,
};
use crate::utils::known_addresses::lookup_project;

/// Coarse milestones reported per analysis
const ANALYSIS_STAGES: usize = 6;

/// Entry point for single-wallet analysis and comparisons
#[derive(Clone)]
pub struct WalletAnalyzer {
    registry: ProviderRegistry,
    on_progress: Option<ProgressCallback>,
}

impl WalletAnalyzer {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            on_progress: None,
        }
    }

    /// Explorer-backed analyzer for every enabled chain with a key
    pub fn from_api_keys(keys: &ApiKeyConfig) -> AppResult<Self> {
        Ok(Self::new(ProviderRegistry::from_api_keys(keys)?))
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn report(&self, stage: &str, current: usize, message: String) {
        if let Some(callback) = &self.on_progress {
            callback(&Progress {
                stage: stage.to_string(),
                current,
                total: ANALYSIS_STAGES,
                message,
            });
        }
    }

    fn tree_builder(&self, provider: Arc<dyn TransactionProvider>) -> FundingTreeBuilder {
        let builder = FundingTreeBuilder::new(provider);
        match &self.on_progress {
            Some(callback) => builder.with_progress(callback.clone()),
            None => builder,
        }
    }

    // ============================================
    // SINGLE WALLET
    // ============================================

    /// Full analysis of one wallet
    pub async fn analyze(
        &self,
        address: &str,
        chain: ChainId,
        options: AnalyzeOptions,
    ) -> AppResult<AnalysisResult> {
        let address = validate_address(address)?;
        let provider = self.registry.get(chain)?;
        let started = Instant::now();

        info!("🔍 Analyzing {}... on {}", short_address(&address), chain.name());

        self.report("Fetching wallet info", 1, format!("Loading {}", address));
        let wallet = match provider.get_wallet_info(&address).await {
            Ok(info) => info,
            Err(e) => {
                warn!("⚠️ [{}...] Wallet info unavailable: {}", short_address(&address), e);
                WalletInfo::unknown(&address, chain)
            }
        };

        self.report("Fetching transactions", 2, "Loading transaction history".to_string());
        let filters = options.filters.as_ref();
        let (ordinary, internal, token_transfers) = tokio::join!(
            provider.get_transactions(&address, filters),
            provider.get_internal_transactions(&address, filters),
            provider.get_token_transfers(&address, filters),
        );
        let ordinary = or_empty(ordinary, "transactions", &address);
        let internal = or_empty(internal, "internal transactions", &address);
        let token_transfers = or_empty(token_transfers, "token transfers", &address);
        let transactions = merge_transactions(ordinary, internal);

        self.report(
            "Building funding tree",
            3,
            format!("Tracing funds around {}...", short_address(&address)),
        );
        let tree_config = options.tree_config.unwrap_or_default();
        let (funding_sources, funding_destinations) =
            self.build_trees(provider, &address, &tree_config).await;

        self.report(
            "Detecting suspicious activity",
            4,
            format!("Checking {} transactions", transactions.len()),
        );
        let detector = SuspiciousDetector::new(chain);
        let first_seen = wallet.first_tx_timestamp.or_else(|| earliest_timestamp(&transactions));
        let age = wallet_age_days(first_seen, Utc::now().timestamp());
        let suspicious_indicators =
            detector.detect(&transactions, &funding_sources, &funding_destinations, age);
        let overall_risk_score = SuspiciousDetector::calculate_risk_score(&suspicious_indicators);
        let risk_level = SuspiciousDetector::get_risk_level(overall_risk_score);

        self.report("Analyzing projects", 5, "Matching known protocols".to_string());
        let projects_interacted = identify_projects(&transactions);

        self.report("Generating summary", 6, "Aggregating statistics".to_string());
        let summary = generate_summary(
            &address,
            &transactions,
            &funding_sources,
            &funding_destinations,
        );
        let same_block_transactions = detector.group_by_block(&transactions);

        info!(
            "{} [{}...] Risk {} ({}/100) | {} txs | {} indicators | {}ms",
            risk_level.emoji(),
            short_address(&address),
            risk_level.as_str(),
            overall_risk_score,
            transactions.len(),
            suspicious_indicators.len(),
            started.elapsed().as_millis()
        );

        Ok(AnalysisResult {
            wallet,
            transactions,
            token_transfers,
            funding_sources,
            funding_destinations,
            suspicious_indicators,
            overall_risk_score,
            risk_level,
            projects_interacted,
            same_block_transactions,
            summary,
        })
    }

    /// Requested trees run concurrently, each with its own visited set
    async fn build_trees(
        &self,
        provider: Arc<dyn TransactionProvider>,
        address: &str,
        config: &FundingTreeConfig,
    ) -> (FundingNode, FundingNode) {
        let builder = self.tree_builder(provider);

        let sources = async {
            if config.direction.includes(Direction::Source) {
                builder.build_source_tree(address, config).await
            } else {
                FundingNode::new(address, 0, Direction::Source)
            }
        };
        let destinations = async {
            if config.direction.includes(Direction::Destination) {
                builder.build_destination_tree(address, config).await
            } else {
                FundingNode::new(address, 0, Direction::Destination)
            }
        };

        tokio::join!(sources, destinations)
    }

    // ============================================
    // MULTI WALLET
    // ============================================

    /// Analyze every wallet concurrently and correlate the results
    pub async fn compare_wallets<S: AsRef<str>>(
        &self,
        addresses: &[S],
        chain: ChainId,
        options: CompareOptions,
    ) -> AppResult<MultiWalletResult> {
        let mut wallets = Vec::new();
        let mut seen = HashSet::new();
        for address in addresses {
            let address = validate_address(address.as_ref())?;
            if seen.insert(address.clone()) {
                wallets.push(address);
            }
        }

        if wallets.len() < 2 {
            return Err(AppError::invalid_input(
                "Comparison needs at least two distinct addresses",
            ));
        }
        self.registry.get(chain)?;

        info!("🕵️ Comparing {} wallets on {}", wallets.len(), chain.name());

        let analyze_options = AnalyzeOptions {
            tree_config: options.tree_config,
            filters: None,
        };
        let results = join_all(
            wallets
                .iter()
                .map(|address| self.analyze(address, chain, analyze_options.clone())),
        )
        .await
        .into_iter()
        .collect::<AppResult<Vec<_>>>()?;

        Ok(build_multi_wallet_result(results))
    }

    /// Shared funding ancestors of two wallets (depth defaults to 3)
    pub async fn find_common_ancestors(
        &self,
        address_a: &str,
        address_b: &str,
        chain: ChainId,
        max_depth: Option<u32>,
    ) -> AppResult<Vec<String>> {
        let a = validate_address(address_a)?;
        let b = validate_address(address_b)?;
        let provider = self.registry.get(chain)?;

        let ancestors = self
            .tree_builder(provider)
            .find_common_ancestors(&a, &b, max_depth.unwrap_or(DEFAULT_ANCESTOR_DEPTH))
            .await;

        info!(
            "🧬 {} common ancestor(s) for {}... and {}...",
            ancestors.len(),
            short_address(&a),
            short_address(&b)
        );
        Ok(ancestors)
    }
}

// ============================================
// HELPERS
// ============================================

fn validate_address(address: &str) -> AppResult<String> {
    if !is_valid_address(address) {
        return Err(AppError::invalid_address(address.trim()));
    }
    Ok(normalize_address(address))
}

fn or_empty(result: AppResult<Vec<Transaction>>, what: &str, address: &str) -> Vec<Transaction> {
    result.unwrap_or_else(|e| {
        warn!("⚠️ [{}...] Failed to fetch {}: {}", short_address(address), what, e);
        Vec::new()
    })
}

fn earliest_timestamp(transactions: &[Transaction]) -> Option<u64> {
    transactions
        .iter()
        .map(|tx| tx.timestamp)
        .filter(|&ts| ts > 0)
        .min()
}

/// Whole days between the first transaction and `now`
pub fn wallet_age_days(first_tx_timestamp: Option<u64>, now: i64) -> Option<u64> {
    let first = first_tx_timestamp?;
    let now = u64::try_from(now).unwrap_or(0);
    Some(now.saturating_sub(first) / SECONDS_PER_DAY)
}

/// Contracts the wallet called, labelled from the known-project table
pub fn identify_projects(transactions: &[Transaction]) -> Vec<ProjectInteraction> {
    let mut projects: HashMap<String, ProjectInteraction> = HashMap::new();

    for tx in transactions {
        let Some(to) = tx.to.as_deref().map(normalize_address) else {
            continue;
        };
        let known = lookup_project(&to);
        if tx.category != TxCategory::ContractCall && known.is_none() {
            continue;
        }

        let entry = projects
            .entry(to.clone())
            .or_insert_with(|| ProjectInteraction {
                contract_address: to,
                project_name: known.map(|p| p.name.to_string()),
                category: known.map_or(ProjectCategory::Unknown, |p| p.category),
                interaction_count: 0,
                total_value_in_eth: 0.0,
                first_interaction: tx.timestamp,
                last_interaction: tx.timestamp,
            });
        entry.interaction_count += 1;
        entry.total_value_in_eth += tx.value_in_eth;
        entry.first_interaction = entry.first_interaction.min(tx.timestamp);
        entry.last_interaction = entry.last_interaction.max(tx.timestamp);
    }

    let mut list: Vec<ProjectInteraction> = projects.into_values().collect();
    list.sort_by(|a, b| {
        b.interaction_count
            .cmp(&a.interaction_count)
            .then_with(|| a.contract_address.cmp(&b.contract_address))
    });
    list
}

/// Summary statistics. Value totals include failed transactions.
pub fn generate_summary(
    address: &str,
    transactions: &[Transaction],
    sources: &FundingNode,
    destinations: &FundingNode,
) -> AnalysisSummary {
    let successful_txs = transactions.iter().filter(|tx| tx.is_success()).count();
    let failed_txs = transactions
        .iter()
        .filter(|tx| tx.status == TxStatus::Failed)
        .count();

    let (mut sent, mut received) = (0.0, 0.0);
    for tx in transactions {
        if tx.is_incoming {
            received += tx.value_in_eth;
        } else {
            sent += tx.value_in_eth;
        }
    }

    let unique: HashSet<String> = transactions
        .iter()
        .flat_map(|tx| std::iter::once(tx.from.as_str()).chain(tx.to.as_deref()))
        .map(normalize_address)
        .filter(|a| a != address)
        .collect();

    let timestamps: Vec<u64> = transactions
        .iter()
        .map(|tx| tx.timestamp)
        .filter(|&ts| ts > 0)
        .collect();
    let activity_period_days = match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(min), Some(max)) if timestamps.len() > 1 => {
            (max - min).div_ceil(SECONDS_PER_DAY).max(1)
        }
        _ => 1,
    };

    AnalysisSummary {
        total_transactions: transactions.len(),
        successful_txs,
        failed_txs,
        total_value_sent_eth: sent,
        total_value_received_eth: received,
        unique_interacted_addresses: unique.len(),
        top_funding_sources: top_children(sources),
        top_funding_destinations: top_children(destinations),
        activity_period_days,
        average_tx_per_day: transactions.len() as f64 / activity_period_days as f64,
    }
}

fn top_children(root: &FundingNode) -> Vec<AddressValue> {
    root.children
        .iter()
        .take(SUMMARY_TOP_COUNTERPARTIES)
        .map(|child| AddressValue {
            address: child.address.clone(),
            value_eth: child.total_value_in_eth,
        })
        .collect()
}
