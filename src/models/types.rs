//! Type definitions for wallet forensics
//! All core data structures shared by providers, the builder and the detector.
//!
//! Serialized field names are camelCase so results keep the JSON shape the
//! presentation layers already consume.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::config::ChainId;
use crate::utils::constants::{DEFAULT_TREE_DEPTH, MAX_TREE_DEPTH};

// ============================================
// TRANSACTIONS
// ============================================

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Failed,
    Pending,
}

/// Transaction type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxCategory {
    Transfer,
    ContractCreation,
    ContractCall,
    TokenTransfer,
    NftTransfer,
    DexSwap,
    Bridge,
    Lending,
    Staking,
    Unknown,
}

/// Token transfer event attached to a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: u8,
    pub from: String,
    pub to: String,
    /// Raw amount in the token's smallest unit
    pub value: String,
    pub value_formatted: f64,
}

/// Normalized transaction record. Identity is `hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub from: String,
    pub to: Option<String>,
    /// Value in wei
    pub value: String,
    pub value_in_eth: f64,
    pub gas_cost_in_eth: f64,
    pub status: TxStatus,
    pub category: TxCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_id: Option<String>,
    /// Relative to the address the record was fetched for
    pub is_incoming: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_transfers: Vec<TokenTransfer>,
}

impl Transaction {
    /// Native value moves (plain transfers and payable contract calls)
    #[inline]
    pub fn is_native_value(&self) -> bool {
        matches!(self.category, TxCategory::Transfer | TxCategory::ContractCall)
            && self.value_in_eth > 0.0
    }

    /// The other side of the transaction relative to the fetched address
    pub fn counterparty(&self) -> Option<&str> {
        if self.is_incoming {
            Some(self.from.as_str())
        } else {
            self.to.as_deref()
        }
    }

    /// Counterparty as seen from a funding-tree direction
    pub fn counterparty_for(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Source => Some(self.from.as_str()),
            Direction::Destination => self.to.as_deref(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}

// ============================================
// WALLETS & KNOWN ENTITIES
// ============================================

/// Kind of a known infrastructure address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Bridge,
    Exchange,
    Mixer,
    Contract,
    Other,
}

impl EntityKind {
    /// Bridges, exchanges and mixers pool many users' funds
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Bridge | Self::Exchange | Self::Mixer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bridge => "bridge",
            Self::Exchange => "exchange",
            Self::Mixer => "mixer",
            Self::Contract => "contract",
            Self::Other => "other",
        }
    }
}

/// Wallet information and stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub address: String,
    pub chain: ChainId,
    /// Balance in wei
    pub balance: String,
    pub balance_in_eth: f64,
    pub tx_count: u64,
    pub first_tx_timestamp: Option<u64>,
    pub last_tx_timestamp: Option<u64>,
    pub is_contract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub is_infrastructure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_type: Option<EntityKind>,
}

impl WalletInfo {
    /// Placeholder used when the wallet-info call fails
    pub fn unknown(address: &str, chain: ChainId) -> Self {
        Self {
            address: address.to_string(),
            chain,
            balance: "0".to_string(),
            balance_in_eth: 0.0,
            tx_count: 0,
            first_tx_timestamp: None,
            last_tx_timestamp: None,
            is_contract: false,
            label: None,
            is_infrastructure: false,
            infrastructure_type: None,
        }
    }
}

// ============================================
// FUNDING TREE
// ============================================

/// Which counterparties a funding tree follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Senders (who funded the address)
    Source,
    /// Receivers (who the address funded)
    Destination,
}

impl Direction {
    /// Does a transaction fetched for the node move value in this direction?
    #[inline]
    pub fn accepts(&self, tx: &Transaction) -> bool {
        match self {
            Self::Source => tx.is_incoming,
            Self::Destination => !tx.is_incoming,
        }
    }

    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::Source => "Tracing funding sources",
            Self::Destination => "Tracing destinations",
        }
    }
}

/// Trees requested by an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeDirection {
    Sources,
    Destinations,
    #[default]
    Both,
}

impl TreeDirection {
    pub fn includes(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Self::Both, _)
                | (Self::Sources, Direction::Source)
                | (Self::Destinations, Direction::Destination)
        )
    }
}

/// Inclusive unix-timestamp bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl TimeRange {
    pub fn contains(&self, timestamp: u64) -> bool {
        self.start.map_or(true, |s| timestamp >= s) && self.end.map_or(true, |e| timestamp <= e)
    }
}

/// Funding tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FundingTreeConfig {
    pub max_depth: u32,
    pub direction: TreeDirection,
    pub min_value_eth: Option<f64>,
    pub time_range: Option<TimeRange>,
    /// Attach exchanges/bridges/mixers as leaves instead of expanding them
    pub stop_at_infrastructure: bool,
}

impl Default for FundingTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_TREE_DEPTH,
            direction: TreeDirection::Both,
            min_value_eth: None,
            time_range: None,
            stop_at_infrastructure: true,
        }
    }
}

impl FundingTreeConfig {
    pub fn with_depth(max_depth: u32) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Depth actually used by the builder
    pub fn effective_max_depth(&self) -> u32 {
        self.max_depth.min(MAX_TREE_DEPTH)
    }

    /// Provider filters derived from the tree settings
    pub fn to_filters(&self) -> FilterOptions {
        FilterOptions {
            time_range: self.time_range,
            min_value: self.min_value_eth,
            ..FilterOptions::default()
        }
    }
}

/// One address's position in a funding tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingNode {
    /// Lowercased canonical address
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub depth: u32,
    pub direction: Direction,
    pub total_value_in_eth: f64,
    pub tx_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_tx: Option<Transaction>,
    pub children: Vec<FundingNode>,
    pub suspicious_score: u8,
    pub suspicious_reasons: Vec<String>,
    #[serde(default)]
    pub is_infrastructure: bool,
}

impl FundingNode {
    /// Bare node with no aggregate data
    pub fn new(address: &str, depth: u32, direction: Direction) -> Self {
        Self {
            address: address.to_lowercase(),
            label: None,
            depth,
            direction,
            total_value_in_eth: 0.0,
            tx_count: 0,
            first_tx: None,
            children: Vec::new(),
            suspicious_score: 0,
            suspicious_reasons: Vec::new(),
            is_infrastructure: false,
        }
    }

    /// Pre-order address list (parent, then children in attach order)
    pub fn flatten_addresses(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_addresses(&mut out);
        out
    }

    fn collect_addresses(&self, out: &mut Vec<String>) {
        out.push(self.address.clone());
        for child in &self.children {
            child.collect_addresses(out);
        }
    }

    /// Pre-order node list
    pub fn flatten_nodes(&self) -> Vec<&FundingNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten_nodes());
        }
        out
    }

    /// Total nodes including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(FundingNode::node_count).sum::<usize>()
    }

    /// Deepest depth value in the subtree
    pub fn max_depth(&self) -> u32 {
        self.children
            .iter()
            .map(FundingNode::max_depth)
            .max()
            .unwrap_or(self.depth)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// ============================================
// FILTERS
// ============================================

/// Filter options for provider queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterOptions {
    pub time_range: Option<TimeRange>,
    /// Minimum native value
    pub min_value: Option<f64>,
    /// Maximum native value
    pub max_value: Option<f64>,
    pub categories: Option<Vec<TxCategory>>,
    pub status: Option<Vec<TxStatus>>,
    /// Only keep transactions touching these addresses
    pub address_filter: Option<Vec<String>>,
}

impl FilterOptions {
    /// Client-side predicate shared by every provider
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(range) = &self.time_range {
            if !range.contains(tx.timestamp) {
                return false;
            }
        }
        if let Some(min) = self.min_value {
            if tx.value_in_eth < min {
                return false;
            }
        }
        if let Some(max) = self.max_value {
            if tx.value_in_eth > max {
                return false;
            }
        }
        if let Some(categories) = &self.categories {
            if !categories.contains(&tx.category) {
                return false;
            }
        }
        if let Some(statuses) = &self.status {
            if !statuses.contains(&tx.status) {
                return false;
            }
        }
        if let Some(addresses) = &self.address_filter {
            let touches = addresses.iter().any(|a| {
                a.eq_ignore_ascii_case(&tx.from)
                    || tx.to.as_deref().is_some_and(|to| a.eq_ignore_ascii_case(to))
            });
            if !touches {
                return false;
            }
        }
        true
    }

    /// Apply to a whole list
    pub fn apply(&self, txs: Vec<Transaction>) -> Vec<Transaction> {
        txs.into_iter().filter(|tx| self.matches(tx)).collect()
    }
}

// ============================================
// SUSPICIOUS ACTIVITY
// ============================================

/// Severity / risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟡",
            Severity::Medium => "🟠",
            Severity::High => "🔴",
            Severity::Critical => "💀",
        }
    }
}

/// Types of suspicious patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    SybilFarming,
    WashTrading,
    RapidMovement,
    DustAttack,
    SameBlockActivity,
    FreshWallet,
    CircularFlow,
    KnownBadActor,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::SybilFarming => "sybil_farming",
            PatternType::WashTrading => "wash_trading",
            PatternType::RapidMovement => "rapid_movement",
            PatternType::DustAttack => "dust_attack",
            PatternType::SameBlockActivity => "same_block_activity",
            PatternType::FreshWallet => "fresh_wallet",
            PatternType::CircularFlow => "circular_flow",
            PatternType::KnownBadActor => "known_bad_actor",
        }
    }
}

/// Suspicious activity indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousIndicator {
    #[serde(rename = "type")]
    pub pattern: PatternType,
    pub severity: Severity,
    pub description: String,
    pub evidence: Vec<String>,
    pub score: u8,
}

impl SuspiciousIndicator {
    pub fn new(
        pattern: PatternType,
        severity: Severity,
        description: impl Into<String>,
        evidence: Vec<String>,
        score: u8,
    ) -> Self {
        Self {
            pattern,
            severity,
            description: description.into(),
            evidence,
            score,
        }
    }

    /// One-line rendering for logs
    pub fn summary(&self) -> String {
        format!(
            "{} [{}] {} (+{})",
            self.severity.emoji(),
            self.pattern.as_str(),
            self.description,
            self.score
        )
    }
}

// ============================================
// ANALYSIS RESULTS
// ============================================

/// Project category from the known-project table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    Defi,
    Nft,
    Bridge,
    Dao,
    Gaming,
    Unknown,
}

/// Project/protocol interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInteraction {
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub category: ProjectCategory,
    pub interaction_count: usize,
    pub total_value_in_eth: f64,
    pub first_interaction: u64,
    pub last_interaction: u64,
}

/// Transactions sharing one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SameBlockGroup {
    pub block_number: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub is_suspicious: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Address with an aggregated value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressValue {
    pub address: String,
    pub value_eth: f64,
}

/// Analysis summary stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_transactions: usize,
    pub successful_txs: usize,
    pub failed_txs: usize,
    pub total_value_sent_eth: f64,
    pub total_value_received_eth: f64,
    pub unique_interacted_addresses: usize,
    pub top_funding_sources: Vec<AddressValue>,
    pub top_funding_destinations: Vec<AddressValue>,
    pub activity_period_days: u64,
    pub average_tx_per_day: f64,
}

/// Complete wallet analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub wallet: WalletInfo,
    /// Ordinary + internal, deduplicated, newest first
    pub transactions: Vec<Transaction>,
    pub token_transfers: Vec<Transaction>,
    pub funding_sources: FundingNode,
    pub funding_destinations: FundingNode,
    pub suspicious_indicators: Vec<SuspiciousIndicator>,
    pub overall_risk_score: u8,
    pub risk_level: Severity,
    pub projects_interacted: Vec<ProjectInteraction>,
    pub same_block_transactions: Vec<SameBlockGroup>,
    pub summary: AnalysisSummary,
}

impl AnalysisResult {
    /// Pretty print for terminals
    pub fn report(&self) -> String {
        let mut output = format!(
            "\n{} Risk: {} ({}/100) | Wallet: {}\n",
            self.risk_level.emoji(),
            self.risk_level.as_str(),
            self.overall_risk_score,
            self.wallet.address
        );
        output.push_str(&format!(
            "   Transactions: {} ({} failed)\n",
            self.summary.total_transactions, self.summary.failed_txs
        ));
        output.push_str(&format!(
            "   Funding sources: {} | Destinations: {}\n",
            self.funding_sources.children.len(),
            self.funding_destinations.children.len()
        ));

        if !self.suspicious_indicators.is_empty() {
            output.push_str("   Indicators:\n");
            for indicator in &self.suspicious_indicators {
                output.push_str(&format!("     - {}\n", indicator.summary()));
            }
        }

        output
    }
}

/// Multi-wallet comparison result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiWalletResult {
    pub wallets: Vec<AnalysisResult>,
    pub common_funding_sources: Vec<String>,
    pub common_destinations: Vec<String>,
    pub shared_projects: Vec<ProjectInteraction>,
    pub direct_transfers: Vec<Transaction>,
    pub correlation_score: u8,
    pub is_sybil_likely: bool,
}

// ============================================
// OPTIONS & PROGRESS
// ============================================

/// Options for a single-wallet analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeOptions {
    pub tree_config: Option<FundingTreeConfig>,
    pub filters: Option<FilterOptions>,
}

/// Options for a multi-wallet comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompareOptions {
    pub tree_config: Option<FundingTreeConfig>,
}

/// Progress milestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub stage: String,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Observer for long operations; never affects results
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;
