//! Suspicious Activity Detector & Risk Scorer
//!
//! Heuristic pattern checks over a wallet's merged history and its two
//! funding trees. Each check emits at most one indicator with its own
//! score; `calculate_risk_score` folds them into 0-100 with diminishing
//! weight per pattern type so one category cannot dominate.
//!
//! Score bands:
//! - 0-24: Low
//! - 25-49: Medium
//! - 50-74: High
//! - 75-100: Critical

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crate::models::config::ChainId;
use crate::models::types::{
    FundingNode, PatternType, SameBlockGroup, Severity, SuspiciousIndicator, Transaction,
};
use crate::utils::constants::{
    short_address, BRAND_NEW_WALLET_MIN_TXS, DUST_MIN_SENDERS, DUST_THRESHOLD_ETH,
    FRESH_WALLET_DAYS, FRESH_WALLET_MIN_TXS, RAPID_MOVEMENT_MIN_RATIO, RAPID_MOVEMENT_WINDOW_SECS,
    RISK_CATEGORY_CAP, SAME_BLOCK_MIN_COUNTERPARTIES, SYBIL_MAX_AMOUNT_SPREAD, SYBIL_MIN_RECIPIENTS,
    SYBIL_SINGLE_FUNDER_SHARE, WASH_MAX_IMBALANCE, WASH_MIN_TRANSFERS_EACH_WAY,
};
use crate::utils::known_addresses::{is_infrastructure, is_mixer, lookup_entity, lookup_project};

/// Evidence lists are truncated to this many entries
const MAX_EVIDENCE: usize = 5;

/// Stateless detector bound to one chain's known-entity table
#[derive(Debug, Clone, Copy)]
pub struct SuspiciousDetector {
    chain: ChainId,
}

impl SuspiciousDetector {
    pub fn new(chain: ChainId) -> Self {
        Self { chain }
    }

    /// Run every check
    pub fn detect(
        &self,
        transactions: &[Transaction],
        sources: &FundingNode,
        destinations: &FundingNode,
        wallet_age_days: Option<u64>,
    ) -> Vec<SuspiciousIndicator> {
        let indicators: Vec<SuspiciousIndicator> = [
            self.check_known_bad_actor(transactions, sources, destinations),
            self.check_sybil_farming(sources, destinations, wallet_age_days),
            self.check_circular_flow(sources, destinations),
            self.check_wash_trading(transactions),
            self.check_rapid_movement(transactions),
            self.check_same_block(transactions),
            self.check_fresh_wallet(transactions, wallet_age_days),
            self.check_dust_attack(transactions),
        ]
        .into_iter()
        .flatten()
        .collect();

        for indicator in &indicators {
            debug!("🚩 {}", indicator.summary());
        }
        indicators
    }

    // ============================================
    // PATTERN CHECKS
    // ============================================

    fn check_fresh_wallet(
        &self,
        transactions: &[Transaction],
        wallet_age_days: Option<u64>,
    ) -> Option<SuspiciousIndicator> {
        let age = wallet_age_days?;
        let count = transactions.len();

        let (severity, score) = if age < 1 && count >= BRAND_NEW_WALLET_MIN_TXS {
            (Severity::High, 25)
        } else if age < FRESH_WALLET_DAYS && count >= FRESH_WALLET_MIN_TXS {
            (Severity::Medium, 15)
        } else {
            return None;
        };

        Some(SuspiciousIndicator::new(
            PatternType::FreshWallet,
            severity,
            format!("Wallet is {} day(s) old with {} transactions", age, count),
            vec![format!("Age: {} days", age), format!("Transactions: {}", count)],
            score,
        ))
    }

    fn check_same_block(&self, transactions: &[Transaction]) -> Option<SuspiciousIndicator> {
        let suspicious: Vec<SameBlockGroup> = self
            .group_by_block(transactions)
            .into_iter()
            .filter(|g| g.is_suspicious)
            .collect();

        if suspicious.is_empty() {
            return None;
        }

        let groups = suspicious.len();
        let severity = if groups >= 3 { Severity::High } else { Severity::Medium };
        let evidence = suspicious
            .iter()
            .take(MAX_EVIDENCE)
            .map(|g| format!("Block {}: {} transactions", g.block_number, g.transactions.len()))
            .collect();

        Some(SuspiciousIndicator::new(
            PatternType::SameBlockActivity,
            severity,
            format!("{} block(s) with activity from unrelated counterparties", groups),
            evidence,
            capped_score(8 * groups, 25),
        ))
    }

    /// Incoming value forwarded within the window
    fn check_rapid_movement(&self, transactions: &[Transaction]) -> Option<SuspiciousIndicator> {
        let outgoing: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| !tx.is_incoming && tx.is_success() && tx.is_native_value())
            .collect();

        let mut evidence = Vec::new();
        let mut pairs = 0usize;

        for incoming in transactions
            .iter()
            .filter(|tx| tx.is_incoming && tx.is_success() && tx.is_native_value())
        {
            let window_end = incoming.timestamp + RAPID_MOVEMENT_WINDOW_SECS;
            let forwarded: f64 = outgoing
                .iter()
                .filter(|out| out.timestamp >= incoming.timestamp && out.timestamp <= window_end)
                .map(|out| out.value_in_eth)
                .sum();

            if forwarded >= incoming.value_in_eth * RAPID_MOVEMENT_MIN_RATIO {
                pairs += 1;
                if evidence.len() < MAX_EVIDENCE {
                    evidence.push(format!(
                        "{:.4} received in {} and {:.4} forwarded within {} min",
                        incoming.value_in_eth,
                        short_address(&incoming.hash),
                        forwarded,
                        RAPID_MOVEMENT_WINDOW_SECS / 60
                    ));
                }
            }
        }

        if pairs == 0 {
            return None;
        }

        let severity = match pairs {
            1 => Severity::Low,
            2..=4 => Severity::Medium,
            _ => Severity::High,
        };

        Some(SuspiciousIndicator::new(
            PatternType::RapidMovement,
            severity,
            format!("Funds forwarded shortly after receipt {} time(s)", pairs),
            evidence,
            capped_score(8 * pairs, 25),
        ))
    }

    fn check_circular_flow(
        &self,
        sources: &FundingNode,
        destinations: &FundingNode,
    ) -> Option<SuspiciousIndicator> {
        let mut evidence = Vec::new();
        let mut cycles = 0usize;

        for tree in [sources, destinations] {
            let mut path = Vec::new();
            collect_path_cycles(tree, &mut path, &mut cycles, &mut evidence);
        }

        let in_sources: HashSet<String> = sources
            .flatten_nodes()
            .into_iter()
            .filter(|n| !n.is_infrastructure && n.address != sources.address)
            .map(|n| n.address.clone())
            .collect();

        let mut both = HashSet::new();
        for node in destinations.flatten_nodes() {
            if !node.is_infrastructure
                && in_sources.contains(&node.address)
                && both.insert(node.address.clone())
            {
                cycles += 1;
                if evidence.len() < MAX_EVIDENCE {
                    evidence.push(format!(
                        "{}... both funds and receives from this wallet",
                        short_address(&node.address)
                    ));
                }
            }
        }

        if cycles == 0 {
            return None;
        }

        Some(SuspiciousIndicator::new(
            PatternType::CircularFlow,
            Severity::High,
            format!("{} circular funding path(s) detected", cycles),
            evidence,
            capped_score(10 * cycles, 30),
        ))
    }

    fn check_dust_attack(&self, transactions: &[Transaction]) -> Option<SuspiciousIndicator> {
        let senders: HashSet<&str> = transactions
            .iter()
            .filter(|tx| {
                tx.is_incoming && tx.value_in_eth > 0.0 && tx.value_in_eth < DUST_THRESHOLD_ETH
            })
            .map(|tx| tx.from.as_str())
            .collect();

        if senders.len() < DUST_MIN_SENDERS {
            return None;
        }

        let mut evidence: Vec<String> = senders
            .iter()
            .map(|s| format!("Dust from {}...", short_address(s)))
            .collect();
        evidence.sort();
        evidence.truncate(MAX_EVIDENCE);

        Some(SuspiciousIndicator::new(
            PatternType::DustAttack,
            Severity::Low,
            format!("Dust transfers received from {} distinct addresses", senders.len()),
            evidence,
            10,
        ))
    }

    /// Balanced back-and-forth value with the same counterparty
    fn check_wash_trading(&self, transactions: &[Transaction]) -> Option<SuspiciousIndicator> {
        #[derive(Default)]
        struct Flow {
            in_count: usize,
            out_count: usize,
            in_value: f64,
            out_value: f64,
        }

        let mut flows: HashMap<&str, Flow> = HashMap::new();
        for tx in transactions.iter().filter(|tx| tx.is_native_value() && tx.is_success()) {
            let Some(counterparty) = tx.counterparty() else {
                continue;
            };
            if is_infrastructure(self.chain, counterparty) {
                continue;
            }
            let flow = flows.entry(counterparty).or_default();
            if tx.is_incoming {
                flow.in_count += 1;
                flow.in_value += tx.value_in_eth;
            } else {
                flow.out_count += 1;
                flow.out_value += tx.value_in_eth;
            }
        }

        let mut flagged: Vec<(&str, &Flow)> = flows
            .iter()
            .filter(|(_, f)| {
                f.in_count >= WASH_MIN_TRANSFERS_EACH_WAY
                    && f.out_count >= WASH_MIN_TRANSFERS_EACH_WAY
                    && relative_gap(f.in_value, f.out_value) <= WASH_MAX_IMBALANCE
            })
            .map(|(addr, f)| (*addr, f))
            .collect();

        if flagged.is_empty() {
            return None;
        }
        flagged.sort_by(|a, b| a.0.cmp(b.0));

        let evidence = flagged
            .iter()
            .take(MAX_EVIDENCE)
            .map(|(addr, f)| {
                format!(
                    "{}...: {} in ({:.4}) / {} out ({:.4})",
                    short_address(addr),
                    f.in_count,
                    f.in_value,
                    f.out_count,
                    f.out_value
                )
            })
            .collect();

        Some(SuspiciousIndicator::new(
            PatternType::WashTrading,
            Severity::High,
            format!("Balanced round-trip transfers with {} counterparties", flagged.len()),
            evidence,
            capped_score(15 * flagged.len(), 30),
        ))
    }

    fn check_sybil_farming(
        &self,
        sources: &FundingNode,
        destinations: &FundingNode,
        wallet_age_days: Option<u64>,
    ) -> Option<SuspiciousIndicator> {
        // Fan-out: many recipients receiving near-identical amounts
        let mut amounts: Vec<f64> = destinations
            .children
            .iter()
            .filter(|c| !c.is_infrastructure && c.total_value_in_eth > 0.0)
            .map(|c| c.total_value_in_eth)
            .collect();
        amounts.sort_by(f64::total_cmp);

        let cluster = largest_similar_cluster(&amounts, SYBIL_MAX_AMOUNT_SPREAD);
        if cluster >= SYBIL_MIN_RECIPIENTS {
            return Some(SuspiciousIndicator::new(
                PatternType::SybilFarming,
                Severity::High,
                format!("Funded {} wallets with near-identical amounts", cluster),
                vec![format!(
                    "{} of {} direct recipients within {:.0}% of each other",
                    cluster,
                    destinations.children.len(),
                    SYBIL_MAX_AMOUNT_SPREAD * 100.0
                )],
                30,
            ));
        }

        // Fresh wallet seeded by one funder
        let fresh = wallet_age_days.is_some_and(|age| age < FRESH_WALLET_DAYS);
        let top = sources.children.first()?;
        if !fresh || top.is_infrastructure || sources.total_value_in_eth <= 0.0 {
            return None;
        }

        let share = top.total_value_in_eth / sources.total_value_in_eth;
        if share < SYBIL_SINGLE_FUNDER_SHARE {
            return None;
        }

        Some(SuspiciousIndicator::new(
            PatternType::SybilFarming,
            Severity::Medium,
            "Fresh wallet funded almost entirely by one address",
            vec![format!(
                "{}... supplied {:.0}% of inflow",
                short_address(&top.address),
                share * 100.0
            )],
            15,
        ))
    }

    fn check_known_bad_actor(
        &self,
        transactions: &[Transaction],
        sources: &FundingNode,
        destinations: &FundingNode,
    ) -> Option<SuspiciousIndicator> {
        let mut hits: Vec<String> = Vec::new();
        let mut seen = HashSet::new();

        let tree_addresses = sources
            .flatten_addresses()
            .into_iter()
            .chain(destinations.flatten_addresses());
        let counterparties = transactions
            .iter()
            .filter_map(|tx| tx.counterparty().map(str::to_lowercase));

        for address in counterparties.chain(tree_addresses) {
            if is_mixer(self.chain, &address) && seen.insert(address.clone()) {
                hits.push(address);
            }
        }

        if hits.is_empty() {
            return None;
        }

        let evidence = hits
            .iter()
            .map(|addr| {
                let name = lookup_entity(self.chain, addr).map(|e| e.name).unwrap_or("mixer");
                format!("{} ({}...)", name, short_address(addr))
            })
            .collect();

        Some(SuspiciousIndicator::new(
            PatternType::KnownBadActor,
            Severity::Critical,
            format!("Interacted with {} known mixer address(es)", hits.len()),
            evidence,
            capped_score(40 * hits.len(), 40),
        ))
    }

    // ============================================
    // SAME-BLOCK GROUPING
    // ============================================

    /// Blocks holding at least two of the wallet's transactions, newest first
    pub fn group_by_block(&self, transactions: &[Transaction]) -> Vec<SameBlockGroup> {
        let mut blocks: BTreeMap<u64, Vec<&Transaction>> = BTreeMap::new();
        for tx in transactions {
            blocks.entry(tx.block_number).or_default().push(tx);
        }

        blocks
            .into_iter()
            .rev()
            .filter(|(_, txs)| txs.len() >= 2)
            .map(|(block_number, txs)| {
                let counterparties: HashSet<String> = txs
                    .iter()
                    .filter_map(|tx| tx.counterparty().map(str::to_lowercase))
                    .collect();
                let known = counterparties
                    .iter()
                    .any(|c| is_infrastructure(self.chain, c) || lookup_project(c).is_some());
                let is_suspicious =
                    counterparties.len() >= SAME_BLOCK_MIN_COUNTERPARTIES && !known;

                SameBlockGroup {
                    block_number,
                    timestamp: txs.iter().map(|t| t.timestamp).min().unwrap_or(0),
                    reason: is_suspicious.then(|| {
                        format!(
                            "{} transactions with {} distinct counterparties in one block",
                            txs.len(),
                            counterparties.len()
                        )
                    }),
                    transactions: txs.into_iter().cloned().collect(),
                    is_suspicious,
                }
            })
            .collect()
    }

    // ============================================
    // SCORING
    // ============================================

    /// Combine indicator scores into 0-100.
    ///
    /// Within one pattern type scores are taken largest first with halving
    /// weight (s1 + s2/2 + s3/4 ...) and capped per type.
    pub fn calculate_risk_score(indicators: &[SuspiciousIndicator]) -> u8 {
        let mut by_type: HashMap<PatternType, Vec<u8>> = HashMap::new();
        for indicator in indicators {
            by_type.entry(indicator.pattern).or_default().push(indicator.score);
        }

        let total: f64 = by_type
            .into_values()
            .map(|mut scores| {
                scores.sort_unstable_by(|a, b| b.cmp(a));
                let weighted: f64 = scores
                    .iter()
                    .enumerate()
                    .map(|(i, s)| *s as f64 / 2f64.powi(i as i32))
                    .sum();
                weighted.min(RISK_CATEGORY_CAP)
            })
            .sum();

        total.min(100.0).round() as u8
    }

    /// Fixed bands over the 0-100 score
    pub fn get_risk_level(score: u8) -> Severity {
        match score {
            0..=24 => Severity::Low,
            25..=49 => Severity::Medium,
            50..=74 => Severity::High,
            _ => Severity::Critical,
        }
    }
}

// ============================================
// HELPERS
// ============================================

fn capped_score(raw: usize, cap: u8) -> u8 {
    raw.min(cap as usize) as u8
}

/// |a - b| relative to the larger side
fn relative_gap(a: f64, b: f64) -> f64 {
    let larger = a.max(b);
    if larger <= 0.0 {
        return 0.0;
    }
    (a - b).abs() / larger
}

/// Size of the largest run of sorted amounts within `spread` of its maximum
fn largest_similar_cluster(sorted: &[f64], spread: f64) -> usize {
    let mut best = 0;
    let mut start = 0;
    for end in 0..sorted.len() {
        while sorted[end] - sorted[start] > spread * sorted[end] {
            start += 1;
        }
        best = best.max(end - start + 1);
    }
    best
}

/// Count nodes whose address already appears on their own ancestor path
fn collect_path_cycles<'a>(
    node: &'a FundingNode,
    path: &mut Vec<&'a str>,
    cycles: &mut usize,
    evidence: &mut Vec<String>,
) {
    if path.contains(&node.address.as_str()) {
        *cycles += 1;
        if evidence.len() < MAX_EVIDENCE {
            evidence.push(format!(
                "{}... reappears at depth {}",
                short_address(&node.address),
                node.depth
            ));
        }
    }

    path.push(&node.address);
    for child in &node.children {
        collect_path_cycles(child, path, cycles, evidence);
    }
    path.pop();
}
