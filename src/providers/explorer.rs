//! Explorer Provider - Etherscan-compatible account API
//!
//! One generic adapter for every Etherscan-style explorer (Etherscan,
//! Lineascan, Arbiscan, Basescan...). Chains differ only by the
//! `ExplorerConfig` they are built with.
//!
//! Request pipeline:
//! 1. TTL response cache keyed by `(action, address)`
//! 2. Request spacing per configured requests/second
//! 3. Exponential backoff with jitter on retryable errors
//! 4. HTTP 429 or a "rate limit" payload maps to `PROVIDER_RATE_LIMITED`
//!
//! Records are normalized to `Transaction` with lowercased addresses and
//! `is_incoming` relative to the queried address.

use alloy_primitives::U256;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::config::{ChainId, ExplorerConfig};
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{
    Direction, FilterOptions, FundingNode, TokenTransfer, Transaction, TxCategory, TxStatus,
    WalletInfo,
};
use crate::providers::provider::TransactionProvider;
use crate::utils::cache::{CacheStats, ResponseCache};
use crate::utils::constants::{
    format_token_amount, normalize_address, parse_hex_quantity, parse_wei, short_address,
    wei_to_eth, BASE_RETRY_MS, EXPLORER_END_BLOCK, EXPLORER_PAGE_SIZE, FIRST_FUNDER_SCAN_SIZE, MAX_RETRY_MS,
    RETRY_JITTER_PERCENT, USER_AGENT as USER_AGENT_CONST,
};
use crate::utils::known_addresses::{label_for, lookup_entity};

// ============================================
// EXPLORER RESPONSE TYPES
// ============================================

/// Account endpoints answer `{status, message, result}`, proxy endpoints
/// answer JSON-RPC style `{result}` or `{error}`
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Union of the `txlist`, `txlistinternal` and `tokentx` record shapes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTransaction {
    hash: String,
    block_number: String,
    time_stamp: String,
    from: String,
    to: String,
    value: String,
    gas_used: String,
    gas_price: String,
    is_error: String,
    #[serde(rename = "txreceipt_status")]
    txreceipt_status: String,
    input: String,
    method_id: String,
    contract_address: String,
    token_name: String,
    token_symbol: String,
    token_decimal: String,
}

/// Which account endpoint a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxKind {
    Normal,
    Internal,
    Token,
}

impl TxKind {
    fn action(&self) -> &'static str {
        match self {
            Self::Normal => "txlist",
            Self::Internal => "txlistinternal",
            Self::Token => "tokentx",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

// ============================================
// EXPLORER PROVIDER
// ============================================

/// Etherscan-compatible transaction provider
#[derive(Clone)]
pub struct ExplorerProvider {
    config: ExplorerConfig,
    client: reqwest::Client,
    /// Time of the last outgoing request, for spacing
    last_request: Arc<Mutex<Option<Instant>>>,
    tx_cache: ResponseCache<Vec<Transaction>>,
    info_cache: ResponseCache<WalletInfo>,
    funder_cache: ResponseCache<Option<FundingNode>>,
}

impl ExplorerProvider {
    pub fn new(config: ExplorerConfig) -> AppResult<Self> {
        let client = Self::build_client(config.timeout)?;

        info!(
            "🔍 Explorer provider ready for {} ({})",
            config.chain.name(),
            config.api_url
        );

        Ok(Self {
            client,
            last_request: Arc::new(Mutex::new(None)),
            tx_cache: ResponseCache::with_ttl(config.cache_ttl_secs),
            info_cache: ResponseCache::with_ttl(config.cache_ttl_secs),
            funder_cache: ResponseCache::with_ttl(config.cache_ttl_secs),
            config,
        })
    }

    /// HTTP client with User-Agent and gzip
    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorCode::ConfigInvalidValue, "Failed to build HTTP client", e)
            })
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Transaction-history cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.tx_cache.stats()
    }

    // ============================================
    // REQUEST PIPELINE
    // ============================================

    /// Call with exponential backoff (500ms→1s→2s→... capped, ±20% jitter)
    async fn request(&self, params: &[(&'static str, String)]) -> AppResult<serde_json::Value> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let base_delay = BASE_RETRY_MS * 2_u64.pow(attempt - 1);
                let capped_delay = base_delay.min(MAX_RETRY_MS);

                let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
                let jitter: i64 = rand::thread_rng()
                    .gen_range(-(jitter_range as i64)..=(jitter_range as i64));
                let final_delay = (capped_delay as i64 + jitter).max(100) as u64;

                debug!(
                    "⏳ Retry {}/{} after {}ms",
                    attempt, self.config.max_retries, final_delay
                );
                tokio::time::sleep(Duration::from_millis(final_delay)).await;
            }

            self.wait_for_slot().await;

            match self.execute(params).await {
                Ok(result) => return Ok(result),
                Err(e) if e.code.is_retryable() => {
                    if e.is_rate_limited() {
                        warn!(
                            "⏳ Rate limited by {}, backing off (attempt {}/{})",
                            self.config.chain.name(),
                            attempt + 1,
                            self.config.max_retries + 1
                        );
                    }
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::connection_failed(format!(
                "Explorer request failed after {} retries",
                self.config.max_retries
            ))
        }))
    }

    /// Single GET against the explorer API
    async fn execute(&self, params: &[(&'static str, String)]) -> AppResult<serde_json::Value> {
        let mut query = params.to_vec();
        query.push(("apikey", self.config.api_key.clone()));

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_envelope(&body)
    }

    /// Keep requests at least `1 / requests_per_second` apart
    async fn wait_for_slot(&self) {
        let Some(interval) = self.config.min_request_interval() else {
            return;
        };

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    // ============================================
    // ACCOUNT ENDPOINTS
    // ============================================

    async fn fetch_page(
        &self,
        kind: TxKind,
        address: &str,
        sort: SortOrder,
        offset: u32,
    ) -> AppResult<Vec<Transaction>> {
        let params = account_query(kind, address, sort, offset);
        let result = self.request(&params).await?;
        let raw: Vec<RawTransaction> = serde_json::from_value(result)?;

        Ok(raw
            .iter()
            .map(|record| normalize_transaction(record, address, kind))
            .collect())
    }

    /// Full history page, newest first, cached
    async fn fetch_history(&self, kind: TxKind, address: &str) -> AppResult<Vec<Transaction>> {
        let address = normalize_address(address);
        if let Some(cached) = self.tx_cache.get(kind.action(), &address) {
            return Ok(cached);
        }

        let txs = self
            .fetch_page(kind, &address, SortOrder::Desc, EXPLORER_PAGE_SIZE)
            .await?;
        debug!(
            "📥 {} {} records for {}...",
            txs.len(),
            kind.action(),
            short_address(&address)
        );
        if page_is_full(txs.len()) {
            debug!(
                "📄 {} page full for {}..., older records not fetched",
                kind.action(),
                short_address(&address)
            );
        }

        self.tx_cache.set(kind.action(), &address, txs.clone());
        Ok(txs)
    }

    async fn fetch_balance(&self, address: &str) -> AppResult<U256> {
        let params = vec![
            ("module", "account".to_string()),
            ("action", "balance".to_string()),
            ("address", address.to_string()),
            ("tag", "latest".to_string()),
        ];
        let result = self.request(&params).await?;
        let wei = result
            .as_str()
            .ok_or_else(|| AppError::invalid_response("balance result is not a string"))?;
        Ok(parse_wei(wei))
    }

    async fn fetch_proxy(&self, action: &str, address: &str) -> AppResult<String> {
        let params = vec![
            ("module", "proxy".to_string()),
            ("action", action.to_string()),
            ("address", address.to_string()),
            ("tag", "latest".to_string()),
        ];
        let result = self.request(&params).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::invalid_response(format!("{} result is not a string", action)))
    }

    /// Earliest successful positive-value incoming transfer of one kind
    async fn earliest_incoming(&self, kind: TxKind, address: &str) -> AppResult<Option<Transaction>> {
        let txs = self
            .fetch_page(kind, address, SortOrder::Asc, FIRST_FUNDER_SCAN_SIZE)
            .await?;
        Ok(first_incoming(&txs).cloned())
    }

    fn funder_node(&self, tx: Transaction) -> FundingNode {
        let mut node = FundingNode::new(&tx.from, 1, Direction::Source);
        node.total_value_in_eth = tx.value_in_eth;
        node.tx_count = 1;
        node.label = label_for(self.config.chain, &node.address).map(str::to_string);
        node.is_infrastructure = lookup_entity(self.config.chain, &node.address)
            .is_some_and(|e| e.kind.is_infrastructure());
        node.first_tx = Some(tx);
        node
    }
}

#[async_trait]
impl TransactionProvider for ExplorerProvider {
    fn chain(&self) -> ChainId {
        self.config.chain
    }

    async fn get_wallet_info(&self, address: &str) -> AppResult<WalletInfo> {
        let address = normalize_address(address);
        if let Some(cached) = self.info_cache.get("walletinfo", &address) {
            return Ok(cached);
        }

        let (balance, code, nonce, first, last) = tokio::join!(
            self.fetch_balance(&address),
            self.fetch_proxy("eth_getCode", &address),
            self.fetch_proxy("eth_getTransactionCount", &address),
            self.fetch_page(TxKind::Normal, &address, SortOrder::Asc, 1),
            self.fetch_page(TxKind::Normal, &address, SortOrder::Desc, 1),
        );

        let balance = balance?;
        let is_contract = code
            .map(|c| !c.is_empty() && c != "0x")
            .unwrap_or(false);
        let tx_count = nonce.map(|n| parse_hex_quantity(&n)).unwrap_or(0);
        let first_tx_timestamp = first.ok().and_then(|txs| txs.first().map(|t| t.timestamp));
        let last_tx_timestamp = last.ok().and_then(|txs| txs.first().map(|t| t.timestamp));

        let entity = lookup_entity(self.config.chain, &address);
        let info = WalletInfo {
            label: label_for(self.config.chain, &address).map(str::to_string),
            is_infrastructure: entity.is_some_and(|e| e.kind.is_infrastructure()),
            infrastructure_type: entity.map(|e| e.kind),
            balance: balance.to_string(),
            balance_in_eth: wei_to_eth(balance),
            tx_count,
            first_tx_timestamp,
            last_tx_timestamp,
            is_contract,
            chain: self.config.chain,
            address,
        };

        self.info_cache.set("walletinfo", &info.address, info.clone());
        Ok(info)
    }

    async fn get_transactions(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>> {
        let txs = self.fetch_history(TxKind::Normal, address).await?;
        Ok(apply_filters(txs, filters))
    }

    async fn get_internal_transactions(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>> {
        let txs = self.fetch_history(TxKind::Internal, address).await?;
        Ok(apply_filters(txs, filters))
    }

    async fn get_token_transfers(
        &self,
        address: &str,
        filters: Option<&FilterOptions>,
    ) -> AppResult<Vec<Transaction>> {
        let txs = self.fetch_history(TxKind::Token, address).await?;
        Ok(apply_filters(txs, filters))
    }

    async fn get_first_funder(&self, address: &str) -> AppResult<Option<FundingNode>> {
        let address = normalize_address(address);
        if let Some(cached) = self.funder_cache.get("firstfunder", &address) {
            return Ok(cached);
        }

        let mut funding_tx = self.earliest_incoming(TxKind::Normal, &address).await?;
        if funding_tx.is_none() {
            funding_tx = self.earliest_incoming(TxKind::Internal, &address).await?;
        }

        let node = funding_tx.map(|tx| self.funder_node(tx));
        if let Some(funder) = &node {
            debug!(
                "🌱 First funder of {}... is {}...",
                short_address(&address),
                short_address(&funder.address)
            );
        }

        self.funder_cache.set("firstfunder", &address, node.clone());
        Ok(node)
    }
}

// ============================================
// PARSING & NORMALIZATION
// ============================================

/// Query parameters for an account list request
fn account_query(
    kind: TxKind,
    address: &str,
    sort: SortOrder,
    offset: u32,
) -> Vec<(&'static str, String)> {
    vec![
        ("module", "account".to_string()),
        ("action", kind.action().to_string()),
        ("address", address.to_string()),
        ("startblock", "0".to_string()),
        ("endblock", EXPLORER_END_BLOCK.to_string()),
        ("page", "1".to_string()),
        ("offset", offset.to_string()),
        ("sort", sort.as_str().to_string()),
    ]
}

/// A full page means the explorer may hold older records
fn page_is_full(count: usize) -> bool {
    count >= EXPLORER_PAGE_SIZE as usize
}

fn is_rate_limit_message(text: &str) -> bool {
    text.to_lowercase().contains("rate limit")
}

/// Unwrap the explorer envelope into its `result`
fn parse_envelope(body: &str) -> AppResult<serde_json::Value> {
    let envelope: ExplorerResponse = serde_json::from_str(body)?;

    if let Some(error) = envelope.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        if is_rate_limit_message(&message) {
            return Err(AppError::rate_limited());
        }
        return Err(AppError::provider_api(message));
    }

    if envelope.status.as_deref() != Some("0") {
        return Ok(envelope.result);
    }

    // status "0": either an empty history or a real error
    if envelope.result.is_array() {
        return Ok(envelope.result);
    }

    let message = envelope.message.unwrap_or_default();
    let detail = envelope.result.as_str().unwrap_or_default();
    if is_rate_limit_message(&message) || is_rate_limit_message(detail) {
        return Err(AppError::rate_limited());
    }
    if message.starts_with("No transactions found") {
        return Ok(serde_json::Value::Array(Vec::new()));
    }

    Err(AppError::provider_api(format!("{}: {}", message, detail)))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(normalize_address(value))
    }
}

/// Explorer record → `Transaction`, relative to `owner`
fn normalize_transaction(raw: &RawTransaction, owner: &str, kind: TxKind) -> Transaction {
    let from = normalize_address(&raw.from);
    let to = non_empty(&raw.to);
    let is_incoming = to.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(owner));

    let status = if raw.is_error == "1" || raw.txreceipt_status == "0" {
        TxStatus::Failed
    } else {
        TxStatus::Success
    };

    let gas_cost = parse_wei(&raw.gas_used).saturating_mul(parse_wei(&raw.gas_price));

    let method_id = if !raw.method_id.is_empty() && raw.method_id != "0x" {
        Some(raw.method_id.clone())
    } else {
        raw.input.get(..10).map(str::to_string)
    };

    let (value, category, token_transfers) = match kind {
        TxKind::Token => {
            let decimals = raw.token_decimal.parse::<u8>().unwrap_or(0);
            let transfer = TokenTransfer {
                token_address: normalize_address(&raw.contract_address),
                token_name: raw.token_name.clone(),
                token_symbol: raw.token_symbol.clone(),
                token_decimals: decimals,
                from: from.clone(),
                to: to.clone().unwrap_or_default(),
                value: raw.value.clone(),
                value_formatted: format_token_amount(&raw.value, decimals),
            };
            (U256::ZERO, TxCategory::TokenTransfer, vec![transfer])
        }
        TxKind::Normal | TxKind::Internal => {
            let category = if to.is_none() {
                TxCategory::ContractCreation
            } else if kind == TxKind::Normal && raw.input.len() > 2 {
                TxCategory::ContractCall
            } else {
                TxCategory::Transfer
            };
            (parse_wei(&raw.value), category, Vec::new())
        }
    };

    Transaction {
        hash: raw.hash.to_lowercase(),
        block_number: raw.block_number.parse().unwrap_or(0),
        timestamp: raw.time_stamp.parse().unwrap_or(0),
        from,
        to,
        value: value.to_string(),
        value_in_eth: wei_to_eth(value),
        gas_cost_in_eth: wei_to_eth(gas_cost),
        status,
        category,
        method_id,
        is_incoming,
        token_transfers,
    }
}

fn first_incoming(txs: &[Transaction]) -> Option<&Transaction> {
    txs.iter()
        .filter(|tx| tx.is_incoming && tx.is_success() && tx.value_in_eth > 0.0)
        .min_by_key(|tx| tx.timestamp)
}

fn apply_filters(txs: Vec<Transaction>, filters: Option<&FilterOptions>) -> Vec<Transaction> {
    match filters {
        Some(f) => f.apply(txs),
        None => txs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0x1111111111111111111111111111111111111111";

    fn raw(from: &str, to: &str, value: &str) -> RawTransaction {
        RawTransaction {
            hash: "0xABC".to_string(),
            block_number: "100".to_string(),
            time_stamp: "1700000000".to_string(),
            from: from.to_string(),
            to: to.to_string(),
            value: value.to_string(),
            gas_used: "21000".to_string(),
            gas_price: "1000000000".to_string(),
            is_error: "0".to_string(),
            txreceipt_status: "1".to_string(),
            input: "0x".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_envelope_ok() {
        let body = r#"{"status":"1","message":"OK","result":[{"hash":"0x1"}]}"#;
        let result = parse_envelope(body).unwrap();
        assert_eq!(result.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_envelope_no_transactions() {
        let body = r#"{"status":"0","message":"No transactions found","result":[]}"#;
        assert_eq!(parse_envelope(body).unwrap(), serde_json::json!([]));
    }

    #[test]
    fn test_envelope_rate_limit() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#;
        let err = parse_envelope(body).unwrap_err();
        assert!(err.is_rate_limited());
        assert!(err.code.is_retryable());
    }

    #[test]
    fn test_envelope_api_error() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        let err = parse_envelope(body).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProviderApiError);
        assert!(!err.code.is_retryable());
    }

    #[test]
    fn test_envelope_proxy_result() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":"0x1a"}"#;
        assert_eq!(parse_envelope(body).unwrap(), serde_json::json!("0x1a"));
    }

    #[test]
    fn test_envelope_invalid_json() {
        let err = parse_envelope("<html>502</html>").unwrap_err();
        assert_eq!(err.code, ErrorCode::ProviderInvalidResponse);
    }

    #[test]
    fn test_normalize_incoming_transfer() {
        let record = raw(
            "0xAAAA000000000000000000000000000000000000",
            "0x1111111111111111111111111111111111111111",
            "1500000000000000000",
        );
        let tx = normalize_transaction(&record, OWNER, TxKind::Normal);

        assert_eq!(tx.hash, "0xabc");
        assert_eq!(tx.from, "0xaaaa000000000000000000000000000000000000");
        assert!(tx.is_incoming);
        assert_eq!(tx.category, TxCategory::Transfer);
        assert_eq!(tx.status, TxStatus::Success);
        assert!((tx.value_in_eth - 1.5).abs() < 1e-9);
        assert!((tx.gas_cost_in_eth - 0.000021).abs() < 1e-12);
        assert_eq!(tx.block_number, 100);
        assert!(tx.method_id.is_none());
    }

    #[test]
    fn test_normalize_contract_call_and_failure() {
        let mut record = raw(OWNER, "0x7a250d5630b4cf539739df2c5dacb4c659f2488d", "0");
        record.input = "0x7ff36ab5000000000000".to_string();
        record.is_error = "1".to_string();
        let tx = normalize_transaction(&record, OWNER, TxKind::Normal);

        assert!(!tx.is_incoming);
        assert_eq!(tx.category, TxCategory::ContractCall);
        assert_eq!(tx.status, TxStatus::Failed);
        assert_eq!(tx.method_id.as_deref(), Some("0x7ff36ab5"));
    }

    #[test]
    fn test_normalize_contract_creation() {
        let record = raw(OWNER, "", "0");
        let tx = normalize_transaction(&record, OWNER, TxKind::Normal);
        assert!(tx.to.is_none());
        assert_eq!(tx.category, TxCategory::ContractCreation);
    }

    #[test]
    fn test_normalize_token_transfer() {
        let mut record = raw("0xbbbb000000000000000000000000000000000000", OWNER, "2500000");
        record.contract_address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string();
        record.token_symbol = "USDC".to_string();
        record.token_decimal = "6".to_string();
        let tx = normalize_transaction(&record, OWNER, TxKind::Token);

        assert_eq!(tx.category, TxCategory::TokenTransfer);
        assert_eq!(tx.value_in_eth, 0.0);
        assert_eq!(tx.token_transfers.len(), 1);
        let transfer = &tx.token_transfers[0];
        assert_eq!(transfer.token_address, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        assert!((transfer.value_formatted - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_first_incoming_skips_failed_and_zero() {
        let mut failed = normalize_transaction(
            &raw("0xaaaa000000000000000000000000000000000000", OWNER, "5"),
            OWNER,
            TxKind::Normal,
        );
        failed.status = TxStatus::Failed;
        failed.timestamp = 1;
        let zero = normalize_transaction(
            &raw("0xbbbb000000000000000000000000000000000000", OWNER, "0"),
            OWNER,
            TxKind::Normal,
        );
        let mut funded = normalize_transaction(
            &raw("0xcccc000000000000000000000000000000000000", OWNER, "7"),
            OWNER,
            TxKind::Normal,
        );
        funded.timestamp = 5;

        let txs = vec![failed, zero, funded];
        let first = first_incoming(&txs).unwrap();
        assert_eq!(first.from, "0xcccc000000000000000000000000000000000000");
    }

    #[test]
    fn test_provider_builds_without_network() {
        let config = ExplorerConfig::for_chain(ChainId::Base, "test-key").unwrap();
        let provider = ExplorerProvider::new(config).unwrap();
        assert_eq!(provider.chain(), ChainId::Base);
        assert_eq!(provider.config().api_url, "https://api.basescan.org/api");
        assert_eq!(provider.cache_stats().entries, 0);
    }

    #[test]
    fn test_provider_with_mirror_url() {
        let config = ExplorerConfig::for_chain(ChainId::Ethereum, "test-key")
            .unwrap()
            .with_api_url("http://127.0.0.1:8545/api");
        let provider = ExplorerProvider::new(config).unwrap();
        assert_eq!(provider.config().api_url, "http://127.0.0.1:8545/api");
    }

    #[test]
    fn test_account_query_params() {
        let params = account_query(TxKind::Internal, OWNER, SortOrder::Asc, 25);
        let get = |name: &str| {
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str())
        };

        assert_eq!(get("module"), Some("account"));
        assert_eq!(get("action"), Some("txlistinternal"));
        assert_eq!(get("address"), Some(OWNER));
        assert_eq!(get("startblock"), Some("0"));
        assert_eq!(get("endblock"), Some("latest"));
        assert_eq!(get("offset"), Some("25"));
        assert_eq!(get("sort"), Some("asc"));
    }

    #[test]
    fn test_page_is_full() {
        assert!(!page_is_full(0));
        assert!(!page_is_full(EXPLORER_PAGE_SIZE as usize - 1));
        assert!(page_is_full(EXPLORER_PAGE_SIZE as usize));
    }
}
