//! Ruster Trace - wallet forensics from the command line
//!
//! Usage:
//!   ruster_trace analyze <address> [chain] [depth]
//!   ruster_trace compare <chain> <address> <address>...
//!   ruster_trace ancestors <address> <address> [chain] [depth]
//!
//! Environment:
//!   ETHERSCAN_API_KEY, LINEASCAN_API_KEY, ARBISCAN_API_KEY,
//!   BASESCAN_API_KEY, OPTIMISM_API_KEY - explorer credentials
//!   RUST_LOG - Log level (default: info)

use eyre::{eyre, Result};
use ruster_trace::utils::constants::{APP_NAME, APP_VERSION, DEFAULT_ANCESTOR_DEPTH};
use ruster_trace::{
    AnalyzeOptions, ApiKeyConfig, ChainId, CompareOptions, FundingTreeConfig, WalletAnalyzer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  ruster_trace analyze <address> [chain] [depth]
  ruster_trace compare <chain> <address> <address>...
  ruster_trace ancestors <address> <address> [chain] [depth]";

/// Depth used by the CLI when none is given
const CLI_DEFAULT_DEPTH: u32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    info!("🚀 {} v{}", APP_NAME, APP_VERSION);

    let keys = ApiKeyConfig::from_env();
    let analyzer = WalletAnalyzer::from_api_keys(&keys)?;
    if analyzer.registry().is_empty() {
        eprintln!("⚠️  No explorer API key found. Set ETHERSCAN_API_KEY (or a chain-specific key).");
    }

    let output = match command.as_str() {
        "analyze" => {
            let address = args.get(1).ok_or_else(|| eyre!(USAGE))?;
            let chain = parse_chain(args.get(2))?;
            let depth = parse_depth(args.get(3), CLI_DEFAULT_DEPTH)?;

            let options = AnalyzeOptions {
                tree_config: Some(FundingTreeConfig::with_depth(depth)),
                filters: None,
            };
            let result = analyzer.analyze(address, chain, options).await?;
            eprintln!("{}", result.report());
            serde_json::to_string_pretty(&result)?
        }
        "compare" => {
            let chain = parse_chain(args.get(1))?;
            let addresses = args.get(2..).unwrap_or_default();

            let options = CompareOptions {
                tree_config: Some(FundingTreeConfig::with_depth(CLI_DEFAULT_DEPTH)),
            };
            let result = analyzer.compare_wallets(addresses, chain, options).await?;
            eprintln!(
                "🕸️ Correlation: {}/100 | Sybil likely: {}",
                result.correlation_score, result.is_sybil_likely
            );
            serde_json::to_string_pretty(&result)?
        }
        "ancestors" => {
            let (a, b) = match (args.get(1), args.get(2)) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(eyre!(USAGE)),
            };
            let chain = parse_chain(args.get(3))?;
            let depth = parse_depth(args.get(4), DEFAULT_ANCESTOR_DEPTH)?;

            let ancestors = analyzer
                .find_common_ancestors(a, b, chain, Some(depth))
                .await?;
            serde_json::to_string_pretty(&ancestors)?
        }
        other => return Err(eyre!("unknown command '{}'\n{}", other, USAGE)),
    };

    println!("{}", output);
    Ok(())
}

fn parse_chain(arg: Option<&String>) -> Result<ChainId> {
    match arg {
        Some(name) => Ok(name.parse::<ChainId>()?),
        None => Ok(ChainId::Ethereum),
    }
}

fn parse_depth(arg: Option<&String>, default: u32) -> Result<u32> {
    match arg {
        Some(depth) => depth
            .parse()
            .map_err(|_| eyre!("depth must be a number, got '{}'", depth)),
        None => Ok(default),
    }
}
