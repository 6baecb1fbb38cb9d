//! Ruster Trace Library
//!
//! Wallet forensics engine for EVM chains:
//! - Bounded funding graphs (who funded a wallet, who it funded)
//! - Suspicious-activity detection and risk scoring
//! - Multi-wallet correlation for Sybil detection

pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    calculate_correlation, FundingTreeBuilder, SuspiciousDetector, WalletAnalyzer,
};
pub use models::{
    AnalysisResult, AnalyzeOptions, ApiKeyConfig, AppError, AppResult, ChainId, CompareOptions,
    ErrorCode, FundingNode, FundingTreeConfig, MultiWalletResult, Progress, ProgressCallback,
    Severity, SuspiciousIndicator, Transaction, TreeDirection,
};
pub use providers::{ExplorerProvider, MemoryProvider, ProviderRegistry, TransactionProvider};
