//! Core Module - Forensics Engine
//!
//! Funding graphs, transaction reconciliation, suspicious-activity
//! detection, per-wallet orchestration and cross-wallet correlation.

pub mod analyzer;
pub mod correlation;
pub mod detector;
pub mod funding_tree;
pub mod reconciler;

pub use analyzer::*;
pub use correlation::*;
pub use detector::*;
pub use funding_tree::*;
pub use reconciler::*;
