//! Providers Module - External Data Sources
//!
//! The provider contract the core depends on, the per-chain registry, the
//! Etherscan-compatible explorer adapter and an in-memory ledger.

pub mod explorer;
pub mod memory;
pub mod provider;

pub use explorer::*;
pub use memory::*;
pub use provider::*;
