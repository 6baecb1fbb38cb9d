//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, static lookup tables and the response cache.

pub mod cache;
pub mod constants;
pub mod known_addresses;

pub use cache::*;
pub use constants::*;
pub use known_addresses::*;
