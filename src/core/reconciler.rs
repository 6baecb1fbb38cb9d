//! Transaction Reconciler
//!
//! Ordinary and internal records can describe the same ledger event under
//! one hash. The ordinary record is authoritative.

use std::collections::HashMap;

use crate::models::types::Transaction;

/// Merge ordinary and internal records into one deduplicated list,
/// newest first.
///
/// - Hashes compare case-insensitively
/// - A repeated ordinary hash replaces the earlier record in place
/// - Internal records are only kept for hashes not seen yet
/// - Equal timestamps keep insertion order
pub fn merge_transactions(ordinary: Vec<Transaction>, internal: Vec<Transaction>) -> Vec<Transaction> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(ordinary.len() + internal.len());
    let mut merged: Vec<Transaction> = Vec::with_capacity(ordinary.len() + internal.len());

    for tx in ordinary {
        let key = tx.hash.to_lowercase();
        match index.get(&key) {
            Some(&slot) => merged[slot] = tx,
            None => {
                index.insert(key, merged.len());
                merged.push(tx);
            }
        }
    }

    for tx in internal {
        let key = tx.hash.to_lowercase();
        if index.contains_key(&key) {
            continue;
        }
        index.insert(key, merged.len());
        merged.push(tx);
    }

    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}
