//! `address -> decimals` cache (spec.md §4.K `DecimalsCache`).
//!
//! Populated on first on-chain read, never invalidated within a session —
//! decimals are an immutable property of a deployed ERC-20, so there is
//! nothing to expire. Backed by `DashMap` for the same reason `pool::discovery`
//! elsewhere in this crate uses it: many read-only tasks may query
//! concurrently, at most one writes a given key.

use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct DecimalsCache {
    inner: Arc<DashMap<Address, u8>>,
}

impl DecimalsCache {
    pub fn new() -> Self {
        Self { inner: Arc::new(DashMap::new()) }
    }

    pub fn get(&self, token: Address) -> Option<u8> {
        self.inner.get(&token).map(|v| *v)
    }

    /// Records `decimals` for `token`. Idempotent: a second insert for the
    /// same token with the same value is a no-op; a second insert with a
    /// *different* value would indicate a chain-level inconsistency, which
    /// this cache does not itself detect (the caller reads from one chain).
    pub fn insert(&self, token: Address, decimals: u8) {
        self.inner.insert(token, decimals);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn caches_after_first_insert() {
        let cache = DecimalsCache::new();
        let token = address!("0000000000000000000000000000000000000001");
        assert_eq!(cache.get(token), None);
        cache.insert(token, 6);
        assert_eq!(cache.get(token), Some(6));
    }

    #[test]
    fn clone_shares_storage() {
        let cache = DecimalsCache::new();
        let clone = cache.clone();
        let token = address!("0000000000000000000000000000000000000002");
        cache.insert(token, 18);
        assert_eq!(clone.get(token), Some(18));
    }
}
