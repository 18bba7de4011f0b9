//! Per-EOA nonce manager (spec.md §4.G, §4.K, §5).
//!
//! Process-local; serializes concurrent submissions from the same EOA so at
//! most one transaction per EOA is ever in flight. States per nonce:
//! `vacant -> reserved -> submitted -> consumed|released`. `reserved ->
//! released` only if submission itself failed (network error before the
//! node accepted the tx); `reserved -> consumed` once the tx is mined, with
//! any status (success or revert both consume the slot — a reverted batch
//! still burns its nonce, spec.md §7).

use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One EOA's nonce counter plus the write-mutex that enforces
/// single-logical-writer discipline (spec.md §5: at most one transaction
/// submission in flight per EOA).
struct EoaSlot {
    next_nonce: AtomicU64,
    write_lock: Arc<Mutex<()>>,
}

/// `DashMap<Address, EoaSlot>` keyed table; one instance per EOA/chain pair
/// is the natural unit (spec.md §9 design note — no process-wide singleton
/// required).
#[derive(Clone, Default)]
pub struct NonceManager {
    slots: Arc<DashMap<Address, Arc<EoaSlot>>>,
}

/// Held for the duration of one `execute()`. Dropping without calling
/// [`ReservedNonce::consume`] or [`ReservedNonce::release`] releases the
/// nonce back to the pool (e.g. on panic unwind), matching the "cancellation
/// of a queued operation releases its reserved nonce" rule in spec.md §5.
pub struct ReservedNonce {
    nonce: u64,
    slot: Arc<EoaSlot>,
    _guard: OwnedMutexGuard<()>,
    resolved: bool,
}

impl ReservedNonce {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Submission succeeded (even if the tx later reverts on-chain): the
    /// slot stays consumed, the counter has already moved on.
    pub fn consume(mut self) {
        self.resolved = true;
    }

    /// Submission itself failed (network/RPC error, never reached the
    /// mempool): roll the counter back so the next reservation reuses this
    /// nonce.
    pub fn release(mut self) {
        self.slot.next_nonce.fetch_sub(1, Ordering::SeqCst);
        self.resolved = true;
    }
}

impl Drop for ReservedNonce {
    fn drop(&mut self) {
        if !self.resolved {
            self.slot.next_nonce.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_for(&self, eoa: Address) -> Arc<EoaSlot> {
        self.slots
            .entry(eoa)
            .or_insert_with(|| Arc::new(EoaSlot { next_nonce: AtomicU64::new(0), write_lock: Arc::new(Mutex::new(())) }))
            .clone()
    }

    /// Seeds the counter for an EOA from `eth_getTransactionCount(addr,
    /// 'pending')`. Only meaningful before the first reservation for that
    /// EOA in this process; later calls are no-ops if a reservation has
    /// already advanced the counter past `pending_count`.
    pub fn sync_from_chain(&self, eoa: Address, pending_count: u64) {
        let slot = self.slot_for(eoa);
        let current = slot.next_nonce.load(Ordering::SeqCst);
        if current < pending_count {
            slot.next_nonce.store(pending_count, Ordering::SeqCst);
        }
    }

    /// Acquires the write-lock for `eoa` (blocking out any other submission
    /// for the same address) and reserves the next nonce. The returned
    /// guard must be resolved via `consume()` or `release()`.
    pub async fn reserve(&self, eoa: Address) -> ReservedNonce {
        let slot = self.slot_for(eoa);
        let guard = slot.write_lock.clone().lock_owned().await;
        let nonce = slot.next_nonce.fetch_add(1, Ordering::SeqCst);
        ReservedNonce { nonce, slot, _guard: guard, resolved: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[tokio::test]
    async fn nonces_increase_contiguously_on_consume() {
        let mgr = NonceManager::new();
        let eoa = address!("0000000000000000000000000000000000000001");
        let r0 = mgr.reserve(eoa).await;
        assert_eq!(r0.nonce(), 0);
        r0.consume();
        let r1 = mgr.reserve(eoa).await;
        assert_eq!(r1.nonce(), 1);
        r1.consume();
    }

    #[tokio::test]
    async fn release_rolls_back_for_reuse() {
        let mgr = NonceManager::new();
        let eoa = address!("0000000000000000000000000000000000000002");
        let r0 = mgr.reserve(eoa).await;
        assert_eq!(r0.nonce(), 0);
        r0.release();
        let r1 = mgr.reserve(eoa).await;
        assert_eq!(r1.nonce(), 0, "released nonce should be reused");
        r1.consume();
    }

    #[tokio::test]
    async fn distinct_eoas_are_independent() {
        let mgr = NonceManager::new();
        let a = address!("0000000000000000000000000000000000000003");
        let b = address!("0000000000000000000000000000000000000004");
        let ra = mgr.reserve(a).await;
        let rb = mgr.reserve(b).await;
        assert_eq!(ra.nonce(), 0);
        assert_eq!(rb.nonce(), 0);
        ra.consume();
        rb.consume();
    }

    #[tokio::test]
    async fn sync_from_chain_only_raises_counter() {
        let mgr = NonceManager::new();
        let eoa = address!("0000000000000000000000000000000000000005");
        mgr.sync_from_chain(eoa, 5);
        let r = mgr.reserve(eoa).await;
        assert_eq!(r.nonce(), 5);
        r.consume();
        mgr.sync_from_chain(eoa, 0); // stale/lower value must not roll back
        let r2 = mgr.reserve(eoa).await;
        assert_eq!(r2.nonce(), 6);
        r2.consume();
    }
}
