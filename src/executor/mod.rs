//! Batch executor, nonce manager, gas estimator, and receipt/event parsing
//! (spec.md §4.G, §4.K).

pub mod batch;
pub mod gas;
pub mod nonce;
pub mod receipts;

pub use batch::{BatchExecutor, CallResult};
pub use gas::{GasEstimator, GasOperation};
pub use nonce::NonceManager;

/// `now + buffer_secs`, as the `uint256 deadline` every mint/decrease/swap
/// call carries. Using wall-clock time (rather than a fixed far-future
/// constant) means a call that sits in the mempool past `buffer_secs`
/// reverts cleanly on `deadline` instead of executing against stale
/// intent.
pub fn tx_deadline(buffer_secs: i64) -> alloy::primitives::U256 {
    let now = chrono::Utc::now().timestamp();
    alloy::primitives::U256::from((now + buffer_secs).max(0) as u64)
}
