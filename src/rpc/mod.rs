//! Cross-cutting RPC plumbing: batched read aggregation and the
//! proxy-aware transport wrapper (spec.md §4.K, §2 row K).

pub mod batch_rpc;
pub mod transport;

pub use batch_rpc::{batch_read, BatchedCall};
pub use transport::connect_provider;
