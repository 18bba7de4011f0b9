//! Pool identity, ABI bindings, and state reading (spec.md §4.E).
//!
//! `contracts` holds the `sol!` ABI bindings for every pool-variant surface
//! this engine talks to; `discovery` is the read-only `PoolReader` that
//! resolves pool identity and decodes state from them; `decimals_cache`
//! backs the per-token decimals memo the reader and orientation resolver
//! both rely on.

pub mod contracts;
pub mod decimals_cache;
pub mod discovery;

pub use decimals_cache::DecimalsCache;
pub use discovery::{PoolReader, Slot0Layout};
