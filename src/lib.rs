//! Concentrated-liquidity ladder engine.
//!
//! Off-chain construction, submission, and management of concentrated-
//! liquidity positions on Uniswap-v3/v4-family AMMs: tick/price/liquidity
//! math, ladder distribution planning, pool-orientation resolution,
//! transaction batching, and a post-close swap planner. See `SPEC_FULL.md`
//! for the full module map; each `pub mod` below corresponds to one
//! component of that map.

pub mod chain_registry;
pub mod config;
pub mod contracts;
pub mod encode;
pub mod error;
pub mod executor;
pub mod math;
pub mod orchestrator;
pub mod planner;
pub mod pool;
pub mod rpc;
pub mod swap;
pub mod types;
pub mod vault;

pub use error::{CoreError, CoreResult};
pub use orchestrator::LadderOrchestrator;
pub use types::{DistributionType, LadderConfig, OpenPosition, PoolKey, PoolState, ProtocolVariant, StableSide};
