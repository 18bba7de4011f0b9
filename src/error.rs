//! Structured error kinds for the ladder engine core.
//!
//! Every variant here corresponds to one of the error kinds enumerated by
//! surface of origin: input validation, planning/math, pool/chain state,
//! balances/approvals, execution, and crypto. Callers at the orchestrator
//! boundary match on these; internal recoverable cases (ABI-decode
//! mismatches, missing token metadata, gas-estimation reverts, missing v2
//! quotes) are handled locally and never reach this type.

use alloy::primitives::{Address, B256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("price must be positive, got {0}")]
    InvalidPrice(f64),
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("token pair is degenerate: both sides resolve to {0}")]
    DegeneratePair(Address),
    #[error("unknown fee tier {fee}; valid tiers are 100/500/2500/3000/10000 unless allow_custom_fee is set")]
    UnknownFeeTier { fee: u32 },
    #[error("at least one of amount0/amount1 must be supplied")]
    NeedAtLeastOneAmount,
    #[error("decimals unavailable for token {0}")]
    DecimalsUnavailable(Address),
}

#[derive(Debug, Error)]
pub enum MathError {
    #[error("bad range: sqrt_upper ({sqrt_hi}) must be > sqrt_lower ({sqrt_lo})")]
    BadRange { sqrt_lo: String, sqrt_hi: String },
    #[error("arithmetic overflow computing {0}")]
    MathOverflow(&'static str),
    #[error("missing side: {0} required but not supplied")]
    MissingSide(&'static str),
    #[error("ticks not aligned: expected spacing {expected_spacing}, lower remainder {lo_rem}, upper remainder {hi_rem}")]
    TicksNotAligned {
        expected_spacing: i32,
        lo_rem: i32,
        hi_rem: i32,
    },
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool for key not deployed")]
    PoolNotDeployed,
    #[error("pool deployed at {0} but not initialized")]
    PoolNotInitialized(Address),
    #[error("price impact too high: actual {actual:.4}% > limit {limit:.4}%")]
    PriceImpactTooHigh { actual: f64, limit: f64 },
    #[error("fee mismatch: config says {config_fee}, pool reports {pool_fee}")]
    FeeMismatch { config_fee: u32, pool_fee: u32 },
}

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("insufficient balance of {token}: need {need}, have {have}")]
    InsufficientBalance {
        token: Address,
        need: String,
        have: String,
    },
    #[error("approval failed: {0}")]
    ApproveFailed(String),
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("simulation reverted: {0}")]
    SimulationReverted(String),
    #[error("transaction {tx_hash} reverted: {reason:?}")]
    TransactionReverted {
        tx_hash: B256,
        reason: Option<String>,
    },
    #[error("transaction {tx_hash} timed out waiting for receipt (deadline {deadline_secs}s)")]
    Timeout { tx_hash: B256, deadline_secs: u64 },
    #[error("rpc error: {0}")]
    Rpc(String),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("cryptography backend unavailable: {0}")]
    CryptoUnavailable(&'static str),
}

/// Top-level error type returned at the orchestrator/CLI boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub type CoreResult<T> = Result<T, CoreError>;
