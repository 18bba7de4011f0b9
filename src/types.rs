//! Core data structures shared across the planner, pool reader, and
//! executor: pool identity, planner output, and the tracked on-chain
//! position record.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed sum type replacing the source's stringly-typed protocol field.
/// Selects entry-point addresses, action codecs, and ABI quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVariant {
    V3Uniswap,
    V3Pancake,
    V4Uniswap,
    V4Pancake,
}

impl ProtocolVariant {
    pub fn is_v4(&self) -> bool {
        matches!(self, ProtocolVariant::V4Uniswap | ProtocolVariant::V4Pancake)
    }

    pub fn is_v3(&self) -> bool {
        !self.is_v4()
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProtocolVariant::V3Uniswap => "v3-uniswap",
            ProtocolVariant::V3Pancake => "v3-pancake",
            ProtocolVariant::V4Uniswap => "v4-uniswap",
            ProtocolVariant::V4Pancake => "v4-pancake",
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Weight shape for the distribution planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionType {
    Linear,
    Quadratic,
    Exponential,
    Fibonacci,
}

/// Identity of a pool: `(currency0, currency1, fee, tickSpacing, hooks?)`.
/// `currency0 < currency1` as 160-bit integers is an invariant enforced at
/// construction, not re-checked by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    /// v4 only; zero address for v3-family and for v4 pools with no hook.
    pub hooks: Address,
}

impl PoolKey {
    /// Sorts `(token_a, token_b)` into currency order and builds the key.
    /// `tick_spacing` must already be resolved (table lookup or override).
    pub fn new(token_a: Address, token_b: Address, fee: u32, tick_spacing: i32, hooks: Address) -> Self {
        let (currency0, currency1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Self {
            currency0,
            currency1,
            fee,
            tick_spacing,
            hooks,
        }
    }
}

/// `{sqrtPriceX96, tick, liquidity, initialized}` at a given block.
/// `initialized` holds iff `sqrt_price_x96 > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub sqrt_price_x96: alloy::primitives::U256,
    pub tick: i32,
    pub liquidity: u128,
    pub initialized: bool,
}

/// Per-token metadata read from the token contract itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// One sub-interval of the requested range, as emitted by the distribution
/// planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPosition {
    pub index: usize,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub price_lower_display: f64,
    pub price_upper_display: f64,
    pub usd_amount: f64,
    pub percentage: f64,
    pub liquidity_estimate: String,
}

/// Input at the orchestrator boundary. Field set and effects are exhaustive
/// per the external-interfaces contract; see `src/config.rs` for how a TOML
/// file or CLI flags populate this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    pub token0_address: Address,
    pub token1_address: Address,
    pub token0_decimals: Option<u8>,
    pub token1_decimals: Option<u8>,
    /// USD price of the volatile token: "how many USD per 1 volatile".
    pub current_price: f64,
    pub lower_price: Option<f64>,
    pub percent_from: Option<f64>,
    pub percent_to: Option<f64>,
    pub total_usd: f64,
    pub n_positions: u32,
    pub fee_tier: u32,
    pub tick_spacing_override: Option<i32>,
    pub distribution_type: DistributionType,
    pub slippage_percent: f64,
    pub hooks: Option<Address>,
    pub protocol_variant: ProtocolVariant,
    pub allow_custom_fee: bool,
    /// Which of the two input tokens is the stablecoin side.
    pub stable_token: StableSide,
    /// Skip deployment if the pool does not exist yet.
    pub auto_create_pool: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StableSide {
    Token0,
    Token1,
}

/// A tracked on-chain position: NFT (v3-family) or ERC-6909-like credit
/// (v4). Persisted opaquely by an external collaborator; the orchestrator
/// owns the in-memory copy for the duration of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub token_id: Option<u64>,
    pub pool_key: PoolKey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: String,
    pub owed0: String,
    pub owed1: String,
    pub last_seen_block: u64,
    pub protocol_tag: ProtocolVariant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn pool_key_sorts_by_address() {
        let low = address!("0000000000000000000000000000000000000001");
        let high = address!("0000000000000000000000000000000000000002");
        let key_a = PoolKey::new(high, low, 3000, 60, Address::ZERO);
        let key_b = PoolKey::new(low, high, 3000, 60, Address::ZERO);
        assert_eq!(key_a, key_b);
        assert_eq!(key_a.currency0, low);
        assert_eq!(key_a.currency1, high);
    }
}
