//! v4-family action encoder (spec.md §4.F).
//!
//! v4 liquidity changes do not go through per-action contract calls the way
//! v3's `NonfungiblePositionManager` does; instead, a single
//! `modifyLiquidities(bytes unlockData, uint256 deadline)` call carries a
//! length-prefixed list of tagged sub-actions, each with its own ABI-encoded
//! parameter tuple. `unlockData` itself is `abi.encode(bytes actions, bytes[]
//! params)` — the periphery router decodes `actions` as one byte per
//! sub-action and `params[i]` via `abi.decode(params[i], (...))` matching
//! that action's field list.
//!
//! Opcode values are grounded on
//! `examples/shuhuiluo-uniswap-v4-sdk-rs/src/utils/v4_planner.rs`'s `Actions`
//! enum (same numbering); that planner's `create_action` is left
//! unimplemented upstream; the encoding below is this crate's own
//! completion of it, generalized from a swap-path planner into a
//! liquidity-ladder planner per spec.md's required action sequence.

use crate::pool::contracts::IV4PositionManager;
use crate::types::PoolKey;
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Action {
    IncreaseLiquidity = 0x00,
    DecreaseLiquidity = 0x01,
    MintPosition = 0x02,
    BurnPosition = 0x03,
    SettlePair = 0x11,
    TakePair = 0x15,
    CloseCurrency = 0x17,
}

impl Action {
    fn opcode(self) -> u8 {
        self as u8
    }
}

/// Accumulates `(action, params)` pairs in emission order; `finish` produces
/// the `modifyLiquidities` calldata. Mirrors the "planner" shape the
/// upstream SDK sketches (`v4_planner.rs`), completed here.
#[derive(Debug, Default)]
pub struct V4ActionPlanner {
    actions: Vec<u8>,
    params: Vec<Bytes>,
}

fn pool_key_tuple(key: &PoolKey) -> DynSolValue {
    DynSolValue::Tuple(vec![
        DynSolValue::Address(key.currency0),
        DynSolValue::Address(key.currency1),
        DynSolValue::Uint(U256::from(key.fee), 24),
        DynSolValue::Int(alloy::primitives::I256::try_from(key.tick_spacing).unwrap(), 24),
        DynSolValue::Address(key.hooks),
    ])
}

impl V4ActionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, action: Action, fields: Vec<DynSolValue>) -> &mut Self {
        self.actions.push(action.opcode());
        let encoded = DynSolValue::Tuple(fields).abi_encode();
        self.params.push(encoded.into());
        self
    }

    /// `MINT_POSITION(poolKey, tickLower, tickUpper, liquidity, amount0Max,
    /// amount1Max, owner, hookData)`.
    #[allow(clippy::too_many_arguments)]
    pub fn mint_position(
        &mut self,
        key: &PoolKey,
        tick_lower: i32,
        tick_upper: i32,
        liquidity: U256,
        amount0_max: u128,
        amount1_max: u128,
        owner: Address,
    ) -> &mut Self {
        self.push(
            Action::MintPosition,
            vec![
                pool_key_tuple(key),
                DynSolValue::Int(alloy::primitives::I256::try_from(tick_lower).unwrap(), 24),
                DynSolValue::Int(alloy::primitives::I256::try_from(tick_upper).unwrap(), 24),
                DynSolValue::Uint(liquidity, 256),
                DynSolValue::Uint(U256::from(amount0_max), 128),
                DynSolValue::Uint(U256::from(amount1_max), 128),
                DynSolValue::Address(owner),
                DynSolValue::Bytes(Vec::new()),
            ],
        )
    }

    /// `DECREASE_LIQUIDITY(tokenId, liquidity, amount0Min, amount1Min, hookData)`.
    pub fn decrease_liquidity(
        &mut self,
        token_id: U256,
        liquidity: U256,
        amount0_min: u128,
        amount1_min: u128,
    ) -> &mut Self {
        self.push(
            Action::DecreaseLiquidity,
            vec![
                DynSolValue::Uint(token_id, 256),
                DynSolValue::Uint(liquidity, 256),
                DynSolValue::Uint(U256::from(amount0_min), 128),
                DynSolValue::Uint(U256::from(amount1_min), 128),
                DynSolValue::Bytes(Vec::new()),
            ],
        )
    }

    /// `BURN_POSITION(tokenId, amount0Min, amount1Min, hookData)`. Optional;
    /// not used by the default close path (spec.md §9 open question 3).
    pub fn burn_position(&mut self, token_id: U256, amount0_min: u128, amount1_min: u128) -> &mut Self {
        self.push(
            Action::BurnPosition,
            vec![
                DynSolValue::Uint(token_id, 256),
                DynSolValue::Uint(U256::from(amount0_min), 128),
                DynSolValue::Uint(U256::from(amount1_min), 128),
                DynSolValue::Bytes(Vec::new()),
            ],
        )
    }

    /// `SETTLE_PAIR(currency0, currency1)`: pays in what the mint/increase
    /// above owes the pool.
    pub fn settle_pair(&mut self, currency0: Address, currency1: Address) -> &mut Self {
        self.push(
            Action::SettlePair,
            vec![DynSolValue::Address(currency0), DynSolValue::Address(currency1)],
        )
    }

    /// `TAKE_PAIR(currency0, currency1, recipient)`: sweeps residual credits
    /// to `recipient` after a decrease/burn.
    pub fn take_pair(&mut self, currency0: Address, currency1: Address, recipient: Address) -> &mut Self {
        self.push(
            Action::TakePair,
            vec![
                DynSolValue::Address(currency0),
                DynSolValue::Address(currency1),
                DynSolValue::Address(recipient),
            ],
        )
    }

    /// `CLOSE_CURRENCY(currency)`: settles any remaining delta for a single
    /// currency against the pool manager, once per batch per currency.
    pub fn close_currency(&mut self, currency: Address) -> &mut Self {
        self.push(Action::CloseCurrency, vec![DynSolValue::Address(currency)])
    }

    /// Encodes `unlockData = abi.encode(bytes actions, bytes[] params)` and
    /// wraps it in `modifyLiquidities(unlockData, deadline)`.
    pub fn finish(&self, position_manager: Address, deadline: U256) -> (Address, Vec<u8>) {
        let unlock_data = DynSolValue::Tuple(vec![
            DynSolValue::Bytes(self.actions.clone()),
            DynSolValue::Array(self.params.iter().map(|p| DynSolValue::Bytes(p.to_vec())).collect()),
        ])
        .abi_encode();

        let call = IV4PositionManager::modifyLiquiditiesCall {
            unlockData: unlock_data.into(),
            deadline,
        };
        (position_manager, call.abi_encode())
    }

    pub fn action_sequence(&self) -> &[u8] {
        &self.actions
    }
}

/// Standard per-bucket mint sequence (spec.md §4.F): `MINT_POSITION;
/// SETTLE_PAIR` for each sub-position, then once per batch `CLOSE_CURRENCY`
/// per currency and `TAKE_PAIR` for residuals.
#[allow(clippy::too_many_arguments)]
pub fn plan_ladder_mint(
    key: &PoolKey,
    buckets: &[(i32, i32, U256)], // (tick_lower, tick_upper, liquidity)
    amount0_max: u128,
    amount1_max: u128,
    owner: Address,
    recipient: Address,
) -> V4ActionPlanner {
    let mut planner = V4ActionPlanner::new();
    for (tick_lower, tick_upper, liquidity) in buckets {
        planner.mint_position(key, *tick_lower, *tick_upper, *liquidity, amount0_max, amount1_max, owner);
        planner.settle_pair(key.currency0, key.currency1);
    }
    planner.close_currency(key.currency0);
    planner.close_currency(key.currency1);
    planner.take_pair(key.currency0, key.currency1, recipient);
    planner
}

/// Standard close-all sequence (spec.md scenario S7):
/// `[DECREASE_LIQUIDITY x N, TAKE_PAIR x N, CLOSE_CURRENCY x distinct-currencies]`
/// — decreases are emitted first in position order, then one `TAKE_PAIR` per
/// position (order-stable with the decreases), then one `CLOSE_CURRENCY` per
/// distinct currency touched.
pub fn plan_close_all(
    positions: &[(U256, U256, PoolKey)], // (tokenId, liquidity, poolKey)
    recipient: Address,
) -> V4ActionPlanner {
    let mut planner = V4ActionPlanner::new();
    for (token_id, liquidity, _key) in positions {
        planner.decrease_liquidity(*token_id, *liquidity, 0, 0);
    }
    for (_token_id, _liquidity, key) in positions {
        planner.take_pair(key.currency0, key.currency1, recipient);
    }
    let mut seen = std::collections::BTreeSet::new();
    for (_, _, key) in positions {
        seen.insert(key.currency0);
        seen.insert(key.currency1);
    }
    for currency in seen {
        planner.close_currency(currency);
    }
    planner
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn sample_key() -> PoolKey {
        PoolKey::new(
            address!("0000000000000000000000000000000000000001"),
            address!("0000000000000000000000000000000000000002"),
            3000,
            60,
            Address::ZERO,
        )
    }

    #[test]
    fn ladder_mint_action_order() {
        let key = sample_key();
        let buckets = vec![
            (-120, -60, U256::from(100u64)),
            (-60, 0, U256::from(200u64)),
        ];
        let owner = address!("0000000000000000000000000000000000000003");
        let planner = plan_ladder_mint(&key, &buckets, u128::MAX, u128::MAX, owner, owner);
        assert_eq!(
            planner.action_sequence(),
            &[
                Action::MintPosition as u8,
                Action::SettlePair as u8,
                Action::MintPosition as u8,
                Action::SettlePair as u8,
                Action::CloseCurrency as u8,
                Action::CloseCurrency as u8,
                Action::TakePair as u8,
            ]
        );
    }

    #[test]
    fn close_all_matches_scenario_s7_sequence() {
        let key = sample_key();
        let positions = vec![
            (U256::from(1u64), U256::from(10u64), key),
            (U256::from(2u64), U256::from(20u64), key),
            (U256::from(3u64), U256::from(30u64), key),
        ];
        let recipient = address!("0000000000000000000000000000000000000009");
        let planner = plan_close_all(&positions, recipient);
        assert_eq!(
            planner.action_sequence(),
            &[
                Action::DecreaseLiquidity as u8,
                Action::DecreaseLiquidity as u8,
                Action::DecreaseLiquidity as u8,
                Action::TakePair as u8,
                Action::TakePair as u8,
                Action::TakePair as u8,
                Action::CloseCurrency as u8,
                Action::CloseCurrency as u8,
            ]
        );
    }

    #[test]
    fn finish_produces_modify_liquidities_selector() {
        let mut planner = V4ActionPlanner::new();
        planner.close_currency(address!("0000000000000000000000000000000000000001"));
        let (_target, calldata) = planner.finish(address!("0000000000000000000000000000000000000002"), U256::from(1u64));
        assert_eq!(&calldata[..4], IV4PositionManager::modifyLiquiditiesCall::SELECTOR);
    }
}
