//! Pool discovery and state reading (spec.md §4.E).
//!
//! Two protocol families:
//! - v3-family: a factory maps `(token0, token1, fee) -> pool address`; pool
//!   state comes from that pool's own `slot0`.
//! - v4-family: the pool key itself hashes to a `poolId`; there is no
//!   factory call, and state is read through a `StateView` lens contract
//!   (or, if a fork doesn't deploy one, `extsload` — not attempted here,
//!   `StateView` is required for v4 state reads in this implementation).
//!
//! `slot0`'s ABI is not uniform across v3 forks (spec.md §9 design note,
//! §4.E): some return `feeProtocol` as `uint8` (7-field layout used by
//! Uniswap's own pools and most forks), others widen it to `uint32` (an
//! 8-field layout observed on certain BSC PancakeSwap-family deployments).
//! [`Slot0Layout`] is the tagged union this decodes into, resolved once per
//! pool address and cached — no exception-driven retry per call.

use crate::error::{CoreError, InputError, PoolError};
use crate::pool::contracts::{
    IPoolManager, IStateView, IUniswapV3FactoryExt, IUniswapV3PoolExt, IUniswapV3PoolFeeProtocol32,
};
use crate::pool::decimals_cache::DecimalsCache;
use crate::types::{PoolKey, PoolState, TokenInfo};
use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::{SolCall, SolValue};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which `slot0` return-tuple shape a pool uses. Resolved lazily, once, and
/// cached per pool address — see module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot0Layout {
    /// 7 fields, `feeProtocol: uint8` — Uniswap's own `UniswapV3Pool.sol` and
    /// most forks.
    V7Uint8,
    /// 8 fields, `feeProtocol: uint32` — observed on some BSC forks.
    V8Uint32,
    /// Neither typed ABI decoded; fall back to manual word extraction.
    Raw,
}

/// Reads pool identity and state over an arbitrary `alloy` provider. Stateless
/// apart from the layout cache and the shared decimals cache, both of which
/// are append-only and safe under concurrent read traffic (spec.md §5: reads
/// may run with unbounded concurrency).
pub struct PoolReader<P> {
    provider: P,
    layout_cache: Arc<DashMap<Address, Slot0Layout>>,
    pub decimals: DecimalsCache,
}

impl<P: Provider + Clone> PoolReader<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            layout_cache: Arc::new(DashMap::new()),
            decimals: DecimalsCache::new(),
        }
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, CoreError> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        let out = self
            .provider
            .call(tx)
            .await
            .map_err(|e| crate::error::ExecutionError::Rpc(e.to_string()))?;
        Ok(out.to_vec())
    }

    /// `find_pool` for v3-family: queries the factory's `getPool`. Returns
    /// `None` if the factory has no such pool deployed (`address(0)`).
    pub async fn find_pool_v3(&self, factory: Address, key: &PoolKey) -> Result<Option<Address>, CoreError> {
        let call = IUniswapV3FactoryExt::getPoolCall {
            tokenA: key.currency0,
            tokenB: key.currency1,
            fee: key.fee,
        };
        let raw = self.eth_call(factory, call.abi_encode()).await?;
        let pool = IUniswapV3FactoryExt::getPoolCall::abi_decode_returns(&raw)
            .map_err(|e| crate::error::ExecutionError::Rpc(format!("getPool decode: {e}")))?;
        if pool.pool == Address::ZERO {
            Ok(None)
        } else {
            Ok(Some(pool.pool))
        }
    }

    /// `find_pool` for v4-family: a pure hash of the pool key, no I/O. The
    /// layout here follows `PoolManager.sol`'s `toId()`: `keccak256(abi.encode(key))`.
    pub fn find_pool_v4(key: &PoolKey) -> B256 {
        let encoded = (key.currency0, key.currency1, key.fee, key.tick_spacing, key.hooks).abi_encode();
        keccak256(encoded)
    }

    /// Reads `slot0` + `liquidity` for a v3-family pool, tolerating the ABI
    /// mismatch described in the module docs.
    pub async fn read_pool_state_v3(&self, pool_address: Address) -> Result<PoolState, CoreError> {
        let layout = self.layout_cache.get(&pool_address).map(|v| *v);
        let (sqrt_price_x96, tick, layout_used) = match layout {
            Some(Slot0Layout::V7Uint8) | None => match self.try_decode_v7(pool_address).await {
                Ok(v) => (v.0, v.1, Slot0Layout::V7Uint8),
                Err(_) if layout.is_none() => match self.try_decode_v8(pool_address).await {
                    Ok(v) => (v.0, v.1, Slot0Layout::V8Uint32),
                    Err(_) => {
                        let v = self.raw_slot0(pool_address).await?;
                        (v.0, v.1, Slot0Layout::Raw)
                    }
                },
                Err(e) => return Err(e),
            },
            Some(Slot0Layout::V8Uint32) => self
                .try_decode_v8(pool_address)
                .await
                .map(|(s, t)| (s, t, Slot0Layout::V8Uint32))?,
            Some(Slot0Layout::Raw) => {
                let v = self.raw_slot0(pool_address).await?;
                (v.0, v.1, Slot0Layout::Raw)
            }
        };
        self.layout_cache.insert(pool_address, layout_used);

        let liq_call = IUniswapV3PoolExt::liquidityCall {};
        let raw = self.eth_call(pool_address, liq_call.abi_encode()).await?;
        let liquidity = IUniswapV3PoolExt::liquidityCall::abi_decode_returns(&raw)
            .map(|r| r._0)
            .unwrap_or(0u128);

        Ok(PoolState {
            sqrt_price_x96,
            tick,
            liquidity,
            initialized: sqrt_price_x96 > U256::ZERO,
        })
    }

    async fn try_decode_v7(&self, pool: Address) -> Result<(U256, i32), CoreError> {
        let call = IUniswapV3PoolExt::slot0Call {};
        let raw = self.eth_call(pool, call.abi_encode()).await?;
        let r = IUniswapV3PoolExt::slot0Call::abi_decode_returns(&raw)
            .map_err(|e| crate::error::ExecutionError::Rpc(format!("slot0 v7 decode: {e}")))?;
        Ok((U256::from(r.sqrtPriceX96), r.tick.as_i32()))
    }

    async fn try_decode_v8(&self, pool: Address) -> Result<(U256, i32), CoreError> {
        let call = IUniswapV3PoolFeeProtocol32::slot0Call {};
        let raw = self.eth_call(pool, call.abi_encode()).await?;
        let r = IUniswapV3PoolFeeProtocol32::slot0Call::abi_decode_returns(&raw)
            .map_err(|e| crate::error::ExecutionError::Rpc(format!("slot0 v8 decode: {e}")))?;
        Ok((U256::from(r.sqrtPriceX96), r.tick.as_i32()))
    }

    /// Last-resort fallback: raw `eth_call` and manual extraction. Per
    /// spec.md §4.E: `sqrtPriceX96` as `uint160` in the first returned word,
    /// signed 24-bit `tick` in the low 3 bytes of the second word.
    async fn raw_slot0(&self, pool: Address) -> Result<(U256, i32), CoreError> {
        warn!(%pool, "slot0: both typed ABI layouts failed to decode, falling back to raw extraction");
        let selector = &alloy::primitives::keccak256(b"slot0()")[..4];
        let raw = self.eth_call(pool, selector.to_vec()).await?;
        if raw.len() < 64 {
            return Err(PoolError::PoolNotInitialized(pool).into());
        }
        let sqrt_price_x96 = U256::from_be_slice(&raw[0..32]);
        let mut tick_bytes = [0u8; 3];
        tick_bytes.copy_from_slice(&raw[32 + 29..32 + 32]);
        let mut sign_extended = [0u8; 4];
        sign_extended[1..].copy_from_slice(&tick_bytes);
        if tick_bytes[0] & 0x80 != 0 {
            sign_extended[0] = 0xff;
        }
        let tick = i32::from_be_bytes(sign_extended);
        Ok((sqrt_price_x96, tick))
    }

    /// Reads v4-family pool state through a `StateView` lens contract.
    pub async fn read_pool_state_v4(&self, state_view: Address, pool_id: B256) -> Result<PoolState, CoreError> {
        let slot0_call = IStateView::getSlot0Call { poolId: pool_id };
        let raw = self.eth_call(state_view, slot0_call.abi_encode()).await?;
        let slot0 = IStateView::getSlot0Call::abi_decode_returns(&raw)
            .map_err(|e| crate::error::ExecutionError::Rpc(format!("v4 getSlot0 decode: {e}")))?;

        let liq_call = IStateView::getLiquidityCall { poolId: pool_id };
        let raw = self.eth_call(state_view, liq_call.abi_encode()).await?;
        let liquidity = IStateView::getLiquidityCall::abi_decode_returns(&raw)
            .map(|r| r.liquidity)
            .unwrap_or(0u128);

        let sqrt_price_x96 = U256::from(slot0.sqrtPriceX96);
        Ok(PoolState {
            sqrt_price_x96,
            tick: slot0.tick.as_i32(),
            liquidity,
            initialized: sqrt_price_x96 > U256::ZERO,
        })
    }

    /// Initializes a v4 pool. Exposed here (read side owns pool identity)
    /// even though it is a write, because it is the one write call the
    /// discovery/orchestrator boundary needs before any ladder mint.
    pub fn encode_initialize_v4(pool_manager: Address, key: &PoolKey, sqrt_price_x96: U256) -> (Address, Vec<u8>) {
        let call = IPoolManager::initializeCall {
            key: IPoolManager::PoolKey {
                currency0: key.currency0,
                currency1: key.currency1,
                fee: key.fee,
                tickSpacing: key.tick_spacing.into(),
                hooks: key.hooks,
            },
            sqrtPriceX96: sqrt_price_x96.to::<alloy::primitives::Uint<160, 3>>(),
        };
        (pool_manager, call.abi_encode())
    }

    /// Reads symbol/name/decimals. Symbol and name fall back to a truncated
    /// address / `"Unknown"` on revert; `decimals` is a hard error
    /// (`DecimalsUnavailable`) since a wrong guess corrupts every downstream
    /// amount (spec.md §4.E).
    pub async fn read_token_info(&self, token: Address) -> Result<TokenInfo, CoreError> {
        use crate::pool::contracts::IERC20Ext;

        let decimals = if let Some(d) = self.decimals.get(token) {
            d
        } else {
            let call = IERC20Ext::decimalsCall {};
            let raw = self
                .eth_call(token, call.abi_encode())
                .await
                .map_err(|_| InputError::DecimalsUnavailable(token))?;
            let d = IERC20Ext::decimalsCall::abi_decode_returns(&raw)
                .map_err(|_| InputError::DecimalsUnavailable(token))?
                ._0;
            self.decimals.insert(token, d);
            d
        };

        let symbol = self.read_string_tolerant(token, IERC20Ext::symbolCall {}.abi_encode()).await
            .unwrap_or_else(|| truncate_address(token));
        let name = self.read_string_tolerant(token, IERC20Ext::nameCall {}.abi_encode()).await
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(TokenInfo { address: token, symbol, name, decimals })
    }

    async fn read_string_tolerant(&self, token: Address, calldata: Vec<u8>) -> Option<String> {
        match self.eth_call(token, calldata).await {
            Ok(raw) => String::abi_decode(&raw).ok(),
            Err(e) => {
                debug!(%token, error = %e, "token metadata call reverted, using placeholder");
                None
            }
        }
    }
}

fn truncate_address(addr: Address) -> String {
    let s = addr.to_string();
    format!("{}…{}", &s[..6], &s[s.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn v4_pool_id_is_deterministic() {
        let key = PoolKey {
            currency0: address!("0000000000000000000000000000000000000001"),
            currency1: address!("0000000000000000000000000000000000000002"),
            fee: 3000,
            tick_spacing: 60,
            hooks: Address::ZERO,
        };
        let id_a = PoolReader::<alloy::providers::RootProvider>::find_pool_v4(&key);
        let id_b = PoolReader::<alloy::providers::RootProvider>::find_pool_v4(&key);
        assert_eq!(id_a, id_b);
    }

    #[test]
    fn truncate_address_keeps_both_ends() {
        let a = address!("1234000000000000000000000000000000abcd");
        let out = truncate_address(a);
        assert!(out.starts_with("0x1234"));
        assert!(out.ends_with("abcd"));
    }
}
