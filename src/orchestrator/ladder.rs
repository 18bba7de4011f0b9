//! `create_ladder`/`close_positions` pipeline (spec.md §4.H).
//!
//! Grounded on `original_source/src/liquidity_provider.py`'s
//! `LiquidityProvider` pipeline, split into a pure planner
//! (`planner::distribution`/`planner::orientation`), a read-only pool
//! reader (`pool::discovery`), and a write-path executor
//! (`executor::batch`) — each independently testable.

use crate::chain_registry::ChainEntry;
use crate::encode::v3 as encode_v3;
use crate::encode::v4 as encode_v4;
use crate::error::{BalanceError, CoreError, ExecutionError, InputError, PoolError};
use crate::executor::{BatchExecutor, GasOperation};
use crate::math::liquidity::usd_to_wei;
use crate::math::tick::check_alignment;
use crate::planner::distribution::{calculate_bid_ask_from_percent, plan_one_sided, LadderPlan};
use crate::planner::orientation::{resolve_orientation, Role};
use crate::pool::contracts::{IERC20Ext, IUniswapV3FactoryExt, IUniswapV3PoolExt};
use crate::pool::discovery::PoolReader;
use crate::types::{LadderConfig, OpenPosition, PoolKey, StableSide};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use tracing::{info, warn};

/// Result of a successful `create_ladder` call: the one on-chain
/// transaction that minted every sub-position, and the positions recorded
/// from its receipt.
#[derive(Debug, Clone)]
pub struct CreatedLadder {
    pub tx_hash: B256,
    pub positions: Vec<OpenPosition>,
}

/// Result of a `close_positions`/`close_all_v4_in_one_tx` call.
#[derive(Debug, Clone)]
pub struct ClosedPositions {
    pub tx_hash: B256,
    pub closed_token_ids: Vec<U256>,
}

pub struct LadderOrchestrator<P> {
    provider: P,
    pool_reader: PoolReader<P>,
    executor: BatchExecutor<P>,
    chain: ChainEntry,
}

impl<P: Provider + Clone> LadderOrchestrator<P> {
    pub fn new(provider: P, executor: BatchExecutor<P>, chain: ChainEntry) -> Self {
        Self {
            pool_reader: PoolReader::new(provider.clone()),
            provider,
            executor,
            chain,
        }
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, CoreError> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        let out = self.provider.call(tx).await.map_err(|e| ExecutionError::Rpc(e.to_string()))?;
        Ok(out.to_vec())
    }

    async fn read_balance(&self, token: Address, owner: Address) -> Result<U256, CoreError> {
        let call = IERC20Ext::balanceOfCall { account: owner };
        let raw = self.eth_call(token, call.abi_encode()).await?;
        IERC20Ext::balanceOfCall::abi_decode_returns(&raw)
            .map(|r| r._0)
            .map_err(|e| ExecutionError::Rpc(format!("balanceOf decode: {e}")).into())
    }

    async fn read_allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, CoreError> {
        let call = IERC20Ext::allowanceCall { owner, spender };
        let raw = self.eth_call(token, call.abi_encode()).await?;
        IERC20Ext::allowanceCall::abi_decode_returns(&raw)
            .map(|r| r._0)
            .map_err(|e| ExecutionError::Rpc(format!("allowance decode: {e}")).into())
    }

    /// Reads the actual `tickSpacing` off a v3-family pool contract rather
    /// than inferring it from `fee` (spec.md §4.H step 5).
    async fn actual_tick_spacing_v3(&self, pool: Address) -> Result<i32, CoreError> {
        let call = IUniswapV3PoolExt::tickSpacingCall {};
        let raw = self.eth_call(pool, call.abi_encode()).await?;
        let r = IUniswapV3PoolExt::tickSpacingCall::abi_decode_returns(&raw)
            .map_err(|e| ExecutionError::Rpc(format!("tickSpacing decode: {e}")))?;
        Ok(r._0.as_i32())
    }

    /// Reads the actual `fee` off a v3-family pool contract (spec.md
    /// scenario S5: a stale `config.fee_tier` is reconciled against what
    /// the live pool actually charges).
    async fn actual_fee_v3(&self, pool: Address) -> Result<u32, CoreError> {
        let call = IUniswapV3PoolExt::feeCall {};
        let raw = self.eth_call(pool, call.abi_encode()).await?;
        let r = IUniswapV3PoolExt::feeCall::abi_decode_returns(&raw)
            .map_err(|e| ExecutionError::Rpc(format!("fee decode: {e}")))?;
        Ok(r._0.to::<u32>())
    }

    fn plan(&self, config: &LadderConfig, invert_price: bool, decimal_offset: i32) -> Result<LadderPlan, CoreError> {
        let stable_is_token1 = matches!(config.stable_token, StableSide::Token1);
        match (config.percent_from, config.percent_to) {
            (Some(from), Some(to)) => calculate_bid_ask_from_percent(
                config.current_price,
                from,
                to,
                config.total_usd,
                config.n_positions,
                config.fee_tier,
                config.distribution_type,
                stable_is_token1,
                invert_price,
                config.tick_spacing_override,
                decimal_offset,
                config.allow_custom_fee,
            ),
            _ => {
                let limit = config
                    .lower_price
                    .ok_or_else(|| InputError::InvalidRange("lower_price or percent_from/percent_to required".into()))?;
                plan_one_sided(
                    config.current_price,
                    limit,
                    config.total_usd,
                    config.n_positions,
                    config.fee_tier,
                    config.distribution_type,
                    stable_is_token1,
                    invert_price,
                    config.tick_spacing_override,
                    decimal_offset,
                    config.allow_custom_fee,
                )
            }
        }
    }

    /// Full pipeline: plan -> check balances -> find/create pool -> align
    /// PM -> re-validate ticks -> approve -> encode -> simulate -> execute.
    pub async fn create_ladder(&self, eoa: Address, config: &LadderConfig) -> Result<CreatedLadder, CoreError> {
        let token0_decimals = match config.token0_decimals {
            Some(d) => d,
            None => self.pool_reader.read_token_info(config.token0_address).await?.decimals,
        };
        let token1_decimals = match config.token1_decimals {
            Some(d) => d,
            None => self.pool_reader.read_token_info(config.token1_address).await?.decimals,
        };

        let token0_role = if matches!(config.stable_token, StableSide::Token0) { Role::Stable } else { Role::Volatile };
        let orientation = resolve_orientation(
            config.token0_address,
            token0_decimals,
            config.token1_address,
            token1_decimals,
            token0_role,
        )?;

        // Step 1: preview := plan(config) — pure given resolved decimals.
        let mut preview = self.plan(config, orientation.invert_price, orientation.decimal_offset)?;
        let mut total_usd_needed: f64 = preview.sub_positions.iter().map(|p| p.usd_amount).sum();

        let stable_decimals = if matches!(config.stable_token, StableSide::Token0) { token0_decimals } else { token1_decimals };
        let stable_token = if orientation.stable_is_currency1 { orientation.currency1 } else { orientation.currency0 };

        // Step 2: check_balances.
        let need_wei = usd_to_wei(total_usd_needed, stable_decimals);
        let balance = self.read_balance(stable_token, eoa).await?;
        if balance < need_wei {
            return Err(BalanceError::InsufficientBalance {
                token: stable_token,
                need: need_wei.to_string(),
                have: balance.to_string(),
            }
            .into());
        }

        // Step 3: find_pool; auto-create if allowed and absent.
        let hooks = config.hooks.unwrap_or(Address::ZERO);
        let mut pool_key = PoolKey::new(config.token0_address, config.token1_address, config.fee_tier, preview.tick_spacing, hooks);
        let protocol = self
            .chain
            .protocol(config.protocol_variant)
            .ok_or(PoolError::PoolNotDeployed)?
            .clone();

        let deadline = crate::executor::tx_deadline(600);
        let actual_spacing;
        let mut setup_calls: Vec<(Address, Bytes)> = Vec::new();
        let mut v4_sqrt_price_x96: Option<U256> = None;

        if config.protocol_variant.is_v4() {
            let pool_id = PoolReader::<P>::find_pool_v4(&pool_key);
            let state = self.pool_reader.read_pool_state_v4(protocol.state_view, pool_id).await;
            match state {
                Ok(s) if s.initialized => v4_sqrt_price_x96 = Some(s.sqrt_price_x96),
                _ if config.auto_create_pool => {
                    let sqrt_price = crate::math::tick::sqrt_price_x96_from_price(config.current_price)?;
                    let (target, data) = PoolReader::<P>::encode_initialize_v4(protocol.position_manager, &pool_key, sqrt_price);
                    setup_calls.push((target, data.into()));
                    v4_sqrt_price_x96 = Some(sqrt_price);
                    info!(%pool_id, "auto-creating v4 pool");
                }
                _ => return Err(PoolError::PoolNotDeployed.into()),
            }
            actual_spacing = pool_key.tick_spacing;
        } else {
            let pool_address = self.pool_reader.find_pool_v3(protocol.factory, &pool_key).await?;
            let pool_address = match pool_address {
                Some(addr) => addr,
                None if config.auto_create_pool => {
                    let create = IUniswapV3FactoryExt::createPoolCall {
                        tokenA: pool_key.currency0,
                        tokenB: pool_key.currency1,
                        fee: pool_key.fee,
                    };
                    let raw = self.eth_call(protocol.factory, create.abi_encode()).await?;
                    let created = IUniswapV3FactoryExt::createPoolCall::abi_decode_returns(&raw)
                        .map_err(|e| ExecutionError::Rpc(format!("createPool decode: {e}")))?
                        .pool;
                    let sqrt_price = crate::math::tick::sqrt_price_x96_from_price(config.current_price)?;
                    let init_call = IUniswapV3PoolExt::initializeCall { sqrtPriceX96: sqrt_price.to::<alloy::primitives::Uint<160, 3>>() };
                    setup_calls.push((created, init_call.abi_encode().into()));
                    info!(pool = %created, "auto-creating v3 pool");
                    created
                }
                None => return Err(PoolError::PoolNotDeployed.into()),
            };

            // Step 4/5: re-validate against the pool's actual tickSpacing,
            // not the one inferred from `fee`.
            actual_spacing = match self.actual_tick_spacing_v3(pool_address).await {
                Ok(s) => s,
                Err(_) if config.auto_create_pool => preview.tick_spacing,
                Err(e) => return Err(e),
            };

            // Scenario S5: the pool may report a different fee tier than
            // `config.fee_tier` claims (stale config, or the config guessed
            // wrong). Reconcile by adopting the pool's real fee/spacing and
            // re-planning against it rather than failing outright — logged
            // as a warning, not an error (spec.md §8 S5).
            if !config.auto_create_pool {
                if let Ok(actual_fee) = self.actual_fee_v3(pool_address).await {
                    if actual_fee != config.fee_tier {
                        warn!(config_fee = config.fee_tier, pool_fee = actual_fee, "fee tier mismatch against live pool, re-planning");
                        let mut reconciled = config.clone();
                        reconciled.fee_tier = actual_fee;
                        reconciled.tick_spacing_override = None;
                        preview = self.plan(&reconciled, orientation.invert_price, orientation.decimal_offset)?;
                        total_usd_needed = preview.sub_positions.iter().map(|p| p.usd_amount).sum();
                        pool_key.fee = actual_fee;
                        pool_key.tick_spacing = actual_spacing;
                    }
                }
            }
            if actual_spacing != preview.tick_spacing {
                warn!(planned = preview.tick_spacing, actual = actual_spacing, "tick spacing mismatch against live pool");
            }
        }

        for p in &preview.sub_positions {
            check_alignment(p.tick_lower, p.tick_upper, actual_spacing)?;
        }

        // Step 6: approve if current allowance is insufficient.
        let allowance = self.read_allowance(stable_token, eoa, protocol.position_manager).await?;
        if allowance < need_wei {
            setup_calls.push((stable_token, encode_v3::encode_approve_max(stable_token, protocol.position_manager).calldata));
        }

        if !setup_calls.is_empty() {
            for (target, calldata) in &setup_calls {
                let sim = self.executor.simulate_one(*target, calldata).await;
                if let crate::executor::CallResult::Reverted(reason) = sim {
                    return Err(ExecutionError::SimulationReverted(reason).into());
                }
            }
        }
        // Setup calls (pool create/initialize, approval) run as their own
        // leading transactions; they cannot be folded into the v3
        // `multicall`/v4 `modifyLiquidities` batch since they target a
        // different contract than the position manager.
        let mut setup_tx_count = 0u64;
        for (target, calldata) in setup_calls {
            setup_tx_count += 1;
            self.executor.execute(eoa, target, calldata, GasOperation::Approve, 1).await?;
        }
        let _ = setup_tx_count;

        // Step 7: encode all mints. The v4 `MINT_POSITION` action takes an
        // exact `liquidity` amount rather than v3's amount0/1-desired pair,
        // so each bucket's `L` is derived from the pool's real sqrt price
        // and that bucket's stable-side wei (never from the planner's
        // display-only `liquidity_estimate`, spec.md §4.B).
        let (wrapped_target, wrapped_calldata) = if config.protocol_variant.is_v4() {
            let s_cur = v4_sqrt_price_x96.ok_or(PoolError::PoolNotInitialized(protocol.position_manager))?;
            let mut buckets = Vec::with_capacity(preview.sub_positions.len());
            for p in &preview.sub_positions {
                let s_lo = crate::math::tick::tick_to_sqrt_price_x96(p.tick_lower);
                let s_hi = crate::math::tick::tick_to_sqrt_price_x96(p.tick_upper);
                let (amount0, amount1) = crate::planner::orientation::stable_side_wei(&orientation, stable_decimals, p.usd_amount);
                let (a0, a1) = if orientation.stable_is_currency1 { (None, Some(amount1)) } else { (Some(amount0), None) };
                let l = crate::math::liquidity::liquidity(s_cur, s_lo, s_hi, a0, a1)?;
                buckets.push((p.tick_lower, p.tick_upper, l));
            }
            let (amount0_max, amount1_max) = stable_side_max(&orientation, stable_decimals, total_usd_needed);
            let planner = encode_v4::plan_ladder_mint(&pool_key, &buckets, amount0_max, amount1_max, eoa, eoa);
            planner.finish(protocol.position_manager, deadline)
        } else {
            let mut calls = Vec::with_capacity(preview.sub_positions.len());
            for p in &preview.sub_positions {
                let (amount0, amount1) = crate::planner::orientation::stable_side_wei(&orientation, stable_decimals, p.usd_amount);
                calls.push(encode_v3::encode_mint(
                    protocol.position_manager,
                    &pool_key,
                    p.tick_lower,
                    p.tick_upper,
                    amount0,
                    amount1,
                    U256::ZERO,
                    U256::ZERO,
                    eoa,
                    deadline,
                ));
            }
            let wrapped = encode_v3::encode_multicall(protocol.position_manager, &calls);
            (wrapped.target, wrapped.calldata.to_vec())
        };

        // Step 8: simulate the batch; on failure, simulate the first call
        // alone for a more specific error.
        let sim = self.executor.simulate(wrapped_target, &wrapped_calldata.clone().into()).await;
        if let crate::executor::CallResult::Reverted(reason) = &sim {
            return Err(ExecutionError::SimulationReverted(reason.clone()).into());
        }

        // Step 9: execute and record outcomes.
        let call_count = preview.sub_positions.len() as u64;
        let (tx_hash, receipt) = self
            .executor
            .execute(eoa, wrapped_target, wrapped_calldata.into(), GasOperation::MulticallMint, call_count)
            .await?;

        let positions = if config.protocol_variant.is_v4() {
            crate::executor::receipts::parse_v4_modify_outcomes(&receipt)
                .into_iter()
                .map(|(_, tick_lower, tick_upper, delta)| OpenPosition {
                    token_id: None,
                    pool_key,
                    tick_lower,
                    tick_upper,
                    liquidity: delta.unsigned_abs().to_string(),
                    owed0: "0".to_string(),
                    owed1: "0".to_string(),
                    last_seen_block: receipt.block_number.unwrap_or_default(),
                    protocol_tag: config.protocol_variant,
                })
                .collect()
        } else {
            crate::executor::receipts::parse_v3_mint_outcomes(&receipt, eoa, preview.sub_positions.len())
                .into_iter()
                .zip(preview.sub_positions.iter())
                .map(|(outcome, p)| OpenPosition {
                    token_id: outcome.token_id.try_into().ok(),
                    pool_key,
                    tick_lower: p.tick_lower,
                    tick_upper: p.tick_upper,
                    liquidity: outcome.liquidity.to_string(),
                    owed0: "0".to_string(),
                    owed1: "0".to_string(),
                    last_seen_block: receipt.block_number.unwrap_or_default(),
                    protocol_tag: config.protocol_variant,
                })
                .collect()
        };

        Ok(CreatedLadder { tx_hash, positions })
    }

    /// Closes a set of v3-family positions in one `multicall`:
    /// `decreaseLiquidity(full L)` + `collect(max)` per position. NFT
    /// shells are not burned (spec.md §9 open question 3).
    pub async fn close_positions_v3(
        &self,
        eoa: Address,
        position_manager: Address,
        positions: &[(U256, u128)], // (tokenId, liquidity)
    ) -> Result<ClosedPositions, CoreError> {
        let deadline = crate::executor::tx_deadline(600);
        let mut calls = Vec::with_capacity(positions.len() * 2);
        for (token_id, liquidity) in positions {
            calls.push(encode_v3::encode_decrease_liquidity(position_manager, *token_id, *liquidity, U256::ZERO, U256::ZERO, deadline));
            calls.push(encode_v3::encode_collect_all(position_manager, *token_id, eoa));
        }
        let wrapped = encode_v3::encode_multicall(position_manager, &calls);

        let sim = self.executor.simulate(wrapped.target, &wrapped.calldata).await;
        if let crate::executor::CallResult::Reverted(reason) = sim {
            return Err(ExecutionError::SimulationReverted(reason).into());
        }

        let (tx_hash, _receipt) = self
            .executor
            .execute(eoa, wrapped.target, wrapped.calldata, GasOperation::DecreaseAndCollect, positions.len() as u64)
            .await?;

        Ok(ClosedPositions { tx_hash, closed_token_ids: positions.iter().map(|(id, _)| *id).collect() })
    }

    /// Closes every v4 position given in one `modifyLiquidities` call:
    /// `DECREASE_LIQUIDITY x N, TAKE_PAIR x N, CLOSE_CURRENCY` per distinct
    /// currency (spec.md scenario S7).
    pub async fn close_all_v4_in_one_tx(
        &self,
        eoa: Address,
        position_manager: Address,
        positions: &[(U256, U256, PoolKey)], // (tokenId, liquidity, poolKey)
    ) -> Result<ClosedPositions, CoreError> {
        let deadline = crate::executor::tx_deadline(600);
        let planner = encode_v4::plan_close_all(positions, eoa);
        let (target, calldata) = planner.finish(position_manager, deadline);

        let sim = self.executor.simulate(target, &calldata.clone().into()).await;
        if let crate::executor::CallResult::Reverted(reason) = sim {
            return Err(ExecutionError::SimulationReverted(reason).into());
        }

        let (tx_hash, _receipt) = self
            .executor
            .execute(eoa, target, calldata.into(), GasOperation::MulticallMint, positions.len() as u64)
            .await?;

        Ok(ClosedPositions { tx_hash, closed_token_ids: positions.iter().map(|(id, _, _)| *id).collect() })
    }
}

/// `(amount0Max, amount1Max)` for the v4 mint batch: the full stablecoin
/// budget on the stable side, zero on the volatile side, matching the
/// same all-or-nothing stablecoin assignment the v3 mint path uses
/// (spec.md §4.D step 5).
fn stable_side_max(orientation: &crate::planner::orientation::Orientation, stable_decimals: u8, total_usd: f64) -> (u128, u128) {
    let wei = usd_to_wei(total_usd, stable_decimals);
    let capped = wei.min(U256::from(u128::MAX)).to::<u128>();
    if orientation.stable_is_currency1 {
        (0, capped)
    } else {
        (capped, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn stable_side_max_assigns_to_currency1() {
        let orientation = crate::planner::orientation::Orientation {
            currency0: address!("0000000000000000000000000000000000000001"),
            currency1: address!("0000000000000000000000000000000000000002"),
            stable_is_currency1: true,
            invert_price: false,
            decimal_offset: 0,
        };
        let (a0, a1) = stable_side_max(&orientation, 6, 100.0);
        assert_eq!(a0, 0);
        assert_eq!(a1, 100_000_000);
    }
}
