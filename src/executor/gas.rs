//! Gas estimation with per-operation floors (spec.md §4.K `GasEstimator`).
//!
//! Wraps the node's `eth_estimateGas` with a safety buffer; if the node's
//! estimate reverts (a common failure mode right before a batch itself
//! would revert), falls back to a fixed floor per operation kind rather
//! than bubbling the estimation failure up as a hard error — estimation
//! failing is not proof the real call will fail (spec.md §7 propagation
//! policy, (c)).

use alloy::primitives::U256;
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;

/// Default +30% buffer applied to a successful node estimate.
pub const DEFAULT_BUFFER_BPS: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasOperation {
    Approve,
    MintSingle,
    MulticallMint,
    DecreaseAndCollect,
    SwapV3Single,
    SwapV3Multihop,
    SwapV2,
}

impl GasOperation {
    /// Floors from spec.md §4.K: approve ~100k, mint single ~350k,
    /// multicall mint ~500k*N, decrease+collect ~300k, swap v3 single
    /// ~350k, swap v3 multihop ~500k, swap v2 ~300k
    /// (`original_source/src/dex_swap.py`'s fixed `gas` fields).
    pub fn floor(self, n: u64) -> u64 {
        match self {
            GasOperation::Approve => 100_000,
            GasOperation::MintSingle => 350_000,
            GasOperation::MulticallMint => 500_000u64.saturating_mul(n.max(1)),
            GasOperation::DecreaseAndCollect => 300_000,
            GasOperation::SwapV3Single => 350_000,
            GasOperation::SwapV3Multihop => 500_000,
            GasOperation::SwapV2 => 300_000,
        }
    }
}

pub struct GasEstimator<P> {
    provider: P,
    buffer_bps: u32,
}

impl<P: Provider + Clone> GasEstimator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, buffer_bps: DEFAULT_BUFFER_BPS }
    }

    pub fn with_buffer_bps(mut self, bps: u32) -> Self {
        self.buffer_bps = bps;
        self
    }

    /// Estimates gas for `tx`, applying the buffer on success and falling
    /// back to `op`'s floor (scaled by `n` for per-call-count operations
    /// like `MulticallMint`) if the node's estimate reverts.
    pub async fn estimate(&self, tx: TransactionRequest, op: GasOperation, n: u64) -> u64 {
        match self.provider.estimate_gas(tx).await {
            Ok(estimate) => apply_buffer(estimate, self.buffer_bps),
            Err(e) => {
                tracing::warn!(error = %e, operation = ?op, "gas estimation reverted, using floor");
                op.floor(n)
            }
        }
    }

    /// Builds EIP-1559 `{maxPriorityFeePerGas, maxFeePerGas}` if the chain
    /// reports `baseFeePerGas` on the latest block, else a legacy
    /// `gasPrice` (spec.md §4.G step 2).
    pub async fn fee_params(&self) -> FeeParams {
        match self.provider.get_block_by_number(alloy::eips::BlockNumberOrTag::Latest).await {
            Ok(Some(block)) if block.header.base_fee_per_gas.is_some() => {
                let base_fee = block.header.base_fee_per_gas.unwrap_or(0) as u128;
                let tip = self
                    .provider
                    .get_max_priority_fee_per_gas()
                    .await
                    .unwrap_or(1_500_000_000); // 1.5 gwei default tip
                FeeParams::Eip1559 {
                    max_fee_per_gas: U256::from(base_fee * 2 + tip),
                    max_priority_fee_per_gas: U256::from(tip),
                }
            }
            _ => {
                let gas_price = self.provider.get_gas_price().await.unwrap_or(20_000_000_000);
                FeeParams::Legacy { gas_price: U256::from(gas_price) }
            }
        }
    }
}

fn apply_buffer(estimate: u64, bps: u32) -> u64 {
    estimate.saturating_mul(10_000 + bps as u64) / 10_000
}

#[derive(Debug, Clone, Copy)]
pub enum FeeParams {
    Eip1559 { max_fee_per_gas: U256, max_priority_fee_per_gas: U256 },
    Legacy { gas_price: U256 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_scale_with_call_count() {
        assert_eq!(GasOperation::MulticallMint.floor(1), 500_000);
        assert_eq!(GasOperation::MulticallMint.floor(7), 3_500_000);
    }

    #[test]
    fn buffer_applies_default_30_percent() {
        assert_eq!(apply_buffer(100_000, DEFAULT_BUFFER_BPS), 130_000);
    }

    #[test]
    fn single_op_floors_match_spec_table() {
        assert_eq!(GasOperation::Approve.floor(1), 100_000);
        assert_eq!(GasOperation::MintSingle.floor(1), 350_000);
        assert_eq!(GasOperation::DecreaseAndCollect.floor(1), 300_000);
        assert_eq!(GasOperation::SwapV3Single.floor(1), 350_000);
        assert_eq!(GasOperation::SwapV3Multihop.floor(1), 500_000);
    }
}
