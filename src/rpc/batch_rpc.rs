//! Batched read-only RPC aggregator (spec.md §4.K `BatchRPC`).
//!
//! Packs N read-only `(target, calldata)` calls into one `Multicall3
//! aggregate3` round-trip, generalized from `arbitrage/multicall_quoter.rs`'s
//! single-purpose `amountOut` aggregator into a caller-supplied decoder per
//! call (spec.md's `(target, calldata, decoder)` triple). A failed individual
//! decode returns `None` for that slot so the caller can fall back, rather
//! than failing the whole batch.

use crate::error::{CoreError, ExecutionError};
use crate::pool::contracts::IMulticall3;
use alloy::primitives::{Address, Bytes};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;

/// One entry in a batched read: where the call goes, what it carries, and
/// how to turn its raw return bytes into `T`. `allow_failure` mirrors
/// Multicall3's per-call flag — when false, that sub-call failing reverts
/// the whole aggregate.
pub struct BatchedCall<T> {
    pub target: Address,
    pub calldata: Bytes,
    pub allow_failure: bool,
    pub decode: Box<dyn Fn(&[u8]) -> Option<T> + Send + Sync>,
}

impl<T> BatchedCall<T> {
    pub fn new(target: Address, calldata: Vec<u8>, decode: impl Fn(&[u8]) -> Option<T> + Send + Sync + 'static) -> Self {
        Self { target, calldata: calldata.into(), allow_failure: true, decode: Box::new(decode) }
    }
}

/// Runs `calls` through one `eth_call` to the chain's Multicall3 deployment
/// and decodes each result in order. A call whose on-chain execution failed,
/// or whose decoder returned `None`, yields `None` at that index.
pub async fn batch_read<P: Provider, T>(
    provider: &P,
    multicall3: Address,
    calls: Vec<BatchedCall<T>>,
) -> Result<Vec<Option<T>>, CoreError> {
    if calls.is_empty() {
        return Ok(Vec::new());
    }

    let aggregate_calls: Vec<IMulticall3::Call3> = calls
        .iter()
        .map(|c| IMulticall3::Call3 { target: c.target, allowFailure: c.allow_failure, callData: c.calldata.clone() })
        .collect();

    let call = IMulticall3::aggregate3Call { calls: aggregate_calls };
    let tx = TransactionRequest::default().to(multicall3).input(call.abi_encode().into());
    let raw = provider.call(tx).await.map_err(|e| ExecutionError::Rpc(e.to_string()))?;
    let results = IMulticall3::aggregate3Call::abi_decode_returns(&raw)
        .map_err(|e| ExecutionError::Rpc(format!("aggregate3 decode: {e}")))?;

    if results.len() != calls.len() {
        return Err(ExecutionError::Rpc(format!(
            "aggregate3 returned {} results, expected {}",
            results.len(),
            calls.len()
        ))
        .into());
    }

    Ok(calls
        .into_iter()
        .zip(results.into_iter())
        .map(|(call, result)| if result.success { (call.decode)(&result.returnData) } else { None })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn batched_call_constructs_with_defaults() {
        let call = BatchedCall::new(
            address!("0000000000000000000000000000000000000001"),
            vec![1, 2, 3, 4],
            |data: &[u8]| Some(data.len()),
        );
        assert!(call.allow_failure);
        assert_eq!((call.decode)(&[0u8; 5]), Some(5));
    }
}
