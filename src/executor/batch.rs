//! Batch executor (spec.md §4.G): gathers `(target, calldata)` entries,
//! wraps them in the protocol's own atomic batch primitive, simulates,
//! signs, submits, and parses receipts.
//!
//! Grounded on `original_source/src/multicall/batcher.py`'s
//! `Multicall3Batcher.execute` (nonce acquire -> build fee params -> sign ->
//! send -> wait receipt -> parse events) and generalized from the teacher's
//! two-leg swap executor (`arbitrage/executor.rs`) shape — dry-run flag,
//! structured result type, gas-price ceiling check — into an n-call batch.

use crate::error::{CoreError, ExecutionError};
use crate::executor::gas::{FeeParams, GasEstimator, GasOperation};
use crate::executor::nonce::NonceManager;
use crate::vault::Signer;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy::primitives::{Address, Bytes, Signature, TxKind, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa2];

/// One sub-call's simulated or executed result.
#[derive(Debug, Clone)]
pub enum CallResult {
    Success(Bytes),
    /// `Error(string)` revert, decoded.
    Reverted(String),
    /// A revert whose payload isn't a standard `Error(string)` — the raw
    /// hex payload is returned as-is rather than guessed at.
    OpaqueRevert(Bytes),
}

/// Gathers calls for one atomic batch. The wrapping step (how the calls
/// become a single `to`/`calldata` pair — v3's `multicall(bytes[])` or v4's
/// `modifyLiquidities`) happens in the caller (`encode::v3`/`encode::v4`);
/// this executor is protocol-agnostic once it has one `(target, calldata)`.
pub struct BatchExecutor<P> {
    provider: P,
    gas: GasEstimator<P>,
    nonce_manager: NonceManager,
    signer: Arc<dyn Signer>,
    chain_id: u64,
    receipt_timeout: Duration,
}

impl<P: Provider + Clone> BatchExecutor<P> {
    pub fn new(provider: P, nonce_manager: NonceManager, signer: Arc<dyn Signer>, chain_id: u64) -> Self {
        let gas = GasEstimator::new(provider.clone());
        Self { provider, gas, nonce_manager, signer, chain_id, receipt_timeout: Duration::from_secs(120) }
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Simulates `(target, calldata)` via `eth_call`, returning the decoded
    /// outcome without sending anything.
    pub async fn simulate_one(&self, target: Address, calldata: &Bytes) -> CallResult {
        let tx = TransactionRequest::default().to(target).input(calldata.clone().into());
        match self.provider.call(tx).await {
            Ok(data) => CallResult::Success(data),
            Err(e) => decode_revert(&e.to_string(), e.as_error_resp().and_then(|r| r.data.clone())),
        }
    }

    /// Simulates the full wrapped batch call. Spec.md §4.G: many batch
    /// failures are actually one bad sub-call whose revert reason gets
    /// masked inside the aggregator — callers should additionally call
    /// `simulate_one` on the first underlying sub-call when this fails, for
    /// a more specific error (the orchestrator does this at step 8).
    pub async fn simulate(&self, wrapped_target: Address, wrapped_calldata: &Bytes) -> CallResult {
        self.simulate_one(wrapped_target, wrapped_calldata).await
    }

    /// Builds, signs, submits, and waits for receipt of the wrapped batch
    /// call. `eoa` is the sending address (must match `self.signer.address()`).
    pub async fn execute(
        &self,
        eoa: Address,
        wrapped_target: Address,
        wrapped_calldata: Bytes,
        op: GasOperation,
        call_count: u64,
    ) -> Result<(B256, TransactionReceipt), CoreError> {
        let reserved = self.nonce_manager.reserve(eoa).await;
        let nonce = reserved.nonce();

        let gas_limit = self
            .gas
            .estimate(
                TransactionRequest::default().to(wrapped_target).input(wrapped_calldata.clone().into()).from(eoa),
                op,
                call_count,
            )
            .await;
        let fee_params = self.gas.fee_params().await;

        // Legacy chains (no `baseFeePerGas` on latest block) only accept
        // type-0 envelopes; a type-2 (EIP-1559) envelope would be rejected
        // outright, so the envelope kind must follow `fee_params` rather
        // than always building `TxEip1559` (spec.md §4.G step 2).
        let envelope: TxEnvelope = match fee_params {
            FeeParams::Eip1559 { max_fee_per_gas, max_priority_fee_per_gas } => {
                let tx = TxEip1559 {
                    chain_id: self.chain_id,
                    nonce,
                    gas_limit,
                    max_fee_per_gas: max_fee_per_gas.to::<u128>(),
                    max_priority_fee_per_gas: max_priority_fee_per_gas.to::<u128>(),
                    to: TxKind::Call(wrapped_target),
                    value: U256::ZERO,
                    input: wrapped_calldata,
                    access_list: Default::default(),
                };
                let sig_hash = tx.signature_hash();
                let sig_bytes = match self.signer.sign_transaction(self.chain_id, sig_hash).await {
                    Ok(s) => s,
                    Err(e) => {
                        reserved.release();
                        return Err(ExecutionError::Rpc(format!("signing failed: {e}")).into());
                    }
                };
                let signature =
                    Signature::from_raw(&sig_bytes).map_err(|e| ExecutionError::Rpc(e.to_string()))?;
                TxEnvelope::Eip1559(tx.into_signed(signature))
            }
            FeeParams::Legacy { gas_price } => {
                let tx = TxLegacy {
                    chain_id: Some(self.chain_id),
                    nonce,
                    gas_price: gas_price.to::<u128>(),
                    gas_limit,
                    to: TxKind::Call(wrapped_target),
                    value: U256::ZERO,
                    input: wrapped_calldata,
                };
                let sig_hash = tx.signature_hash();
                let sig_bytes = match self.signer.sign_transaction(self.chain_id, sig_hash).await {
                    Ok(s) => s,
                    Err(e) => {
                        reserved.release();
                        return Err(ExecutionError::Rpc(format!("signing failed: {e}")).into());
                    }
                };
                let signature =
                    Signature::from_raw(&sig_bytes).map_err(|e| ExecutionError::Rpc(e.to_string()))?;
                TxEnvelope::Legacy(tx.into_signed(signature))
            }
        };
        let raw = alloy::eips::eip2718::Encodable2718::encoded_2718(&envelope);

        let pending = match self.provider.send_raw_transaction(&raw).await {
            Ok(p) => p,
            Err(e) => {
                // Submission itself failed (network error) — release the
                // nonce back to the pool (spec.md §4.G step 4).
                reserved.release();
                return Err(ExecutionError::Rpc(e.to_string()).into());
            }
        };
        let tx_hash = *pending.tx_hash();
        // Submitted: the nonce is consumed regardless of eventual revert.
        reserved.consume();
        info!(%tx_hash, nonce, "batch submitted");

        let receipt = tokio::time::timeout(self.receipt_timeout, pending.get_receipt())
            .await
            .map_err(|_| ExecutionError::Timeout { tx_hash, deadline_secs: self.receipt_timeout.as_secs() })?
            .map_err(|e| ExecutionError::Rpc(e.to_string()))?;

        if !receipt.status() {
            warn!(%tx_hash, "transaction mined but reverted");
            return Err(ExecutionError::TransactionReverted { tx_hash, reason: None }.into());
        }

        Ok((tx_hash, receipt))
    }
}

fn decode_revert(message: &str, data: Option<Bytes>) -> CallResult {
    if let Some(data) = data {
        if data.len() >= 4 && data[..4] == ERROR_STRING_SELECTOR {
            if let Ok(reason) = <String as alloy::sol_types::SolValue>::abi_decode(&data[4..]) {
                return CallResult::Reverted(reason);
            }
        }
        return CallResult::OpaqueRevert(data);
    }
    CallResult::Reverted(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_revert_with_no_payload_uses_message() {
        let result = decode_revert("execution reverted", None);
        assert!(matches!(result, CallResult::Reverted(msg) if msg.contains("reverted")));
    }

    #[test]
    fn decode_revert_opaque_payload() {
        let data = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef, 0x01]);
        let result = decode_revert("execution reverted", Some(data.clone()));
        assert!(matches!(result, CallResult::OpaqueRevert(d) if d == data));
    }
}
