//! Action encoder (spec.md §4.F): per-protocol encoding of mint/decrease/
//! collect/burn (v3-family) and unlock-actions (v4-family) into
//! `(target, calldata)` pairs. Stateless — every function here is a pure
//! transform from typed parameters to bytes; no network, no signing.

pub mod v3;
pub mod v4;

/// One entry in a batch: where the call goes and what it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    pub target: alloy::primitives::Address,
    pub calldata: alloy::primitives::Bytes,
    pub allow_failure: bool,
}

impl EncodedCall {
    pub fn new(target: alloy::primitives::Address, calldata: Vec<u8>) -> Self {
        Self { target, calldata: calldata.into(), allow_failure: false }
    }

    pub fn allow_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }
}
