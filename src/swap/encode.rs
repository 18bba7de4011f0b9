//! Swap calldata encoding (spec.md §4.I steps 4-5).
//!
//! Mirrors `encode::v3`'s approach of encoding straight from the
//! `sol!`-generated call types so calldata is byte-identical to the
//! router's own ABI encoding by construction.

use crate::encode::EncodedCall;
use crate::pool::contracts::{IUniswapV2RouterExt, ISwapRouterV3Ext};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

/// Packs a multi-hop v3 path as `token0 || fee1 || mid || fee2 || token2`,
/// 3-byte big-endian fee per hop, no length prefix (spec.md §4.I step 5).
pub fn pack_path(token_in: Address, fee1: u32, mid: Address, fee2: u32, token_out: Address) -> Bytes {
    let mut buf = Vec::with_capacity(20 + 3 + 20 + 3 + 20);
    buf.extend_from_slice(token_in.as_slice());
    buf.extend_from_slice(&fee1.to_be_bytes()[1..]);
    buf.extend_from_slice(mid.as_slice());
    buf.extend_from_slice(&fee2.to_be_bytes()[1..]);
    buf.extend_from_slice(token_out.as_slice());
    buf.into()
}

#[allow(clippy::too_many_arguments)]
pub fn encode_exact_input_single(
    router: Address,
    token_in: Address,
    token_out: Address,
    fee: u32,
    recipient: Address,
    amount_in: U256,
    amount_out_minimum: U256,
    sqrt_price_limit_x96: U256,
) -> EncodedCall {
    let call = ISwapRouterV3Ext::exactInputSingleCall {
        params: ISwapRouterV3Ext::ExactInputSingleParams {
            tokenIn: token_in,
            tokenOut: token_out,
            fee,
            recipient,
            amountIn: amount_in,
            amountOutMinimum: amount_out_minimum,
            sqrtPriceLimitX96: sqrt_price_limit_x96.to::<alloy::primitives::Uint<160, 3>>(),
        },
    };
    EncodedCall::new(router, call.abi_encode())
}

pub fn encode_exact_input(
    router: Address,
    path: Bytes,
    recipient: Address,
    amount_in: U256,
    amount_out_minimum: U256,
) -> EncodedCall {
    let call = ISwapRouterV3Ext::exactInputCall {
        params: ISwapRouterV3Ext::ExactInputParams {
            path,
            recipient,
            amountIn: amount_in,
            amountOutMinimum: amount_out_minimum,
        },
    };
    EncodedCall::new(router, call.abi_encode())
}

/// Wraps a single swap call in the v3 router's own `multicall(deadline,
/// bytes[])` purely to attach a deadline, mirroring
/// `original_source/src/dex_swap.py`'s `swap_v3` (it always goes through
/// `multicall` even for a single call).
pub fn encode_v3_multicall(router: Address, deadline: U256, calls: &[EncodedCall]) -> EncodedCall {
    let data: Vec<Bytes> = calls.iter().map(|c| c.calldata.clone()).collect();
    let call = ISwapRouterV3Ext::multicallCall { deadline, data };
    EncodedCall::new(router, call.abi_encode())
}

pub fn encode_swap_exact_tokens_for_tokens_supporting_fee(
    router: Address,
    amount_in: U256,
    amount_out_min: U256,
    path: Vec<Address>,
    to: Address,
    deadline: U256,
) -> EncodedCall {
    let call = IUniswapV2RouterExt::swapExactTokensForTokensSupportingFeeOnTransferTokensCall {
        amountIn: amount_in,
        amountOutMin: amount_out_min,
        path,
        to,
        deadline,
    };
    EncodedCall::new(router, call.abi_encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn pack_path_layout() {
        let a = address!("0000000000000000000000000000000000000001");
        let weth = address!("0000000000000000000000000000000000000002");
        let b = address!("0000000000000000000000000000000000000003");
        let path = pack_path(a, 500, weth, 3000, b);
        assert_eq!(path.len(), 20 + 3 + 20 + 3 + 20);
        assert_eq!(&path[0..20], a.as_slice());
        assert_eq!(&path[20..23], &500u32.to_be_bytes()[1..]);
        assert_eq!(&path[23..43], weth.as_slice());
        assert_eq!(&path[43..46], &3000u32.to_be_bytes()[1..]);
        assert_eq!(&path[46..66], b.as_slice());
    }

    #[test]
    fn exact_input_single_selector() {
        let call = encode_exact_input_single(
            address!("0000000000000000000000000000000000000004"),
            address!("0000000000000000000000000000000000000001"),
            address!("0000000000000000000000000000000000000003"),
            3000,
            address!("0000000000000000000000000000000000000005"),
            U256::from(1_000u64),
            U256::ZERO,
            U256::ZERO,
        );
        assert_eq!(&call.calldata[..4], ISwapRouterV3Ext::exactInputSingleCall::SELECTOR);
    }
}
