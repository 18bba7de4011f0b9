//! v3-family action encoder (spec.md §4.F).
//!
//! Calldata is produced directly from the `sol!`-generated call types in
//! `pool::contracts`, so it is byte-identical to the contract's own ABI
//! encoding by construction — there is no hand-rolled selector/param table
//! to drift out of sync with the interface.

use crate::encode::EncodedCall;
use crate::pool::contracts::{IERC20Ext, INonfungiblePositionManager};
use crate::types::PoolKey;
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;

/// `2^128 - 1`: sweeps the full owed balance on `collect`.
pub const COLLECT_MAX: u128 = u128::MAX;

#[allow(clippy::too_many_arguments)]
pub fn encode_mint(
    position_manager: Address,
    key: &PoolKey,
    tick_lower: i32,
    tick_upper: i32,
    amount0_desired: U256,
    amount1_desired: U256,
    amount0_min: U256,
    amount1_min: U256,
    recipient: Address,
    deadline: U256,
) -> EncodedCall {
    let call = INonfungiblePositionManager::mintCall {
        params: INonfungiblePositionManager::MintParams {
            token0: key.currency0,
            token1: key.currency1,
            fee: key.fee,
            tickLower: tick_lower.try_into().expect("tick within i24 range"),
            tickUpper: tick_upper.try_into().expect("tick within i24 range"),
            amount0Desired: amount0_desired,
            amount1Desired: amount1_desired,
            amount0Min: amount0_min,
            amount1Min: amount1_min,
            recipient,
            deadline,
        },
    };
    EncodedCall::new(position_manager, call.abi_encode())
}

pub fn encode_decrease_liquidity(
    position_manager: Address,
    token_id: U256,
    liquidity: u128,
    amount0_min: U256,
    amount1_min: U256,
    deadline: U256,
) -> EncodedCall {
    let call = INonfungiblePositionManager::decreaseLiquidityCall {
        params: INonfungiblePositionManager::DecreaseLiquidityParams {
            tokenId: token_id,
            liquidity,
            amount0Min: amount0_min,
            amount1Min: amount1_min,
            deadline,
        },
    };
    EncodedCall::new(position_manager, call.abi_encode())
}

/// `amount0Max = amount1Max = 2^128 - 1` sweeps everything owed.
pub fn encode_collect_all(position_manager: Address, token_id: U256, recipient: Address) -> EncodedCall {
    let call = INonfungiblePositionManager::collectCall {
        params: INonfungiblePositionManager::CollectParams {
            tokenId: token_id,
            recipient,
            amount0Max: COLLECT_MAX,
            amount1Max: COLLECT_MAX,
        },
    };
    EncodedCall::new(position_manager, call.abi_encode())
}

/// Optional; not used by the default close path (spec.md §4.F, §9 open
/// question 3 — NFT shells are left unburned by default).
pub fn encode_burn(position_manager: Address, token_id: U256) -> EncodedCall {
    let call = INonfungiblePositionManager::burnCall { tokenId: token_id };
    EncodedCall::new(position_manager, call.abi_encode())
}

/// Idempotent `MAX_UINT256` approval on an ERC-20 spender.
pub fn encode_approve_max(token: Address, spender: Address) -> EncodedCall {
    let call = IERC20Ext::approveCall { spender, amount: U256::MAX };
    EncodedCall::new(token, call.abi_encode())
}

/// Wraps a set of sub-calls in the position manager's own `multicall(bytes[])`
/// so `msg.sender` stays the user's EOA throughout (spec.md §4.G).
pub fn encode_multicall(position_manager: Address, calls: &[EncodedCall]) -> EncodedCall {
    let data: Vec<alloy::primitives::Bytes> = calls.iter().map(|c| c.calldata.clone()).collect();
    let call = INonfungiblePositionManager::multicallCall { data };
    EncodedCall::new(position_manager, call.abi_encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn mint_selector_matches_abi() {
        let key = PoolKey::new(
            address!("0000000000000000000000000000000000000001"),
            address!("0000000000000000000000000000000000000002"),
            3000,
            60,
            Address::ZERO,
        );
        let call = encode_mint(
            address!("0000000000000000000000000000000000000003"),
            &key,
            -60,
            60,
            U256::from(1_000u64),
            U256::ZERO,
            U256::ZERO,
            U256::ZERO,
            address!("0000000000000000000000000000000000000004"),
            U256::from(9_999_999_999u64),
        );
        // `mint((address,address,uint24,int24,int24,uint256,uint256,uint256,uint256,address,uint256))`
        assert_eq!(&call.calldata[..4], INonfungiblePositionManager::mintCall::SELECTOR);
    }

    #[test]
    fn collect_all_uses_max_u128() {
        let call = encode_collect_all(
            address!("0000000000000000000000000000000000000001"),
            U256::from(7u64),
            address!("0000000000000000000000000000000000000002"),
        );
        assert_eq!(&call.calldata[..4], INonfungiblePositionManager::collectCall::SELECTOR);
    }

    #[test]
    fn approve_targets_the_token_not_the_spender() {
        let token = address!("0000000000000000000000000000000000000005");
        let spender = address!("0000000000000000000000000000000000000006");
        let call = encode_approve_max(token, spender);
        assert_eq!(call.target, token);
    }
}
