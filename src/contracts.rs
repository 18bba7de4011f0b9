//! Root-level contract ABI bindings shared across the crate.
//!
//! The pool-variant-specific interfaces (v3 factory/pool, v4 PoolManager,
//! the fee-on-transfer-tolerant v2 router, SwapRouter02) live in
//! `pool::contracts` alongside the rest of the pool-reading/encoding
//! surface; this file keeps only the one binding nothing else shadows:
//! `IQuoterV2`, used by the swap planner's price-impact quote path.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(QuoteExactInputSingleParams memory params) external returns (uint256 amountOut, uint160 sqrtPriceX96After, uint32 initializedTicksCrossed, uint256 gasEstimate);
    }
}
